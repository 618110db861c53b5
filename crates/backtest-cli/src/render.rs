//! 터미널 텍스트 테이블 출력.

use backtest_core::{cell_text, BalancePoint, MetricsTable, ResultBundle, TradeLog};

const EMPTY_MARKER: &str = "(no data)";
const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// 통계 묶음 전체 출력.
pub fn render_bundle(bundle: &ResultBundle) -> String {
    let mut out = String::new();
    out.push_str(&render_metrics("Static Metrics", &bundle.static_metrics));
    out.push_str(&render_metrics(
        "Compounding Metrics",
        &bundle.compounding_metrics,
    ));
    out.push_str(&render_balance_series(&bundle.balance_series));
    out
}

/// (지표, 값) 두 열 테이블.
pub fn render_metrics(title: &str, metrics: &MetricsTable) -> String {
    let rows: Vec<Vec<String>> = metrics
        .iter()
        .map(|(name, value)| vec![name.to_string(), cell_text(value)])
        .collect();
    section(title, &["Metric", "Value"], &rows)
}

/// 잔고 시계열 테이블.
pub fn render_balance_series(points: &[BalancePoint]) -> String {
    let rows: Vec<Vec<String>> = points
        .iter()
        .map(|p| vec![p.timestamp.clone(), p.balance.to_string()])
        .collect();
    section("Balance Over Time", &["timestamp", "balance"], &rows)
}

/// 거래 로그 테이블. 열 순서는 로그 그대로입니다.
pub fn render_trade_log(title: &str, log: &TradeLog) -> String {
    let headers: Vec<&str> = log.columns().iter().map(String::as_str).collect();
    let rows: Vec<Vec<String>> = log
        .rows()
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    section(title, &headers, &rows)
}

fn section(title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = format!("\n{}\n{}\n", title, RULE);
    if rows.is_empty() {
        out.push_str(&format!("  {}\n", EMPTY_MARKER));
    } else {
        out.push_str(&table(headers, rows));
    }
    out
}

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        format!("  {}\n", padded.join(" | ").trim_end())
    };

    let mut out = line(headers.to_vec());
    let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", separator.join("─┼─")));
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}
