//! 거래 로그의 누적 잔고 계산.
//!
//! 서비스가 보낸 순서(보통 청산 시각 순)를 그대로 신뢰하며 재정렬하지 않습니다.
//! 부동소수점 덧셈을 그대로 사용하고 반올림하지 않습니다.
//!
//! ```text
//! balance[i] = starting_balance + profit[0] + ... + profit[i]
//! ```

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{TradeLog, BALANCE_COLUMN};
use crate::error::{BacktestError, BacktestResult};

/// 기본 시작 자본.
pub const DEFAULT_STARTING_BALANCE: f64 = 1000.0;

/// 손익 열 이름.
pub const PROFIT_COLUMN: &str = "profit";

/// 누적 잔고 열을 추가한 새 거래 로그를 반환합니다.
///
/// 입력 로그는 변경하지 않습니다. 서비스가 보낸 열(`balance` 포함)은 그대로 두고
/// `running_balance` 열만 추가합니다. 이미 `running_balance` 열이 있으면 교체하므로
/// 같은 입력과 시작 자본에 대해 몇 번을 호출해도 결과가 같습니다.
///
/// # Errors
/// `profit` 열이 없거나, 어떤 행의 값이 비어 있거나 수치가 아니면
/// 계산 전체를 중단하고 `BacktestError::InvalidRecord`를 반환합니다.
pub fn derive_running_balance(
    trades: &TradeLog,
    starting_balance: f64,
) -> BacktestResult<TradeLog> {
    let profit_index =
        trades
            .column_index(PROFIT_COLUMN)
            .ok_or_else(|| BacktestError::InvalidRecord {
                row: 0,
                reason: format!("missing '{}' column", PROFIT_COLUMN),
            })?;

    let mut balance = starting_balance;
    let mut balances = Vec::with_capacity(trades.len());

    for (row, cells) in trades.rows().iter().enumerate() {
        let profit = parse_profit(&cells[profit_index]).map_err(|reason| {
            warn!(row, %reason, "Running balance aborted");
            BacktestError::InvalidRecord { row, reason }
        })?;

        balance += profit;
        balances.push(number(balance, row)?);
    }

    debug!(
        rows = trades.len(),
        starting_balance,
        final_balance = balance,
        "Running balance derived"
    );

    let mut derived = trades.clone();
    derived.set_column(BALANCE_COLUMN, balances);
    Ok(derived)
}

/// 손익 셀을 f64로 해석.
///
/// JSON 숫자와 숫자 문자열(CSV 셀)을 허용합니다.
fn parse_profit(cell: &Value) -> Result<f64, String> {
    let value = match cell {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("profit '{}' is out of range", n))?,
        Value::String(s) if s.trim().is_empty() => return Err("profit is empty".to_string()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("profit '{}' is not numeric", s))?,
        Value::Null => return Err("profit is missing".to_string()),
        other => return Err(format!("profit '{}' is not numeric", other)),
    };

    if !value.is_finite() {
        return Err(format!("profit '{}' is not finite", value));
    }
    Ok(value)
}

fn number(value: f64, row: usize) -> BacktestResult<Value> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| BacktestError::InvalidRecord {
            row,
            reason: format!("running balance overflowed to {}", value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::parse_delimited;
    use proptest::prelude::*;
    use serde_json::json;

    fn log_with_profits(profits: &[Value]) -> TradeLog {
        TradeLog::new(
            vec!["exit_at".to_string(), "profit".to_string()],
            profits
                .iter()
                .enumerate()
                .map(|(i, p)| vec![json!(format!("2024-01-{:02}", i + 1)), p.clone()])
                .collect(),
        )
        .unwrap()
    }

    fn balances(log: &TradeLog) -> Vec<f64> {
        log.column(BALANCE_COLUMN)
            .unwrap()
            .into_iter()
            .map(|v| v.as_f64().unwrap())
            .collect()
    }

    #[test]
    fn test_running_balance() {
        let log = log_with_profits(&[json!(50), json!(-20), json!(30)]);
        let derived = derive_running_balance(&log, DEFAULT_STARTING_BALANCE).unwrap();

        assert_eq!(balances(&derived), vec![1050.0, 1030.0, 1060.0]);
        // 입력 열과 순서 유지
        assert_eq!(derived.columns(), &["exit_at", "profit", "running_balance"]);
        assert_eq!(derived.cell(2, "exit_at"), Some(&json!("2024-01-03")));
    }

    #[test]
    fn test_running_balance_from_csv() {
        let log = parse_delimited("profit,exit_at\n50,2024-01-01\n-20,2024-01-02\n").unwrap();
        let derived = derive_running_balance(&log, 1000.0).unwrap();

        assert_eq!(balances(&derived), vec![1050.0, 1030.0]);
        let points = derived.balance_points("exit_at").unwrap();
        assert_eq!(points[1].timestamp, "2024-01-02");
        assert_eq!(points[1].balance, 1030.0);
    }

    #[test]
    fn test_empty_log() {
        let log = log_with_profits(&[]);
        let derived = derive_running_balance(&log, 1000.0).unwrap();
        assert!(derived.is_empty());
        assert!(derived.column_index(BALANCE_COLUMN).is_some());
    }

    #[test]
    fn test_aborts_on_non_numeric_profit() {
        let log = log_with_profits(&[json!(50), json!("n/a"), json!(30)]);
        let err = derive_running_balance(&log, 1000.0).unwrap_err();

        match err {
            BacktestError::InvalidRecord { row, .. } => assert_eq!(row, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_aborts_on_missing_profit() {
        let log = log_with_profits(&[json!(50), Value::Null]);
        assert!(derive_running_balance(&log, 1000.0).is_err());

        let log = log_with_profits(&[json!(" ")]);
        assert!(derive_running_balance(&log, 1000.0).is_err());

        let log = log_with_profits(&[json!("inf")]);
        assert!(derive_running_balance(&log, 1000.0).is_err());

        let log = TradeLog::new(vec!["exit_at".to_string()], vec![vec![json!("2024-01-01")]])
            .unwrap();
        assert!(derive_running_balance(&log, 1000.0).is_err());
    }

    #[test]
    fn test_service_balance_column_preserved() {
        let log =
            parse_delimited("profit,exit_at,balance\n50,2024-01-01,9999\n-20,2024-01-02,9979\n")
                .unwrap();
        let derived = derive_running_balance(&log, 1000.0).unwrap();

        assert_eq!(
            derived.columns(),
            &["profit", "exit_at", "balance", BALANCE_COLUMN]
        );
        assert_eq!(derived.cell(0, "balance"), Some(&json!("9999")));
        assert_eq!(derived.cell(1, "balance"), Some(&json!("9979")));
        assert_eq!(balances(&derived), vec![1050.0, 1030.0]);

        // 다시 계산해도 파생 열만 교체
        let again = derive_running_balance(&derived, 1000.0).unwrap();
        assert_eq!(again.columns().len(), 4);
        assert_eq!(again.cell(0, "balance"), Some(&json!("9999")));
    }

    #[test]
    fn test_idempotent() {
        let log = log_with_profits(&[json!("12.5"), json!("-2.5")]);
        let once = derive_running_balance(&log, 100.0).unwrap();
        let twice = derive_running_balance(&once, 100.0).unwrap();

        assert_eq!(once, twice);
        assert_eq!(balances(&twice), vec![112.5, 110.0]);
    }

    proptest! {
        #[test]
        fn prop_balance_is_prefix_sum(
            profits in proptest::collection::vec(-1_000i32..1_000, 0..64),
            start in 0i32..100_000,
        ) {
            let cells: Vec<Value> = profits.iter().map(|p| json!(p)).collect();
            let log = log_with_profits(&cells);
            let derived = derive_running_balance(&log, start as f64).unwrap();
            let actual = balances(&derived);

            prop_assert_eq!(actual.len(), profits.len());
            let mut expected = start as f64;
            for (i, profit) in profits.iter().enumerate() {
                expected += *profit as f64;
                prop_assert_eq!(actual[i], expected);
                prop_assert_eq!(derived.cell(i, "profit"), Some(&json!(profit)));
            }
        }
    }
}
