//! 저장된 전략 통계 조회 명령어.
//!
//! # 사용 예시
//!
//! ```bash
//! # 전체 기간 통계 조회
//! backtest fetch -s ema_cross
//!
//! # 기간 지정, 통계 제외
//! backtest fetch -s ema_cross --start 2024-01-01 --end 2024-06-30 --no-stats
//! ```

use anyhow::Result;
use backtest_client::BacktestApi;
use backtest_core::{BacktestQuery, ResultBundle};
use tracing::info;

/// 조회 CLI 설정
#[derive(Debug, Clone)]
pub struct FetchCliConfig {
    /// 전략 이름 (전송 전 소문자로 변환)
    pub strategy: String,
    /// 시작 시점 (검증 없이 전달)
    pub start: Option<String>,
    /// 종료 시점 (검증 없이 전달)
    pub end: Option<String>,
    pub include_stats: bool,
}

/// 통계 조회 실행
pub async fn run_fetch(api: &dyn BacktestApi, config: &FetchCliConfig) -> Result<ResultBundle> {
    let query = BacktestQuery::new(
        &config.strategy,
        config.start.clone(),
        config.end.clone(),
        config.include_stats,
    )?;

    info!(
        strategy = query.strategy_name(),
        start = ?query.start(),
        end = ?query.end(),
        "Fetching backtest results"
    );

    let bundle = api.fetch_results(&query).await?;
    Ok(bundle)
}
