//! 도메인 모델.
//!
//! - 요청 파라미터 (`BacktestQuery`, `SubmissionOptions`)
//! - 통계 결과 묶음 (`ResultBundle`)
//! - 거래별 레코드 로그 (`TradeLog`)
//! - 응답 형태 (`BacktestResponse`)

pub mod bundle;
pub mod query;
pub mod trade_log;

pub use bundle::{BalancePoint, MetricsTable, ResultBundle};
pub use query::{BacktestQuery, SubmissionOptions, DEFAULT_COMMISSION};
pub use trade_log::{cell_text, TradeLog, BALANCE_COLUMN};

use serde::Serialize;

/// 제출 응답의 형태.
///
/// 응답 경계에서 Content-Type으로 한 번만 결정되며 두 형태가 섞이지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum BacktestResponse {
    /// JSON 통계 묶음
    Bundle(ResultBundle),
    /// 구분자 텍스트 거래 로그
    TradeLog(TradeLog),
}

impl BacktestResponse {
    /// 응답 형태 이름.
    pub fn kind_name(&self) -> &'static str {
        match self {
            BacktestResponse::Bundle(_) => "bundle",
            BacktestResponse::TradeLog(_) => "trade_log",
        }
    }

    pub fn as_bundle(&self) -> Option<&ResultBundle> {
        match self {
            BacktestResponse::Bundle(bundle) => Some(bundle),
            BacktestResponse::TradeLog(_) => None,
        }
    }

    pub fn as_trade_log(&self) -> Option<&TradeLog> {
        match self {
            BacktestResponse::TradeLog(log) => Some(log),
            BacktestResponse::Bundle(_) => None,
        }
    }

    pub fn into_trade_log(self) -> Option<TradeLog> {
        match self {
            BacktestResponse::TradeLog(log) => Some(log),
            BacktestResponse::Bundle(_) => None,
        }
    }
}
