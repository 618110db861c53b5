//! reqwest 에러 매핑.

use backtest_core::BacktestError;

/// 전송 계층 에러를 `BacktestError`로 변환.
///
/// 어느 경우든 재시도하지 않고 호출자에게 그대로 보고합니다.
pub(crate) fn transport_error(err: reqwest::Error) -> BacktestError {
    if err.is_timeout() {
        BacktestError::Network(format!("request timed out: {}", err))
    } else if err.is_connect() {
        BacktestError::Network(format!("connection failed: {}", err))
    } else if err.is_decode() || err.is_body() {
        BacktestError::Decode(err.to_string())
    } else {
        BacktestError::Network(err.to_string())
    }
}
