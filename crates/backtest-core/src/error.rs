//! 백테스트 결과 파이프라인의 에러 타입.
//!
//! 모든 실패는 호출자에게 그대로 전달됩니다. 재시도하거나 부분 결과로
//! 격하하지 않으며, 한 번의 요청이 실패해도 다음 요청에는 영향이 없습니다.

use thiserror::Error;

/// 에러 분류.
///
/// 화면에 표시할 메시지를 고르거나 테스트에서 실패 유형을 비교할 때 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 네트워크 에러, 2xx 이외의 상태 코드, 읽을 수 없는 응답 본문
    TransportFailure,
    /// JSON 응답에 기대한 키가 없음
    ShapeMismatch,
    /// 인식할 수 없는 Content-Type
    UnsupportedFormat,
    /// 잔고 계산 중 수치가 아닌 profit 값
    InvalidRecord,
    /// 요청을 보내기 전에 걸러진 잘못된 입력 또는 설정
    InvalidInput,
    /// 로컬 파일 입출력
    Io,
}

/// 백테스트 결과 조회/제출 에러.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 2xx 이외의 응답
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// 응답 본문을 해석할 수 없음
    #[error("Malformed response body: {0}")]
    Decode(String),

    /// 응답 구조가 기대와 다름
    #[error("Unexpected response shape: {0}")]
    ShapeMismatch(String),

    /// 지원하지 않는 응답 형식
    #[error("Unsupported response format: {0}")]
    UnsupportedFormat(String),

    /// 잔고 계산에 사용할 수 없는 거래 레코드
    #[error("Invalid trade record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    /// 잘못된 요청 입력
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 파일 입출력 에러
    #[error("I/O error: {0}")]
    Io(String),
}

/// 백테스트 작업을 위한 Result 타입.
pub type BacktestResult<T> = Result<T, BacktestError>;

impl BacktestError {
    /// 에러 분류 반환.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BacktestError::Network(_) | BacktestError::Status { .. } | BacktestError::Decode(_) => {
                ErrorKind::TransportFailure
            }
            BacktestError::ShapeMismatch(_) => ErrorKind::ShapeMismatch,
            BacktestError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            BacktestError::InvalidRecord { .. } => ErrorKind::InvalidRecord,
            BacktestError::InvalidInput(_) | BacktestError::Config(_) => ErrorKind::InvalidInput,
            BacktestError::Io(_) => ErrorKind::Io,
        }
    }

    /// 전송 계층 실패인지 확인.
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::TransportFailure
    }

    /// 응답 상태 코드 반환 (상태 코드 에러인 경우).
    pub fn status(&self) -> Option<u16> {
        match self {
            BacktestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BacktestError {
    fn from(err: serde_json::Error) -> Self {
        BacktestError::Decode(err.to_string())
    }
}

impl From<csv::Error> for BacktestError {
    fn from(err: csv::Error) -> Self {
        BacktestError::ShapeMismatch(format!("delimited body: {}", err))
    }
}

impl From<config::ConfigError> for BacktestError {
    fn from(err: config::ConfigError) -> Self {
        BacktestError::Config(err.to_string())
    }
}
