//! # Backtest Core
//!
//! 백테스트 결과 조회 파이프라인의 핵심 타입과 변환 로직을 제공합니다.
//!
//! - 요청 파라미터 및 결과 도메인 모델
//! - 응답 정규화 (JSON 지표 객체, JSON 레코드 배열, 구분자 텍스트)
//! - 거래 로그 누적 잔고 계산
//! - 다운로드 파일 생성
//! - 설정 관리
//! - 로깅 인프라

pub mod artifact;
pub mod balance;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod normalize;

pub use artifact::{DownloadArtifact, LOGS_FILE_NAME, RESULTS_FILE_NAME};
pub use balance::{derive_running_balance, DEFAULT_STARTING_BALANCE, PROFIT_COLUMN};
pub use config::AppConfig;
pub use domain::*;
pub use error::*;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use normalize::{
    bundle_from_json, normalize_balances, normalize_metrics, normalize_records, parse_delimited,
    Strictness,
};
