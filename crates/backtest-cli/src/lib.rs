//! 백테스트 CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 저장된 전략 통계 조회
//! - 로그 파일 백테스트 제출 및 누적 잔고 계산
//! - 터미널 테이블 출력

pub mod commands;
pub mod render;
