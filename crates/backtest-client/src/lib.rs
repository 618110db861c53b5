//! 원격 백테스트 서비스 클라이언트.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - BacktestApi trait: 통계 조회 / 백테스트 제출 인터페이스
//! - Jarvis 커넥터 (reqwest)
//! - 조회 결과 LRU 캐시
//! - Content-Type 기반 응답 분류

pub mod cache;
pub mod classify;
pub mod connector;
mod error;
pub mod traits;

pub use cache::{CacheStats, LruResultCache, NoCache, ResultCache};
pub use classify::classify_response;
pub use connector::JarvisClient;
pub use traits::BacktestApi;
