//! 원격 백테스트 서비스 커넥터.

pub mod jarvis;

pub use jarvis::JarvisClient;
