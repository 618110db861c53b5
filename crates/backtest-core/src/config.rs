//! 설정 관리.
//!
//! 기본값 → TOML 파일(선택) → `BACKTEST__` 접두사 환경 변수 순으로 덮어씁니다.
//!
//! ```toml
//! [api]
//! base_url = "https://jarvis.untrade.io"
//! timeout_secs = 60
//!
//! [cache]
//! capacity = 64
//! ttl_secs = 600
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::balance::DEFAULT_STARTING_BALANCE;
use crate::error::{BacktestError, BacktestResult};

/// 환경 변수 접두사.
pub const ENV_PREFIX: &str = "BACKTEST";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 원격 서비스 설정
    #[serde(default)]
    pub api: ApiConfig,
    /// 결과 캐시 설정
    #[serde(default)]
    pub cache: CacheConfig,
    /// 잔고 계산 설정
    #[serde(default)]
    pub balance: BalanceConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 원격 서비스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// 서비스 기본 URL
    pub base_url: String,
    /// 통계 조회 엔드포인트 경로
    #[serde(default = "default_results_path")]
    pub results_path: String,
    /// 백테스트 엔진 엔드포인트 경로
    #[serde(default = "default_engine_path")]
    pub engine_path: String,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_results_path() -> String {
    "/api/v1/get_backtest_result".to_string()
}
fn default_engine_path() -> String {
    "/api/v1/backtest_engine".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://jarvis.untrade.io".to_string(),
            results_path: default_results_path(),
            engine_path: default_engine_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// 통계 조회 URL.
    pub fn results_url(&self) -> String {
        join_url(&self.base_url, &self.results_path)
    }

    /// 백테스트 엔진 URL.
    pub fn engine_url(&self) -> String {
        join_url(&self.base_url, &self.engine_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// 결과 캐시 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// 최대 항목 수 (초과 시 가장 오래 쓰이지 않은 항목 제거)
    pub capacity: usize,
    /// 항목 유효 기간 (초). 없으면 만료되지 않음
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            ttl_secs: None,
        }
    }
}

/// 잔고 계산 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BalanceConfig {
    /// 누적 잔고 시작 자본
    pub starting_balance: f64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일 경로가 주어졌는데 파일이 없으면 에러입니다.
    pub fn load(path: Option<&Path>) -> BacktestResult<Self> {
        let mut builder = Self::defaults_builder()?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// TOML 문자열에서 설정을 로드합니다 (환경 변수 미적용).
    pub fn from_toml_str(toml: &str) -> BacktestResult<Self> {
        let config = Self::defaults_builder()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn defaults_builder(
    ) -> BacktestResult<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();
        Ok(config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.results_path", defaults.api.results_path)?
            .set_default("api.engine_path", defaults.api.engine_path)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("cache.capacity", defaults.cache.capacity as u64)?
            .set_default("balance.starting_balance", defaults.balance.starting_balance)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format)?)
    }

    /// 설정 값 검증.
    pub fn validate(&self) -> BacktestResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(BacktestError::Config("api.base_url is empty".to_string()));
        }
        if self.api.timeout_secs == 0 {
            return Err(BacktestError::Config(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.cache.capacity == 0 {
            return Err(BacktestError::Config(
                "cache.capacity must be greater than 0".to_string(),
            ));
        }
        if !self.balance.starting_balance.is_finite() {
            return Err(BacktestError::Config(
                "balance.starting_balance must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config.api.base_url, "https://jarvis.untrade.io");
        assert_eq!(
            config.api.results_url(),
            "https://jarvis.untrade.io/api/v1/get_backtest_result"
        );
        assert_eq!(
            config.api.engine_url(),
            "https://jarvis.untrade.io/api/v1/backtest_engine"
        );
        assert_eq!(config.cache.capacity, 64);
        assert_eq!(config.cache.ttl_secs, None);
        assert_eq!(config.balance.starting_balance, 1000.0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_override() {
        let config = AppConfig::from_toml_str(
            r#"
            [api]
            base_url = "http://localhost:8000/"
            timeout_secs = 5

            [cache]
            capacity = 8
            ttl_secs = 30

            [balance]
            starting_balance = 5000.0
            "#,
        )
        .unwrap();

        assert_eq!(
            config.api.results_url(),
            "http://localhost:8000/api/v1/get_backtest_result"
        );
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.cache.capacity, 8);
        assert_eq!(config.cache.ttl_secs, Some(30));
        assert_eq!(config.balance.starting_balance, 5000.0);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = AppConfig::from_toml_str("[cache]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, BacktestError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/backtest.toml")));
        assert!(result.is_err());
    }
}
