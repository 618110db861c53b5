//! 요청 파라미터 타입.
//!
//! 두 타입 모두 요청마다 새로 생성되며 생성 후에는 변경되지 않습니다.

use serde::Serialize;

use crate::error::{BacktestError, BacktestResult};

/// 기본 수수료율.
pub const DEFAULT_COMMISSION: f64 = 0.15;

/// 저장된 백테스트 통계 조회 요청.
///
/// 결과 캐시의 키로도 사용되므로 모든 필드가 `Eq + Hash`를 만족합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BacktestQuery {
    strategy_name: String,
    start: Option<String>,
    end: Option<String>,
    include_stats: bool,
}

impl BacktestQuery {
    /// 새 조회 요청 생성.
    ///
    /// 전략 이름은 소문자로만 바꾸고 공백은 그대로 전달합니다. `start`/`end`는
    /// 검증 없이 그대로 전달되며, `None`이면 요청에서 생략됩니다.
    ///
    /// # Errors
    /// 전략 이름이 비어 있거나 공백뿐이면 `BacktestError::InvalidInput`을 반환합니다.
    pub fn new(
        strategy_name: impl AsRef<str>,
        start: Option<String>,
        end: Option<String>,
        include_stats: bool,
    ) -> BacktestResult<Self> {
        let strategy_name = strategy_name.as_ref();
        if strategy_name.trim().is_empty() {
            return Err(BacktestError::InvalidInput(
                "strategy name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            strategy_name: strategy_name.to_lowercase(),
            start,
            end,
            include_stats,
        })
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    pub fn end(&self) -> Option<&str> {
        self.end.as_deref()
    }

    pub fn include_stats(&self) -> bool {
        self.include_stats
    }

    /// 조회 엔드포인트 쿼리 파라미터 목록.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("strategy_name", self.strategy_name.clone())];
        if let Some(start) = &self.start {
            params.push(("start", start.clone()));
        }
        if let Some(end) = &self.end {
            params.push(("end", end.clone()));
        }
        params.push(("stats", self.include_stats.to_string()));
        params
    }
}

/// 로그 파일 백테스트 제출 옵션.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubmissionOptions {
    is_futures: bool,
    chain_mode: bool,
    commission: f64,
    include_stats: bool,
}

impl SubmissionOptions {
    /// 새 제출 옵션 생성.
    ///
    /// # Errors
    /// 수수료율이 `[0.0, 1.0]` 범위를 벗어나면 `BacktestError::InvalidInput`을 반환합니다.
    pub fn new(
        is_futures: bool,
        chain_mode: bool,
        commission: f64,
        include_stats: bool,
    ) -> BacktestResult<Self> {
        if !commission.is_finite() || !(0.0..=1.0).contains(&commission) {
            return Err(BacktestError::InvalidInput(format!(
                "commission must be within [0.0, 1.0], got {}",
                commission
            )));
        }

        Ok(Self {
            is_futures,
            chain_mode,
            commission,
            include_stats,
        })
    }

    pub fn is_futures(&self) -> bool {
        self.is_futures
    }

    pub fn chain_mode(&self) -> bool {
        self.chain_mode
    }

    pub fn commission(&self) -> f64 {
        self.commission
    }

    pub fn include_stats(&self) -> bool {
        self.include_stats
    }

    /// 로그 파일을 첨부해서 보내는지 여부.
    ///
    /// 선물 모드에서만 파일이 전송됩니다.
    pub fn attaches_file(&self) -> bool {
        self.is_futures
    }

    /// 엔진 엔드포인트 쿼리 파라미터 (모두 문자열).
    pub fn query_params(&self) -> [(&'static str, String); 4] {
        [
            ("futures", self.is_futures.to_string()),
            ("chain", self.chain_mode.to_string()),
            ("commission", self.commission.to_string()),
            ("stats", self.include_stats.to_string()),
        ]
    }
}

impl Default for SubmissionOptions {
    fn default() -> Self {
        Self {
            is_futures: true,
            chain_mode: false,
            commission: DEFAULT_COMMISSION,
            include_stats: true,
        }
    }
}
