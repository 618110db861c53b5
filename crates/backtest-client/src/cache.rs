//! 통계 조회 결과 캐시.
//!
//! 같은 (전략, 시작, 종료, stats) 조회를 세션 안에서 반복하면 원격 요청을 다시
//! 보내지 않습니다. 조회 클라이언트에 주입하는 구성 요소이므로 테스트에서
//! 내용을 직접 확인하고 비울 수 있습니다.
//!
//! - 성공한 결과만 저장합니다. 실패는 저장하지 않습니다.
//! - 백테스트 제출은 캐시하지 않습니다.
//! - 용량을 넘으면 가장 오래 사용되지 않은 항목을 제거합니다 (LRU).
//! - TTL을 설정하면 그보다 오래된 항목은 조회 시 제거됩니다.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use backtest_core::config::CacheConfig;
use backtest_core::{BacktestError, BacktestQuery, BacktestResult, ResultBundle};
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use tracing::debug;

fn ttl_from_secs(secs: u64) -> BacktestResult<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| BacktestError::Config(format!("cache.ttl_secs is too large: {}", secs)))
}

/// 캐시 적중 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl CacheStats {
    fn new(hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        Self {
            hits,
            misses,
            hit_rate,
        }
    }
}

/// 조회 결과 캐시 인터페이스.
pub trait ResultCache: Send + Sync {
    /// 캐시된 결과 조회.
    fn get(&self, query: &BacktestQuery) -> Option<ResultBundle>;

    /// 결과 저장.
    fn put(&self, query: BacktestQuery, bundle: ResultBundle);

    /// 모든 항목 제거.
    fn clear(&self);

    /// 저장된 항목 수.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 적중 통계.
    fn stats(&self) -> CacheStats;
}

#[derive(Debug)]
struct CacheEntry {
    bundle: ResultBundle,
    inserted_at: DateTime<Utc>,
}

/// 용량 제한 LRU 캐시.
#[derive(Debug)]
pub struct LruResultCache {
    entries: Mutex<LruCache<BacktestQuery, CacheEntry>>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LruResultCache {
    /// 기본 용량.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// 새 캐시 생성.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// 항목 유효 기간 설정.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// 설정에서 생성.
    ///
    /// # Errors
    /// 용량이 0이거나 유효 기간이 `Duration`으로 표현할 수 없을 만큼 크면
    /// `BacktestError::Config`를 반환합니다.
    pub fn from_config(config: &CacheConfig) -> BacktestResult<Self> {
        let capacity = NonZeroUsize::new(config.capacity).ok_or_else(|| {
            BacktestError::Config("cache.capacity must be greater than 0".to_string())
        })?;

        let cache = Self::new(capacity);
        Ok(match config.ttl_secs {
            Some(secs) => cache.with_ttl(ttl_from_secs(secs)?),
            None => cache,
        })
    }

    /// 최대 항목 수.
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// 통계 초기화.
    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<BacktestQuery, CacheEntry>> {
        // 패닉 중에도 캐시 내용은 일관되므로 poison을 무시
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now - entry.inserted_at >= ttl,
            None => false,
        }
    }
}

impl Default for LruResultCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::MIN.saturating_add(Self::DEFAULT_CAPACITY - 1))
    }
}

impl ResultCache for LruResultCache {
    fn get(&self, query: &BacktestQuery) -> Option<ResultBundle> {
        let now = Utc::now();
        let mut entries = self.lock();

        let expired = match entries.get(query) {
            Some(entry) if !self.is_expired(entry, now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.bundle.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!(strategy = query.strategy_name(), "Cache entry expired");
            entries.pop(query);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn put(&self, query: BacktestQuery, bundle: ResultBundle) {
        let entry = CacheEntry {
            bundle,
            inserted_at: Utc::now(),
        };
        if let Some((evicted, _)) = self.lock().push(query.clone(), entry) {
            if evicted != query {
                debug!(strategy = evicted.strategy_name(), "Cache entry evicted");
            }
        }
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats::new(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

/// 아무것도 저장하지 않는 캐시.
#[derive(Debug, Default)]
pub struct NoCache {
    misses: AtomicU64,
}

impl ResultCache for NoCache {
    fn get(&self, _query: &BacktestQuery) -> Option<ResultBundle> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn put(&self, _query: BacktestQuery, _bundle: ResultBundle) {}

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }

    fn stats(&self) -> CacheStats {
        CacheStats::new(0, self.misses.load(Ordering::Relaxed))
    }
}
