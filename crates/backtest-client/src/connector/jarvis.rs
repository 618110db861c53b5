//! Jarvis 백테스트 서비스 커넥터.
//!
//! - 통계 조회: `GET {base_url}/api/v1/get_backtest_result`
//! - 백테스트 실행: `POST {base_url}/api/v1/backtest_engine`

use std::sync::Arc;

use async_trait::async_trait;
use backtest_core::config::{ApiConfig, AppConfig};
use backtest_core::{
    bundle_from_json, request_span, BacktestError, BacktestQuery, BacktestResponse,
    BacktestResult, ResultBundle, Strictness, SubmissionOptions, LOGS_FILE_NAME,
};
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, info, warn, Instrument};

use crate::cache::{LruResultCache, ResultCache};
use crate::classify::classify_response;
use crate::error::transport_error;
use crate::traits::BacktestApi;

const JSON_ACCEPT: &str = "application/json";
const CSV_ACCEPT: &str = "text/csv";
const FILE_FIELD: &str = "file";

/// Jarvis 백테스트 서비스 클라이언트.
pub struct JarvisClient {
    config: ApiConfig,
    client: Client,
    cache: Arc<dyn ResultCache>,
}

impl JarvisClient {
    /// 새 클라이언트 생성. 기본 용량의 LRU 캐시를 사용합니다.
    pub fn new(config: ApiConfig) -> BacktestResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BacktestError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            config,
            client,
            cache: Arc::new(LruResultCache::default()),
        })
    }

    /// 결과 캐시 교체.
    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    /// 애플리케이션 설정에서 생성.
    pub fn from_app_config(config: &AppConfig) -> BacktestResult<Self> {
        let cache = LruResultCache::from_config(&config.cache)?;
        Ok(Self::new(config.api.clone())?.with_cache(Arc::new(cache)))
    }

    /// 결과 캐시 참조.
    pub fn cache(&self) -> &Arc<dyn ResultCache> {
        &self.cache
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn request_results(&self, query: &BacktestQuery) -> BacktestResult<ResultBundle> {
        if let Some(bundle) = self.cache.get(query) {
            info!("Serving results from cache");
            return Ok(bundle);
        }
        info!("Cache miss, requesting results");

        let url = self.config.results_url();
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&query.query_params())
            .header(ACCEPT, JSON_ACCEPT)
            .send()
            .await
            .map_err(transport_error)?;

        let body = Self::success_body(response).await?;
        let value: serde_json::Value = serde_json::from_slice(&body)?;
        let bundle = bundle_from_json(&value, Strictness::Lenient)?;

        info!(
            static_metrics = bundle.static_metrics.len(),
            compounding_metrics = bundle.compounding_metrics.len(),
            balances = bundle.balance_series.len(),
            "Fetched backtest results"
        );

        self.cache.put(query.clone(), bundle.clone());
        Ok(bundle)
    }

    async fn request_backtest(
        &self,
        file: Vec<u8>,
        options: &SubmissionOptions,
    ) -> BacktestResult<BacktestResponse> {
        let url = self.config.engine_url();
        debug!(futures = options.is_futures(), bytes = file.len(), "POST {}", url);

        let mut request = self
            .client
            .post(&url)
            .query(&options.query_params()[..]);

        request = if options.attaches_file() {
            let part = Part::bytes(file)
                .file_name(LOGS_FILE_NAME)
                .mime_str(CSV_ACCEPT)
                .map_err(transport_error)?;
            request
                .header(ACCEPT, CSV_ACCEPT)
                .multipart(Form::new().part(FILE_FIELD, part))
        } else {
            request.header(ACCEPT, JSON_ACCEPT)
        };

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let content_type = content_type_text(response.headers());
        let body = response.bytes().await.map_err(transport_error)?;

        let classified = classify_response(status, content_type.as_deref(), &body)?;
        info!(kind = classified.kind_name(), "Backtest response classified");
        Ok(classified)
    }

    /// 2xx 응답 본문 반환. 그 외 상태는 본문과 함께 에러로 변환합니다.
    async fn success_body(response: Response) -> BacktestResult<Vec<u8>> {
        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(BacktestError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            })
        }
    }
}

/// Content-Type 헤더 문자열. ASCII가 아닌 바이트는 손실 변환합니다.
fn content_type_text(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

#[async_trait]
impl BacktestApi for JarvisClient {
    async fn fetch_results(&self, query: &BacktestQuery) -> BacktestResult<ResultBundle> {
        let span = request_span!("fetch_results", query.strategy_name());
        self.request_results(query)
            .instrument(span)
            .await
            .inspect_err(|e| warn!(strategy = query.strategy_name(), "Fetch failed: {}", e))
    }

    async fn submit_backtest(
        &self,
        file: Vec<u8>,
        options: &SubmissionOptions,
    ) -> BacktestResult<BacktestResponse> {
        let span = request_span!("submit_backtest");
        self.request_backtest(file, options)
            .instrument(span)
            .await
            .inspect_err(|e| warn!("Backtest submission failed: {}", e))
    }
}
