//! 백테스트 서비스 trait 정의.

use async_trait::async_trait;
use backtest_core::{
    BacktestQuery, BacktestResponse, BacktestResult, ResultBundle, SubmissionOptions,
};

/// 원격 백테스트 서비스 인터페이스.
///
/// 두 작업 모두 실패를 값으로 반환하며 재시도하지 않습니다.
#[async_trait]
pub trait BacktestApi: Send + Sync {
    /// 저장된 전략의 통계 결과 조회.
    ///
    /// 같은 조회가 캐시에 있으면 원격 요청 없이 반환합니다.
    async fn fetch_results(&self, query: &BacktestQuery) -> BacktestResult<ResultBundle>;

    /// 전략 파일을 제출하고 백테스트 실행.
    ///
    /// 선물 모드일 때만 `file`을 첨부합니다. 응답은 Content-Type에 따라
    /// 통계 묶음 또는 거래 로그로 분류됩니다.
    async fn submit_backtest(
        &self,
        file: Vec<u8>,
        options: &SubmissionOptions,
    ) -> BacktestResult<BacktestResponse>;
}
