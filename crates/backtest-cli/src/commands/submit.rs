//! 로그 파일 백테스트 제출 명령어.
//!
//! 선물 모드(기본)에서는 로그 파일을 첨부하고 거래 로그(CSV)를 받습니다.
//! 현물 모드(`--spot`)에서는 파일 없이 요청하고 통계 묶음(JSON)을 받습니다.
//!
//! # 사용 예시
//!
//! ```bash
//! # 선물 로그 제출, 잔고 열을 포함해 저장
//! backtest submit logs.csv --no-stats --with-balance -o out
//!
//! # 현물, 체인 모드, 수수료 0.1%
//! backtest submit logs.csv --spot --chain --commission 0.1
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use backtest_client::BacktestApi;
use backtest_core::{
    derive_running_balance, BacktestResponse, BacktestResult, BalancePoint,
    DownloadArtifact, ResultBundle, SubmissionOptions, TradeLog,
};
use tracing::{info, warn};

/// 잔고 시계열 x축 열
pub const X_AXIS_COLUMN: &str = "exit_at";

/// 제출 CLI 설정
#[derive(Debug, Clone)]
pub struct SubmitCliConfig {
    /// 업로드할 로그 파일
    pub file_path: PathBuf,
    pub options: SubmissionOptions,
    /// 누적 잔고 시작 값
    pub starting_balance: f64,
    /// 다운로드 파일에 잔고 열 포함
    pub with_balance: bool,
    /// 다운로드 파일 저장 디렉토리 (없으면 저장하지 않음)
    pub output_dir: Option<PathBuf>,
}

/// 거래 로그 응답 처리 결과
#[derive(Debug)]
pub struct TradeLogOutcome {
    /// 서비스가 보낸 거래 로그
    pub log: TradeLog,
    /// 잔고 열이 추가된 거래 로그 (계산 실패 시 에러)
    pub derived: BacktestResult<TradeLog>,
    pub artifact: DownloadArtifact,
    /// 저장된 다운로드 파일 경로
    pub saved_to: Option<PathBuf>,
}

impl TradeLogOutcome {
    /// 차트용 잔고 시계열. x축 열이 없거나 잔고 계산이 실패했으면 `None`.
    pub fn balance_points(&self) -> Option<Vec<BalancePoint>> {
        let derived = self.derived.as_ref().ok()?;
        derived.balance_points(X_AXIS_COLUMN).ok()
    }
}

/// 제출 결과
#[derive(Debug)]
pub enum SubmitOutcome {
    Bundle(ResultBundle),
    TradeLog(Box<TradeLogOutcome>),
}

/// 백테스트 제출 실행
pub async fn run_submit(api: &dyn BacktestApi, config: &SubmitCliConfig) -> Result<SubmitOutcome> {
    if !config.starting_balance.is_finite() {
        bail!(
            "Starting balance must be a finite number, got {}",
            config.starting_balance
        );
    }

    let file = tokio::fs::read(&config.file_path)
        .await
        .with_context(|| format!("Failed to read {}", config.file_path.display()))?;

    info!(
        file = %config.file_path.display(),
        bytes = file.len(),
        futures = config.options.is_futures(),
        chain = config.options.chain_mode(),
        commission = config.options.commission(),
        "Submitting backtest"
    );

    match api.submit_backtest(file, &config.options).await? {
        BacktestResponse::Bundle(bundle) => Ok(SubmitOutcome::Bundle(bundle)),
        BacktestResponse::TradeLog(log) => {
            let outcome = handle_trade_log(log, config)?;
            Ok(SubmitOutcome::TradeLog(Box::new(outcome)))
        }
    }
}

fn handle_trade_log(log: TradeLog, config: &SubmitCliConfig) -> Result<TradeLogOutcome> {
    let derived = derive_running_balance(&log, config.starting_balance);

    let artifact = match (&derived, config.with_balance) {
        (Ok(derived), true) => DownloadArtifact::for_submission(&config.options, derived, true)?,
        (Err(e), true) => bail!("Cannot add balance column to download: {}", e),
        (_, false) => DownloadArtifact::for_submission(&config.options, &log, false)?,
    };

    if let Err(e) = &derived {
        warn!("Running balance unavailable: {}", e);
    }

    let saved_to = match &config.output_dir {
        Some(dir) => {
            let path = artifact.write_to(dir)?;
            info!(path = %path.display(), "Download file saved");
            Some(path)
        }
        None => None,
    };

    Ok(TradeLogOutcome {
        log,
        derived,
        artifact,
        saved_to,
    })
}

/// 제출 옵션 생성 (CLI 플래그 → 옵션)
pub fn submission_options(
    spot: bool,
    chain: bool,
    commission: f64,
    no_stats: bool,
) -> BacktestResult<SubmissionOptions> {
    SubmissionOptions::new(!spot, chain, commission, !no_stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::StubApi;
    use backtest_core::{ErrorKind, BALANCE_COLUMN, LOGS_FILE_NAME, RESULTS_FILE_NAME};
    use std::fs;

    const TRADE_CSV: &str = "profit,exit_at\n50,2024-01-01\n-20,2024-01-02\n";

    fn config_for(dir: &std::path::Path, options: SubmissionOptions) -> SubmitCliConfig {
        let file_path = dir.join("upload.csv");
        fs::write(&file_path, "timestamp,signal\n1,1\n").unwrap();

        SubmitCliConfig {
            file_path,
            options,
            starting_balance: 1000.0,
            with_balance: false,
            output_dir: None,
        }
    }

    fn futures() -> SubmissionOptions {
        submission_options(false, false, 0.15, true).unwrap()
    }

    #[tokio::test]
    async fn test_futures_submission_derives_balance() {
        let dir = tempfile::tempdir().unwrap();
        let api = StubApi::csv(TRADE_CSV);
        let mut config = config_for(dir.path(), futures());
        config.output_dir = Some(dir.path().join("out"));

        let outcome = run_submit(&api, &config).await.unwrap();
        let SubmitOutcome::TradeLog(outcome) = outcome else {
            panic!("expected trade log");
        };

        let balances: Vec<f64> = outcome
            .balance_points()
            .unwrap()
            .iter()
            .map(|p| p.balance)
            .collect();
        assert_eq!(balances, vec![1050.0, 1030.0]);

        // 잔고 열 없이 원본 그대로 저장
        let saved = outcome.saved_to.as_ref().unwrap();
        assert!(saved.ends_with(LOGS_FILE_NAME));
        assert_eq!(fs::read_to_string(saved).unwrap(), TRADE_CSV);

        let submissions = api.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].0, b"timestamp,signal\n1,1\n");
    }

    #[tokio::test]
    async fn test_with_balance_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let api = StubApi::csv(TRADE_CSV);
        let mut config = config_for(dir.path(), futures());
        config.with_balance = true;
        config.starting_balance = 500.0;

        let SubmitOutcome::TradeLog(outcome) = run_submit(&api, &config).await.unwrap() else {
            panic!("expected trade log");
        };

        let text = String::from_utf8(outcome.artifact.bytes.clone()).unwrap();
        assert!(text.starts_with(&format!("profit,exit_at,{}", BALANCE_COLUMN)));
        assert!(text.contains("530"));
        assert!(outcome.saved_to.is_none());
    }

    #[tokio::test]
    async fn test_invalid_profit_keeps_raw_log() {
        let dir = tempfile::tempdir().unwrap();
        let api = StubApi::csv("profit,exit_at\n50,2024-01-01\nn/a,2024-01-02\n");
        let config = config_for(dir.path(), futures());

        let SubmitOutcome::TradeLog(outcome) = run_submit(&api, &config).await.unwrap() else {
            panic!("expected trade log");
        };

        assert_eq!(outcome.log.len(), 2);
        let err = outcome.derived.as_ref().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRecord);
        assert!(outcome.balance_points().is_none());
    }

    #[tokio::test]
    async fn test_invalid_profit_with_balance_fails() {
        let dir = tempfile::tempdir().unwrap();
        let api = StubApi::csv("profit\nbad\n");
        let mut config = config_for(dir.path(), futures());
        config.with_balance = true;

        assert!(run_submit(&api, &config).await.is_err());
    }

    #[tokio::test]
    async fn test_spot_submission_returns_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let api = StubApi::json(
            r#"{"results": {"Static": {"Total Trades": 3}, "Compounding": {"CAGR": 0.1}}}"#,
        );
        let options = submission_options(true, true, 0.1, false).unwrap();
        let config = config_for(dir.path(), options);

        let SubmitOutcome::Bundle(bundle) = run_submit(&api, &config).await.unwrap() else {
            panic!("expected bundle");
        };
        assert_eq!(bundle.static_metrics.len(), 1);

        let submissions = api.submissions();
        let (_, sent) = &submissions[0];
        assert!(!sent.is_futures());
        assert!(sent.chain_mode());
        assert!(!sent.include_stats());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let api = StubApi::csv(TRADE_CSV);
        let config = SubmitCliConfig {
            file_path: PathBuf::from("/nonexistent/logs.csv"),
            options: futures(),
            starting_balance: 1000.0,
            with_balance: false,
            output_dir: None,
        };

        assert!(run_submit(&api, &config).await.is_err());
        assert!(api.submissions().is_empty());
    }

    #[test]
    fn test_results_file_name_for_spot() {
        let options = submission_options(true, false, 0.15, true).unwrap();
        let log = TradeLog::new(vec!["profit".into()], vec![]).unwrap();
        let artifact = DownloadArtifact::for_submission(&options, &log, false).unwrap();
        assert_eq!(artifact.file_name, RESULTS_FILE_NAME);
    }

    #[test]
    fn test_commission_out_of_range() {
        assert!(submission_options(false, false, 1.5, false).is_err());
    }
}
