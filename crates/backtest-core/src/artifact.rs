//! 다운로드용 거래 로그 파일.
//!
//! 제출 응답으로 받은 거래 로그를 파일로 내보냅니다. 파일 이름은 흐름에 따라
//! 정해집니다:
//! - 로그 파일을 첨부한 제출(선물 모드): `logs.csv`
//! - 파일 없이 제출한 경우: `backtest_results.csv`

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{SubmissionOptions, TradeLog};
use crate::error::{BacktestError, BacktestResult};

/// 로그 파일 첨부 제출의 다운로드 파일 이름.
pub const LOGS_FILE_NAME: &str = "logs.csv";
/// 파일 없는 제출의 다운로드 파일 이름.
pub const RESULTS_FILE_NAME: &str = "backtest_results.csv";

/// 다운로드 가능한 파일.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    /// 제출 결과 거래 로그로 다운로드 파일 생성.
    ///
    /// `with_balance`가 거짓이고 원본 본문이 남아 있으면 받은 바이트를 그대로
    /// 사용합니다. 그 외에는 파생 열을 포함해 CSV로 다시 직렬화합니다.
    pub fn for_submission(
        options: &SubmissionOptions,
        log: &TradeLog,
        with_balance: bool,
    ) -> BacktestResult<Self> {
        let file_name = if options.attaches_file() {
            LOGS_FILE_NAME
        } else {
            RESULTS_FILE_NAME
        };

        let bytes = match (with_balance, log.raw()) {
            (false, Some(raw)) => raw.as_bytes().to_vec(),
            _ => log.to_csv()?.into_bytes(),
        };

        Ok(Self { file_name, bytes })
    }

    /// 디렉토리에 파일 저장. 저장된 경로를 반환합니다.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> BacktestResult<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            BacktestError::Io(format!(
                "failed to create output directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let path = dir.join(self.file_name);
        fs::write(&path, &self.bytes).map_err(|e| {
            BacktestError::Io(format!("failed to write {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), bytes = self.bytes.len(), "Artifact saved");
        Ok(path)
    }
}
