//! 백테스트 결과 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 저장된 전략 통계 조회
//! backtest fetch -s ema_cross --start 2024-01-01 --end 2024-06-30
//!
//! # 선물 로그 제출 후 거래 로그와 누적 잔고 출력, 다운로드 파일 저장
//! backtest submit logs.csv -o out
//!
//! # 현물 제출 (파일 첨부 없음, 통계 묶음 응답)
//! backtest submit logs.csv --spot --commission 0.1
//!
//! # 설정 파일 지정
//! backtest --config config/backtest.toml fetch -s rsi
//! ```

use std::path::PathBuf;

use anyhow::anyhow;
use backtest_cli::commands::fetch::{run_fetch, FetchCliConfig};
use backtest_cli::commands::submit::{
    run_submit, submission_options, SubmitCliConfig, SubmitOutcome, TradeLogOutcome,
};
use backtest_cli::render::{render_balance_series, render_bundle, render_trade_log};
use backtest_client::JarvisClient;
use backtest_core::{init_logging, AppConfig, LogConfig, DEFAULT_COMMISSION};
use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "backtest")]
#[command(about = "Backtest result viewer - 전략 백테스트 통계 조회 및 로그 제출", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 저장된 전략의 백테스트 통계 조회
    Fetch {
        /// 전략 이름
        #[arg(short, long)]
        strategy: String,

        /// 시작 시점 (예: 2024-01-01)
        #[arg(long)]
        start: Option<String>,

        /// 종료 시점 (예: 2024-06-30)
        #[arg(long)]
        end: Option<String>,

        /// 통계 제외
        #[arg(long)]
        no_stats: bool,
    },

    /// 로그 파일로 백테스트 실행
    Submit {
        /// 업로드할 로그 파일 (CSV)
        file: PathBuf,

        /// 현물 모드 (파일 첨부 없음)
        #[arg(long)]
        spot: bool,

        /// 체인 모드
        #[arg(long)]
        chain: bool,

        /// 수수료율
        #[arg(long, default_value_t = DEFAULT_COMMISSION)]
        commission: f64,

        /// 통계 제외
        #[arg(long)]
        no_stats: bool,

        /// 누적 잔고 시작 값 (기본: 설정 파일의 balance.starting_balance)
        #[arg(long)]
        starting_balance: Option<f64>,

        /// 다운로드 파일에 잔고 열 포함
        #[arg(long)]
        with_balance: bool,

        /// 다운로드 파일 저장 디렉토리
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let client = JarvisClient::from_app_config(&config)?;
    info!(base_url = %config.api.base_url, "Backtest service configured");

    match cli.command {
        Commands::Fetch {
            strategy,
            start,
            end,
            no_stats,
        } => {
            let fetch_config = FetchCliConfig {
                strategy,
                start,
                end,
                include_stats: !no_stats,
            };

            match run_fetch(&client, &fetch_config).await {
                Ok(bundle) => print!("{}", render_bundle(&bundle)),
                Err(e) => {
                    error!("Fetch failed: {:#}", e);
                    return Err(e);
                }
            }
        }

        Commands::Submit {
            file,
            spot,
            chain,
            commission,
            no_stats,
            starting_balance,
            with_balance,
            output,
        } => {
            let submit_config = SubmitCliConfig {
                file_path: file,
                options: submission_options(spot, chain, commission, no_stats)?,
                starting_balance: starting_balance.unwrap_or(config.balance.starting_balance),
                with_balance,
                output_dir: output,
            };

            match run_submit(&client, &submit_config).await {
                Ok(SubmitOutcome::Bundle(bundle)) => print!("{}", render_bundle(&bundle)),
                Ok(SubmitOutcome::TradeLog(outcome)) => print_trade_log(&outcome),
                Err(e) => {
                    error!("Submission failed: {:#}", e);
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}

fn print_trade_log(outcome: &TradeLogOutcome) {
    match &outcome.derived {
        Ok(derived) => print!("{}", render_trade_log("Trade Log", derived)),
        Err(e) => {
            print!("{}", render_trade_log("Trade Log", &outcome.log));
            println!("\n잔고 계산 불가: {}", e);
        }
    }

    if let Some(points) = outcome.balance_points() {
        print!("{}", render_balance_series(&points));
    }

    match &outcome.saved_to {
        Some(path) => println!("\n저장 위치: {}", path.display()),
        None => println!(
            "\n다운로드 파일: {} ({} bytes, -o 로 저장)",
            outcome.artifact.file_name,
            outcome.artifact.bytes.len()
        ),
    }
}
