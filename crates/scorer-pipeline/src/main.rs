//! News scorer CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use scorer_core::{init_logging, LogConfig, LogFormat, RunConfig, StockCode};
use scorer_pipeline::{load_processed_codes, JsonDirectorySource, Orchestrator, ResultExporter};

#[derive(Parser)]
#[command(name = "news-scorer")]
#[command(about = "LLM 기반 종목 뉴스 팩터 스코어러", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// 설정 파일 경로 (기본: config/scorer.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// 뉴스 스코어링 실행
    Run {
        /// 대상 종목 (쉼표로 구분, 예: "000001,600000")
        #[arg(long)]
        codes: Option<String>,

        /// 최대 처리 항목 수
        #[arg(long)]
        process_num: Option<i64>,

        /// 이미 처리된 종목도 다시 처리
        #[arg(long)]
        no_resume: bool,
    },

    /// 소스 디렉토리의 종목 목록 출력
    ListSources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = RunConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;

    // 로깅 초기화
    let mut log_config = LogConfig::from(&config.logging);
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    match cli.command {
        Commands::Run {
            codes,
            process_num,
            no_resume,
        } => {
            if let Some(codes) = codes {
                config.pipeline.stock_codes = StockCode::parse_list(&codes);
            }
            if let Some(n) = process_num {
                config.pipeline.process_num = n;
            }
            if no_resume {
                config.pipeline.resume = false;
            }
            run(config).await?;
        }
        Commands::ListSources => {
            let source = JsonDirectorySource::from_config(&config.source);
            let codes = source.list_codes().await.with_context(|| {
                format!("소스 디렉토리 읽기 실패: {}", source.directory().display())
            })?;
            let processed = load_processed_codes(&config.output.results_path())?;

            for code in &codes {
                let name = config
                    .source
                    .stock_names
                    .get(code.as_str())
                    .map(String::as_str)
                    .unwrap_or("-");
                let mark = if processed.contains(code) { "처리됨" } else { "" };
                println!("{}\t{}\t{}", code, name, mark);
            }
            tracing::info!(count = codes.len(), "종목 목록 출력 완료");
        }
    }

    Ok(())
}

async fn run(mut config: RunConfig) -> anyhow::Result<()> {
    tracing::info!("News Scorer 시작");

    if config.pipeline.resume {
        let processed = load_processed_codes(&config.output.results_path())?;
        let before = config.pipeline.stock_codes.len();
        config
            .pipeline
            .stock_codes
            .retain(|code| !processed.contains(code));

        let skipped = before - config.pipeline.stock_codes.len();
        if skipped > 0 {
            tracing::info!(skipped, "이미 처리된 종목 건너뜀");
        }
        if config.pipeline.stock_codes.is_empty() {
            tracing::info!("처리할 종목이 없습니다");
            return Ok(());
        }
    }

    let source = Arc::new(JsonDirectorySource::from_config(&config.source));
    let orchestrator = Orchestrator::from_config(&config, source)?;

    // Ctrl-C: 새 항목 분배 중단, 실행 중인 호출은 완료 대기
    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("종료 신호 수신, 실행 중인 요청 완료 후 종료합니다...");
            cancel.cancel();
        }
    });

    let report = orchestrator.run().await?;
    report.stats.log_summary("뉴스 스코어링");

    for (code, error) in report.errors() {
        tracing::error!(stock_code = %code, error = %error, "종목 처리 실패");
    }

    let exporter = ResultExporter::from_config(&config.output);
    let summary = exporter.export(&report)?;
    tracing::info!(
        rows = summary.rows_appended,
        failed = summary.failed_tasks,
        results = %exporter.results_path().display(),
        "결과 저장 완료"
    );

    if report.cancelled {
        tracing::warn!("취소로 일부 종목만 처리되었습니다");
    }
    tracing::info!("News Scorer 종료");

    Ok(())
}
