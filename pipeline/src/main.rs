use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use common::logger::{TraceId, init_logger};
use pipeline::{
    cli::Cli,
    config::AppConfig,
    pull::{PullReport, run_pull},
    snapshot::{SnapshotSink, SnapshotWriter, SupabaseSink},
};
use tracing::{error, info, warn};

/// Builds the optional remote sink. A sink that cannot be constructed is
/// skipped, never fatal.
fn setup_sink(cfg: &AppConfig) -> Option<SupabaseSink> {
    let sink_cfg = cfg.sink.clone()?;

    match SupabaseSink::new(sink_cfg, cfg.http_timeout) {
        Ok(sink) => Some(sink),
        Err(e) => {
            warn!(error = %e, "cannot build supabase client; skipping upsert");
            None
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<PullReport> {
    let cfg = AppConfig::from_env(cli.demo_requested());

    let writer = SnapshotWriter::new(cfg.cache_dir.clone(), cfg.output_dir.clone());
    let sink = setup_sink(&cfg);

    let report = run_pull(
        &cfg,
        &writer,
        sink.as_ref().map(|s| s as &dyn SnapshotSink),
        &TraceId::default(),
    )
    .await?;

    Ok(report)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_logger("sales-pipeline", is_production);

    if cli.demo_requested() {
        info!("running in demo mode");
    }

    // spawned so a panic anywhere in the pull surfaces as a JoinError
    match tokio::spawn(run(cli)).await {
        Ok(Ok(report)) => {
            info!(
                artifact = %report.artifact.display(),
                latest = %report.latest.display(),
                source = %report.snapshot.source,
                demo = report.snapshot.is_demo,
                sink_upserted = report.sink_upserted,
                "sales pipeline pull completed"
            );
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!(error = ?e, "sales pipeline pull failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "sales pipeline pull aborted");
            ExitCode::FAILURE
        }
    }
}
