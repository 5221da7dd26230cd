//! CLI entry point for the tunedl tool.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tunedl_core::Database;
use tunedl_core::config::EngineConfig;
use tunedl_core::engine::{DownloadEngine, DriverPolicy};
use tunedl_core::extractor::YtDlpExtractor;
use tunedl_core::report::ReportWriter;
use tunedl_core::store::{Library, SettingsStore};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    url::Url::parse(&args.url).with_context(|| format!("not a valid URL: {}", args.url))?;

    let db = Database::new(&args.database)
        .await
        .with_context(|| format!("could not open database {}", args.database.display()))?;

    // Start from the options remembered in the database, overlay the flags
    // passed this time, and remember the result for the next run.
    let settings = SettingsStore::new(db.clone());
    let mut config = EngineConfig::default();
    config.apply_settings(&settings.load().await?);
    args.apply_to(&mut config);
    for (key, value) in config.to_settings() {
        settings.save(key, &value).await?;
    }
    info!(
        output_dir = %config.output_dir().display(),
        format = config.audio_format(),
        bitrate = config.bitrate(),
        "configuration resolved"
    );

    let library = Library::new(db.clone());
    let source = match &args.ytdlp {
        Some(binary) => Arc::new(YtDlpExtractor::with_binary(binary)),
        None => Arc::new(YtDlpExtractor::new()),
    };

    let mut engine = DownloadEngine::new(library, source, config, DriverPolicy::default());
    if let Some(report_path) = &args.report {
        let report = ReportWriter::create(report_path)
            .with_context(|| format!("could not open report {}", report_path.display()))?;
        engine = engine.with_report(report);
    }

    // First Ctrl-C asks the engine to stop; it takes effect within about a
    // second and leaves unfinished tracks pending for the next run.
    let control = engine.control();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("stop requested; unfinished tracks stay pending");
            control.request_stop();
        }
    });

    let stats = engine.run(&args.url).await?;

    if stats.was_stopped() {
        warn!("run stopped before finishing; re-run the same URL to resume");
    }
    info!(
        new_tracks = stats.new_tracks(),
        completed = stats.completed(),
        already_on_disk = stats.skipped_existing(),
        failed = stats.failed(),
        deferred = stats.deferred(),
        "run finished"
    );

    db.close().await;
    Ok(())
}
