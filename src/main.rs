//! CLI entry point for the course downloader.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use course_downloader::config::load_file_layer;
use course_downloader::{CourseDownloader, Settings};
use tracing::{debug, error, info, warn};

mod cli;
mod exit_handler;

use cli::Args;
use exit_handler::{ProcessExit, determine_exit_outcome};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

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

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&args).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            error!("{e:#}");
            ProcessExit::Fatal.into()
        }
    }
}

async fn run(args: &Args) -> Result<ProcessExit> {
    let file_layer =
        load_file_layer(args.config.as_deref()).context("Failed to load configuration")?;
    let settings =
        Settings::build(file_layer.merge(args.overrides())).context("Invalid configuration")?;
    debug!(?settings, "settings resolved");

    info!(
        course = %settings.course_slug,
        quality = %settings.quality,
        concurrency = settings.concurrency,
        "Course downloader starting"
    );

    let fail_on_error = settings.fail_on_error;
    let summary = CourseDownloader::new(settings)
        .run()
        .await
        .context("Course download aborted")?;

    for failure in &summary.failed {
        warn!(lesson = %failure.lesson.label(), reason = %failure.reason, "lesson failed");
    }
    info!(
        course = %summary.course_title,
        dir = %summary.course_dir.display(),
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        total = summary.total(),
        "Download complete"
    );

    Ok(determine_exit_outcome(summary.failed.len(), fail_on_error))
}
