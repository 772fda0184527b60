//! Structured logging configuration
//!
//! Provides logging with:
//! - JSON output for machine consumption
//! - Pretty formatting for interactive use
//! - Daily rolling log files
//! - A per-invocation run id span
//!
//! Console logs go to stderr. Stdout is reserved for the numbers the purchase job reads.

use crate::config::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::Span;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use uuid::Uuid;

const LOG_FILE_PREFIX: &str = "buylog.log";

/// Initialize the logging system based on configuration.
///
/// The returned guard flushes the file writer on drop and must live until exit.
pub fn init_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    let log_level = &config.logging.level;
    let log_format = &config.logging.format;

    // RUST_LOG takes precedence over the configured level
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    match config.logging.output.as_str() {
        "file" => init_file_logging(env_filter, log_format, &config.paths.log_directory).map(Some),
        "both" => {
            init_combined_logging(env_filter, log_format, &config.paths.log_directory).map(Some)
        }
        _ => {
            init_console_logging(env_filter, log_format)?;
            Ok(None)
        }
    }
}

fn init_console_logging(filter: EnvFilter, format: &str) -> Result<()> {
    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        _ => subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_ansi(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .pretty(),
            )
            .try_init(),
    }
    .context("Failed to install console logger")
}

fn init_file_logging(filter: EnvFilter, format: &str, log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
            .try_init(),
    }
    .context("Failed to install file logger")?;

    Ok(guard)
}

fn init_combined_logging(filter: EnvFilter, format: &str, log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        "json" => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .try_init(),
    }
    .context("Failed to install combined logger")?;

    Ok(guard)
}

/// Span wrapping one invocation, tagged with a fresh run id
pub fn run_span(log_file: &Path) -> Span {
    tracing::info_span!(
        "run",
        run_id = %Uuid::new_v4(),
        log_file = %log_file.display()
    )
}
