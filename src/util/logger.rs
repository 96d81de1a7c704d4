use std::path::Path;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "cineflix-backend";

/// Owns the appender guards; dropping it flushes and stops the file writers.
pub struct Logger {
    pub guards: Vec<WorkerGuard>,
}

impl Logger {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
        let guards = Self::setup_logging(Path::new(&log_dir))?;
        Ok(Logger { guards })
    }

    /// Console (pretty) plus daily rolling plain and JSON files, with a separate error stream.
    ///
    /// - `RUST_LOG` filters the console
    /// - `FILE_LOG_LEVEL` filters the general files (default `debug`)
    /// - `ERROR_FILE_LOG_LEVEL` filters the error files (default `error`)
    pub fn setup_logging(log_dir: &Path) -> Result<Vec<WorkerGuard>, Box<dyn std::error::Error>> {
        let error_dir = log_dir.join("error");
        let json_dir = log_dir.join("json");
        let error_json_dir = error_dir.join("json");
        std::fs::create_dir_all(&error_json_dir)?;
        std::fs::create_dir_all(&json_dir)?;

        let console_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,cineflix_backend=debug"));
        let file_log_level = std::env::var("FILE_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
        let error_file_log_level = std::env::var("ERROR_FILE_LOG_LEVEL").unwrap_or_else(|_| "error".to_string());

        let (general_writer, general_guard) =
            non_blocking(rolling::daily(log_dir, format!("{}.log", LOG_FILE_PREFIX)));
        let (error_writer, error_guard) =
            non_blocking(rolling::daily(&error_dir, format!("{}-error.log", LOG_FILE_PREFIX)));
        let (json_writer, json_guard) =
            non_blocking(rolling::daily(&json_dir, format!("{}.json", LOG_FILE_PREFIX)));
        let (error_json_writer, error_json_guard) =
            non_blocking(rolling::daily(&error_json_dir, format!("{}-error.json", LOG_FILE_PREFIX)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(true)
                    .with_filter(console_filter),
            )
            .with(
                fmt::layer()
                    .with_writer(general_writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&file_log_level)),
            )
            .with(
                fmt::layer()
                    .with_writer(error_writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new(&error_file_log_level)),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(json_writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_filter(EnvFilter::new(&file_log_level)),
            )
            .with(
                fmt::layer()
                    .json()
                    .with_writer(error_json_writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_filter(EnvFilter::new(&error_file_log_level)),
            )
            .try_init()?;

        Ok(vec![general_guard, error_guard, json_guard, error_json_guard])
    }
}
