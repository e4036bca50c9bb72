//! Log setup for the `timesetor` binary.
//!
//! Stdout carries command results, so logs go to a daily-rotated file under
//! `<root>/logs`. When that directory can't be created, logs fall back to
//! stderr.

use std::env;
use timesetor_core::StorageConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "TIMESETOR_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "timesetor.log";

fn filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Installs the global subscriber. Keep the returned guard alive until exit
/// or buffered lines are lost.
pub fn init(storage: &StorageConfig) -> Option<WorkerGuard> {
    let logs_dir = storage.logs_dir();
    if let Err(err) = storage.ensure_dirs() {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
        tracing::warn!(error = %err, path = %logs_dir.display(), "Log directory unavailable, logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}
