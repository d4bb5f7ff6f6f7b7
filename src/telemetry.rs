//! Structured JSON event log for the solve lifecycle, next to the plain debug log.

use crate::config::AppConfig;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

const TRACE_LOG_ENV: &str = "SOLVECAM_TRACE_LOG";

static TRACING_INIT: OnceLock<Option<PathBuf>> = OnceLock::new();

pub fn tracing_log_path() -> PathBuf {
    env::var_os(TRACE_LOG_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("solvecam_trace.jsonl"))
}

/// Install the global JSON subscriber once. Returns the trace file when tracing is active.
pub fn init_tracing(config: &AppConfig) -> Option<PathBuf> {
    if !config.logs_enabled() {
        return None;
    }
    TRACING_INIT
        .get_or_init(|| {
            let path = tracing_log_path();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .ok()?;
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_target(true)
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok()?;
            tracing::info!(
                target: "solvecam::session",
                version = env!("CARGO_PKG_VERSION"),
                base_url = %config.base_url,
                solve_mode = config.solve_mode.label(),
                "session.start"
            );
            Some(path)
        })
        .clone()
}
