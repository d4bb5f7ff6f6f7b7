//! Command-line parsing and validation helpers.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub use defaults::{
    default_settings_path, default_snapshot_dir, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT_MS,
    DEFAULT_REFRESH_MS, DEFAULT_STATS_MS,
};

use crate::solve::{DisplayMode, SolveMode};

/// CLI options for the solvecam console.
#[derive(Debug, Parser, Clone)]
#[command(about = "solvecam: live view and plate-solve console", author, version)]
pub struct AppConfig {
    /// Base URL of the camera/solver service
    #[arg(long = "base-url", env = "SOLVECAM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Display mode at startup (overrides the remembered mode)
    #[arg(long = "mode", env = "SOLVECAM_MODE", value_enum)]
    pub mode: Option<DisplayMode>,

    /// Solver deployment style; picks the default status-poll cadence
    #[arg(
        long = "solve-mode",
        env = "SOLVECAM_SOLVE_MODE",
        value_enum,
        default_value_t = SolveMode::Continuous
    )]
    pub solve_mode: SolveMode,

    /// Solver status poll interval (milliseconds); defaults from --solve-mode
    #[arg(long = "poll-ms", env = "SOLVECAM_POLL_MS")]
    pub poll_ms: Option<u64>,

    /// Viewport and FPS refresh interval (milliseconds)
    #[arg(long = "refresh-ms", env = "SOLVECAM_REFRESH_MS", default_value_t = DEFAULT_REFRESH_MS)]
    pub refresh_ms: u64,

    /// System stats refresh interval (milliseconds)
    #[arg(long = "stats-ms", env = "SOLVECAM_STATS_MS", default_value_t = DEFAULT_STATS_MS)]
    pub stats_ms: u64,

    /// Timeout for frame, FPS, stats and snapshot requests (milliseconds)
    #[arg(
        long = "http-timeout-ms",
        env = "SOLVECAM_HTTP_TIMEOUT_MS",
        default_value_t = DEFAULT_HTTP_TIMEOUT_MS
    )]
    pub http_timeout_ms: u64,

    /// Settings file used to remember the display mode
    #[arg(long = "settings-path", env = "SOLVECAM_SETTINGS_PATH")]
    pub settings_path: Option<PathBuf>,

    /// Directory snapshots are saved into
    #[arg(long = "snapshot-dir", env = "SOLVECAM_SNAPSHOT_DIR", default_value_os_t = default_snapshot_dir())]
    pub snapshot_dir: PathBuf,

    /// Do not read or write the remembered display mode
    #[arg(long = "no-remember-mode", default_value_t = false)]
    pub no_remember_mode: bool,

    /// Print environment diagnostics and exit
    #[arg(long = "doctor", default_value_t = false)]
    pub doctor: bool,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "SOLVECAM_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "SOLVECAM_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Allow logging solve results and device paths (debug log only)
    #[arg(
        long = "log-content",
        env = "SOLVECAM_LOG_CONTENT",
        default_value_t = false
    )]
    pub log_content: bool,

    /// Enable per-request timing logs
    #[arg(long)]
    pub log_timings: bool,
}

impl AppConfig {
    pub fn logs_enabled(&self) -> bool {
        (self.logs || self.log_timings) && !self.no_logs
    }

    pub fn effective_poll_interval(&self) -> Duration {
        self.poll_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.solve_mode.default_poll_interval())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn resolved_settings_path(&self) -> PathBuf {
        self.settings_path
            .clone()
            .unwrap_or_else(default_settings_path)
    }
}
