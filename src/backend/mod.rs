//! Device backend seam: every call the console makes against the camera service.
//!
//! The console never talks HTTP from its control loop. Calls go through a
//! [`Dispatcher`], which runs them off-thread and hands back a [`PendingCall`]
//! the loop can poll without blocking.

mod http;
#[cfg(test)]
pub(crate) mod scripted;
mod transport;
mod wire;

use std::fmt;

use crate::solve::{DisplayMode, SolveResult};

pub use http::HttpBackend;
pub use transport::{CallPoll, Dispatcher, PendingCall};
pub use wire::{FpsReading, StartAck, StatusPayload, SystemStats};

pub const SOLVE_PATH: &str = "/solve";
pub const SOLVE_STATUS_PATH: &str = "/solve_status";
pub const SYSTEM_STATS_PATH: &str = "/system-stats";
pub const SNAPSHOT_PATH: &str = "/snapshot";

/// Errors a single backend call can end with. All of them count as transport
/// failures for the solve lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    Transport(String),
    Status(u16),
    Decode(String),
    Disconnected(&'static str),
    /// The response arrived but could not be written to disk.
    Storage(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Transport(msg) => write!(f, "transport error: {msg}"),
            BackendError::Status(code) => write!(f, "unexpected HTTP status {code}"),
            BackendError::Decode(msg) => write!(f, "invalid response body: {msg}"),
            BackendError::Disconnected(label) => write!(f, "{label} worker disconnected"),
            BackendError::Storage(msg) => write!(f, "could not save: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Runtime implementation of the camera service interface.
pub trait SolveBackend: Send + Sync {
    /// Base URL every relative path resolves against (no trailing slash).
    fn base_url(&self) -> &str;
    fn begin_solve(&self) -> Result<StartAck, BackendError>;
    fn solve_status(&self) -> Result<SolveResult, BackendError>;
    /// Fetch image bytes from a fully built (already cache-busted) URL.
    fn frame(&self, url: &str) -> Result<Vec<u8>, BackendError>;
    fn fps(&self, mode: DisplayMode) -> Result<f64, BackendError>;
    fn system_stats(&self) -> Result<SystemStats, BackendError>;
    fn snapshot(&self) -> Result<Vec<u8>, BackendError>;
}

/// Join a base URL and a path or pass an absolute URL through untouched.
pub fn absolute_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
