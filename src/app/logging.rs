//! Debug and crash logs. Both live outside the terminal so logging never
//! scribbles over the console, and both are off unless `--logs` asks for them.

use crate::config::AppConfig;
use chrono::{SecondsFormat, Utc};
use std::{
    env, fs,
    io::Write,
    panic,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, OnceLock,
    },
};

const LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
const CRASH_LOG_MAX_BYTES: u64 = 256 * 1024;
const LOG_FILE_ENV: &str = "SOLVECAM_LOG_FILE";

static LOG_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_CONTENT_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_TIMINGS_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_STATE: OnceLock<Mutex<Option<SizedLog>>> = OnceLock::new();

/// Debug log path; `SOLVECAM_LOG_FILE` overrides the temp-dir default.
pub fn log_file_path() -> PathBuf {
    match env::var_os(LOG_FILE_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => env::temp_dir().join("solvecam.log"),
    }
}

/// Crash log path (panic location and version only, unless content logging is on).
pub fn crash_log_path() -> PathBuf {
    env::temp_dir().join("solvecam_crash.log")
}

/// Append-only file that starts over once it would grow past `max_bytes`.
struct SizedLog {
    path: PathBuf,
    file: fs::File,
    max_bytes: u64,
    len: u64,
}

impl SizedLog {
    fn open(path: &Path, max_bytes: u64) -> Option<Self> {
        let len = fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
        let truncate = len > max_bytes;
        let file = fs::OpenOptions::new()
            .create(true)
            .append(!truncate)
            .write(true)
            .truncate(truncate)
            .open(path)
            .ok()?;
        Some(Self {
            path: path.to_path_buf(),
            file,
            max_bytes,
            len: if truncate { 0 } else { len },
        })
    }

    fn append(&mut self, line: &str) {
        let next = self.len.saturating_add(line.len() as u64);
        if next > self.max_bytes {
            if let Some(fresh) = Self::open_truncated(&self.path) {
                self.file = fresh;
                self.len = 0;
            }
        }
        if self.file.write_all(line.as_bytes()).is_ok() {
            self.len = self.len.saturating_add(line.len() as u64);
        }
    }

    fn open_truncated(path: &Path) -> Option<fs::File> {
        fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .ok()
    }
}

fn log_state() -> &'static Mutex<Option<SizedLog>> {
    LOG_STATE.get_or_init(|| Mutex::new(None))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn apply(enabled: bool, content: bool, timings: bool) {
    LOG_ENABLED.store(enabled, Ordering::Relaxed);
    LOG_CONTENT_ENABLED.store(enabled && content, Ordering::Relaxed);
    LOG_TIMINGS_ENABLED.store(enabled && timings, Ordering::Relaxed);
    let mut state = log_state()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *state = if enabled {
        SizedLog::open(&log_file_path(), LOG_MAX_BYTES)
    } else {
        None
    };
}

/// Configure logging from CLI flags or environment.
pub fn init_logging(config: &AppConfig) {
    apply(config.logs_enabled(), config.log_content, config.log_timings);
    if config.logs_enabled() {
        log_debug(&format!(
            "solvecam v{} logging to {}",
            env!("CARGO_PKG_VERSION"),
            log_file_path().display()
        ));
    }
}

pub fn log_debug(msg: &str) {
    if !LOG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let line = format!("[{}] {msg}\n", timestamp());
    let mut state = log_state()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(log) = state.as_mut() {
        log.append(&line);
    }
}

/// Messages that may carry solve results or device paths.
pub fn log_debug_content(msg: &str) {
    if LOG_CONTENT_ENABLED.load(Ordering::Relaxed) {
        log_debug(msg);
    }
}

/// Per-call latency lines, only with `--log-timings`.
pub fn log_timing(label: &str, elapsed: std::time::Duration) {
    if LOG_TIMINGS_ENABLED.load(Ordering::Relaxed) {
        log_debug(&format!("timing {label}: {} ms", elapsed.as_millis()));
    }
}

pub fn log_panic(info: &panic::PanicHookInfo<'_>) {
    if !LOG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let location = info
        .location()
        .map(|loc| format!("{}:{}", loc.file(), loc.line()))
        .unwrap_or_else(|| "unknown".to_string());
    let payload = if LOG_CONTENT_ENABLED.load(Ordering::Relaxed) {
        info.payload()
            .downcast_ref::<&str>()
            .map(|text| (*text).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string())
    } else {
        "payload omitted (log-content disabled)".to_string()
    };
    let line = format!(
        "[{}] panic at {location}: {payload} (v{})\n",
        timestamp(),
        env!("CARGO_PKG_VERSION")
    );
    if let Some(mut crash) = SizedLog::open(&crash_log_path(), CRASH_LOG_MAX_BYTES) {
        crash.append(&line);
    }
}

#[cfg(test)]
pub(crate) fn set_logging_for_tests(enabled: bool, content_enabled: bool) {
    apply(enabled, content_enabled, false);
}
