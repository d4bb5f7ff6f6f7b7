use std::{env, path::PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REFRESH_MS: u64 = 100;
pub const DEFAULT_STATS_MS: u64 = 5_000;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5_000;

pub(super) const MIN_REFRESH_MS: u64 = 20;
pub(super) const MAX_REFRESH_MS: u64 = 10_000;
pub(super) const MIN_POLL_MS: u64 = 50;
pub(super) const MAX_POLL_MS: u64 = 60_000;
pub(super) const MIN_STATS_MS: u64 = 500;
pub(super) const MAX_STATS_MS: u64 = 600_000;
pub(super) const MIN_HTTP_TIMEOUT_MS: u64 = 100;
pub(super) const MAX_HTTP_TIMEOUT_MS: u64 = 120_000;

const SETTINGS_FILE: &str = "settings.yaml";

/// `$XDG_CONFIG_HOME/solvecam/settings.yaml`, then `~/.config/...`, then the temp dir.
pub fn default_settings_path() -> PathBuf {
    let config_root = env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var_os("HOME")
                .filter(|value| !value.is_empty())
                .map(|home| PathBuf::from(home).join(".config"))
        })
        .unwrap_or_else(env::temp_dir);
    config_root.join("solvecam").join(SETTINGS_FILE)
}

/// Snapshots land in the working directory unless `--snapshot-dir` says otherwise.
pub fn default_snapshot_dir() -> PathBuf {
    PathBuf::from(".")
}
