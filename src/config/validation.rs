use super::defaults::{
    MAX_HTTP_TIMEOUT_MS, MAX_POLL_MS, MAX_REFRESH_MS, MAX_STATS_MS, MIN_HTTP_TIMEOUT_MS,
    MIN_POLL_MS, MIN_REFRESH_MS, MIN_STATS_MS,
};
use super::AppConfig;
use anyhow::{bail, Result};

impl AppConfig {
    /// Check CLI values and normalize the base URL.
    pub fn validate(&mut self) -> Result<()> {
        self.base_url = normalize_base_url(&self.base_url)?;

        check_range("--refresh-ms", self.refresh_ms, MIN_REFRESH_MS, MAX_REFRESH_MS)?;
        check_range("--stats-ms", self.stats_ms, MIN_STATS_MS, MAX_STATS_MS)?;
        check_range(
            "--http-timeout-ms",
            self.http_timeout_ms,
            MIN_HTTP_TIMEOUT_MS,
            MAX_HTTP_TIMEOUT_MS,
        )?;
        if let Some(poll_ms) = self.poll_ms {
            check_range("--poll-ms", poll_ms, MIN_POLL_MS, MAX_POLL_MS)?;
        }

        if self.snapshot_dir.as_os_str().is_empty() {
            bail!("--snapshot-dir cannot be empty");
        }
        if self.snapshot_dir.exists() && !self.snapshot_dir.is_dir() {
            bail!(
                "--snapshot-dir {} exists and is not a directory",
                self.snapshot_dir.display()
            );
        }
        if let Some(path) = &self.settings_path {
            if path.is_dir() {
                bail!("--settings-path {} is a directory", path.display());
            }
        }
        Ok(())
    }
}

fn check_range(flag: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if !(min..=max).contains(&value) {
        bail!("{flag} must be between {min} and {max} ms, got {value}");
    }
    Ok(())
}

/// Require an http(s) URL with a host and drop trailing slashes.
pub(super) fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let Some((scheme, rest)) = trimmed.split_once("://") else {
        bail!("--base-url must start with http:// or https://, got {raw:?}");
    };
    if !matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https") {
        bail!("--base-url scheme must be http or https, got {scheme:?}");
    }
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        bail!("--base-url is missing a host: {raw:?}");
    }
    if rest.contains(['?', '#']) {
        bail!("--base-url cannot carry a query or fragment: {raw:?}");
    }
    if trimmed.chars().any(char::is_whitespace) {
        bail!("--base-url cannot contain whitespace: {raw:?}");
    }
    Ok(trimmed.to_string())
}
