use super::validation::normalize_base_url;
use super::{AppConfig, DEFAULT_BASE_URL};
use crate::solve::{DisplayMode, SolveMode};
use clap::Parser;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use std::{env, fs};

#[test]
fn defaults_validate() {
    let mut cfg = AppConfig::parse_from(["test-app"]);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.mode, None);
    assert_eq!(cfg.solve_mode, SolveMode::Continuous);
    assert_eq!(cfg.refresh_interval(), Duration::from_millis(100));
    assert_eq!(cfg.stats_interval(), Duration::from_secs(5));
    assert!(!cfg.logs_enabled());
}

#[test]
fn poll_interval_follows_solve_mode_unless_overridden() {
    let cfg = AppConfig::parse_from(["test-app"]);
    assert_eq!(cfg.effective_poll_interval(), Duration::from_millis(200));

    let cfg = AppConfig::parse_from(["test-app", "--solve-mode", "manual"]);
    assert_eq!(cfg.effective_poll_interval(), Duration::from_millis(2000));

    let cfg = AppConfig::parse_from(["test-app", "--solve-mode", "manual", "--poll-ms", "500"]);
    assert_eq!(cfg.effective_poll_interval(), Duration::from_millis(500));
}

#[test]
fn parses_display_mode() {
    let cfg = AppConfig::parse_from(["test-app", "--mode", "solved"]);
    assert_eq!(cfg.mode, Some(DisplayMode::Solved));
    assert!(AppConfig::try_parse_from(["test-app", "--mode", "annotated"]).is_err());
}

#[test]
fn rejects_refresh_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--refresh-ms", "19"]);
    assert!(cfg.validate().is_err());

    let mut cfg = AppConfig::parse_from(["test-app", "--refresh-ms", "10001"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn accepts_cadence_bounds() {
    let mut cfg = AppConfig::parse_from([
        "test-app",
        "--refresh-ms",
        "20",
        "--poll-ms",
        "60000",
        "--stats-ms",
        "500",
    ]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_poll_and_stats_out_of_bounds() {
    let mut cfg = AppConfig::parse_from(["test-app", "--poll-ms", "49"]);
    assert!(cfg.validate().is_err());

    let mut cfg = AppConfig::parse_from(["test-app", "--stats-ms", "600001"]);
    assert!(cfg.validate().is_err());

    let mut cfg = AppConfig::parse_from(["test-app", "--http-timeout-ms", "0"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn base_url_is_normalized() {
    let mut cfg = AppConfig::parse_from(["test-app", "--base-url", "http://pi.local:8080/"]);
    cfg.validate().expect("valid base url");
    assert_eq!(cfg.base_url, "http://pi.local:8080");

    assert_eq!(
        normalize_base_url("https://cam.example/api//").unwrap(),
        "https://cam.example/api"
    );
}

#[test]
fn rejects_bad_base_urls() {
    for raw in [
        "pi.local:8080",
        "ftp://pi.local",
        "http://",
        "http://pi.local/?x=1",
        "http://pi local",
    ] {
        assert!(normalize_base_url(raw).is_err(), "{raw} should be rejected");
    }
}

#[test]
fn rejects_snapshot_dir_that_is_a_file() {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = env::temp_dir().join(format!("solvecam-config-{stamp}.jpg"));
    fs::write(&path, b"x").expect("write temp file");
    let path_arg = path.to_string_lossy().to_string();

    let mut cfg = AppConfig::parse_from(["test-app", "--snapshot-dir", path_arg.as_str()]);
    assert!(cfg.validate().is_err());
    let _ = fs::remove_file(&path);
}

#[test]
fn no_logs_overrides_logs() {
    let cfg = AppConfig::parse_from(["test-app", "--logs", "--no-logs"]);
    assert!(!cfg.logs_enabled());

    let cfg = AppConfig::parse_from(["test-app", "--log-timings"]);
    assert!(cfg.logs_enabled());
}

#[test]
fn explicit_settings_path_wins() {
    let cfg = AppConfig::parse_from(["test-app", "--settings-path", "/tmp/solvecam-a.yaml"]);
    assert_eq!(
        cfg.resolved_settings_path(),
        std::path::PathBuf::from("/tmp/solvecam-a.yaml")
    );
    let cfg = AppConfig::parse_from(["test-app"]);
    assert!(cfg
        .resolved_settings_path()
        .ends_with("solvecam/settings.yaml"));
}
