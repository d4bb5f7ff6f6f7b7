use crate::backend::{
    absolute_url, HttpBackend, SolveBackend, SNAPSHOT_PATH, SOLVE_PATH, SOLVE_STATUS_PATH,
    SYSTEM_STATS_PATH,
};
use crate::config::AppConfig;
use crate::settings::SettingsStore;
use crate::solve::DisplayMode;
use crate::telemetry::tracing_log_path;
use crate::{crash_log_path, log_file_path};
use crossterm::terminal::size as terminal_size;
use std::{env, fmt::Display};

pub struct DoctorReport {
    lines: Vec<String>,
}

impl DoctorReport {
    pub fn new(title: &str) -> Self {
        Self {
            lines: vec![title.to_string()],
        }
    }

    pub fn section(&mut self, title: &str) {
        self.lines.push(String::new());
        self.lines.push(format!("{title}:"));
    }

    pub fn push_kv(&mut self, key: &str, value: impl Display) {
        self.lines.push(format!("  {key}: {value}"));
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Environment, configuration and endpoint summary. `probe` also asks the
/// service for its live FPS to check that it answers.
pub fn doctor_report(config: &AppConfig, probe: bool) -> DoctorReport {
    let mut report = DoctorReport::new("solvecam doctor");
    report.push_kv("version", env!("CARGO_PKG_VERSION"));
    report.push_kv("os", format!("{}/{}", env::consts::OS, env::consts::ARCH));

    let mut validated = config.clone();
    let validation_result = validated.validate();
    let resolved = validation_result
        .as_ref()
        .map(|_| &validated)
        .unwrap_or(config);

    report.section("Terminal");
    match terminal_size() {
        Ok((cols, rows)) => report.push_kv("size", format!("{cols}x{rows}")),
        Err(err) => report.push_kv("size", format!("error: {err}")),
    }
    if let Ok(term) = env::var("TERM") {
        report.push_kv("term", term);
    }
    report.push_kv("color_mode", detect_color_mode());
    report.push_kv("unicode", detect_unicode_support());

    report.section("Config");
    match &validation_result {
        Ok(()) => report.push_kv("validation", "ok"),
        Err(err) => report.push_kv("validation", format!("error: {err}")),
    }
    report.push_kv("solve_mode", resolved.solve_mode.label());
    report.push_kv(
        "poll_interval",
        format!("{} ms", resolved.effective_poll_interval().as_millis()),
    );
    report.push_kv("refresh_interval", format!("{} ms", resolved.refresh_ms));
    report.push_kv("stats_interval", format!("{} ms", resolved.stats_ms));
    report.push_kv("media_timeout", format!("{} ms", resolved.http_timeout_ms));
    report.push_kv("solve_timeout", "none");
    report.push_kv(
        "logs",
        if resolved.logs_enabled() {
            "enabled"
        } else {
            "disabled"
        },
    );
    report.push_kv("log_file", log_file_path().display());
    report.push_kv("crash_log", crash_log_path().display());
    report.push_kv("trace_log", tracing_log_path().display());

    report.section("Settings");
    report.push_kv("snapshot_dir", resolved.snapshot_dir.display());
    if resolved.no_remember_mode {
        report.push_kv("remember_mode", "disabled");
    } else {
        let path = resolved.resolved_settings_path();
        let remembered = match SettingsStore::load(&path) {
            Ok(store) => store
                .display_mode()
                .map(|mode| mode.label().to_string())
                .unwrap_or_else(|| "unset".to_string()),
            Err(err) => format!("error: {err:#}"),
        };
        report.push_kv("settings_file", path.display());
        report.push_kv("remembered_mode", remembered);
    }

    report.section("Service");
    let base = resolved.base_url.trim_end_matches('/');
    report.push_kv("base_url", base);
    for (label, path) in [
        ("solve", SOLVE_PATH),
        ("solve_status", SOLVE_STATUS_PATH),
        ("live_frame", DisplayMode::Live.frame_path()),
        ("solved_frame", DisplayMode::Solved.frame_path()),
        ("live_fps", DisplayMode::Live.fps_path()),
        ("solved_fps", DisplayMode::Solved.fps_path()),
        ("system_stats", SYSTEM_STATS_PATH),
        ("snapshot", SNAPSHOT_PATH),
    ] {
        report.push_kv(label, absolute_url(base, path));
    }
    if probe && validation_result.is_ok() {
        let status = match HttpBackend::new(base, resolved.http_timeout()) {
            Ok(backend) => match backend.fps(DisplayMode::Live) {
                Ok(fps) => format!("ok (live fps {fps})"),
                Err(err) => format!("unreachable: {err}"),
            },
            Err(err) => format!("client error: {err:#}"),
        };
        report.push_kv("probe", status);
    }

    report
}

fn detect_color_mode() -> String {
    if env::var("NO_COLOR").is_ok() {
        return "none (NO_COLOR)".to_string();
    }
    if let Ok(colorterm) = env::var("COLORTERM") {
        let value = colorterm.to_lowercase();
        if value == "truecolor" || value == "24bit" {
            return format!("truecolor (COLORTERM={colorterm})");
        }
    }
    match env::var("TERM") {
        Ok(term) if term == "dumb" => "none (TERM=dumb)".to_string(),
        Ok(term) if term.contains("256color") => format!("256 (TERM={term})"),
        Ok(term) => format!("ansi (TERM={term})"),
        Err(_) => "ansi (default)".to_string(),
    }
}

fn detect_unicode_support() -> String {
    for key in ["LC_ALL", "LC_CTYPE", "LANG"] {
        if let Ok(value) = env::var(key) {
            let upper = value.to_ascii_uppercase();
            if upper.contains("UTF-8") || upper.contains("UTF8") {
                return format!("likely ({key}={value})");
            }
            return format!("unknown ({key}={value})");
        }
    }
    "unknown (locale env not set)".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn report_renders_sections_in_order() {
        let mut report = DoctorReport::new("title");
        report.push_kv("a", 1);
        report.section("Next");
        report.push_kv("b", "two");
        assert_eq!(report.render(), "title\n  a: 1\n\nNext:\n  b: two");
    }

    #[test]
    fn report_lists_every_endpoint() {
        let config = AppConfig::parse_from([
            "solvecam-tests",
            "--base-url",
            "http://pi.local:8080/",
            "--no-remember-mode",
        ]);
        let text = doctor_report(&config, false).render();
        assert!(text.contains("validation: ok"));
        assert!(text.contains("solve: http://pi.local:8080/solve"));
        assert!(text.contains("solve_status: http://pi.local:8080/solve_status"));
        assert!(text.contains("solved_fps: http://pi.local:8080/solved_fps"));
        assert!(text.contains("system_stats: http://pi.local:8080/system-stats"));
        assert!(text.contains("poll_interval: 200 ms"));
        assert!(text.contains("remember_mode: disabled"));
        assert!(!text.contains("probe:"));
    }

    #[test]
    fn report_shows_validation_errors() {
        let config = AppConfig::parse_from(["solvecam-tests", "--refresh-ms", "5"]);
        let text = doctor_report(&config, true).render();
        assert!(text.contains("validation: error: --refresh-ms"));
        assert!(!text.contains("probe:"));
    }
}
