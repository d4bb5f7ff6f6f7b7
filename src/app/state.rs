use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::backend::{CallPoll, Dispatcher, HttpBackend, PendingCall, SolveBackend};
use crate::config::AppConfig;
use crate::feed::{CacheBuster, FeedSelector};
use crate::settings::SettingsStore;
use crate::solve::{DisplayMode, SolveCounters, SolveOrchestrator, SolvePhase, SolveReadouts};
use crate::stats::SystemStatsPoller;
use crate::{log_debug, log_debug_content};

macro_rules! state_change {
    ($self:expr, $field:ident, $value:expr) => {{
        $self.$field = $value;
        $self.request_redraw();
    }};
}

/// Central console state. Owned by the control loop; every field changes on
/// that thread only.
pub struct App {
    config: AppConfig,
    dispatcher: Dispatcher,
    display_mode: DisplayMode,
    orchestrator: SolveOrchestrator,
    feed: FeedSelector,
    stats: SystemStatsPoller,
    snapshot_call: Option<PendingCall<PathBuf>>,
    buster: CacheBuster,
    settings: Option<SettingsStore>,
    status: String,
    needs_redraw: bool,
}

impl App {
    /// Connect to the configured service over HTTP.
    pub fn new(config: AppConfig) -> Result<Self> {
        let backend = HttpBackend::new(&config.base_url, config.http_timeout())?;
        Ok(Self::with_backend(config, Arc::new(backend), Instant::now()))
    }

    pub fn with_backend(config: AppConfig, backend: Arc<dyn SolveBackend>, now: Instant) -> Self {
        Self::with_dispatcher(config, Dispatcher::new(backend), now)
    }

    pub(crate) fn with_dispatcher(config: AppConfig, dispatcher: Dispatcher, now: Instant) -> Self {
        let settings = if config.no_remember_mode {
            None
        } else {
            Some(SettingsStore::load_or_default(
                &config.resolved_settings_path(),
            ))
        };
        let display_mode = config
            .mode
            .or_else(|| settings.as_ref().and_then(SettingsStore::display_mode))
            .unwrap_or_default();
        log_debug(&format!(
            "console for {} starting in {} mode",
            dispatcher.base_url(),
            display_mode.label()
        ));
        Self {
            orchestrator: SolveOrchestrator::new(config.effective_poll_interval()),
            feed: FeedSelector::new(dispatcher.base_url(), config.refresh_interval(), now),
            stats: SystemStatsPoller::new(config.stats_interval(), now),
            snapshot_call: None,
            buster: CacheBuster::default(),
            settings,
            display_mode,
            dispatcher,
            config,
            status: "Ready.".into(),
            needs_redraw: true,
        }
    }

    /// Kick off the first solve when the session opens in solved mode.
    pub fn begin_session(&mut self, now: Instant) {
        if self.display_mode == DisplayMode::Solved {
            self.orchestrator.start(&self.dispatcher);
        }
        self.tick(now);
        self.request_redraw();
    }

    /// Switch the viewport source. Entering solved mode also starts a solve
    /// unless one is already running.
    pub fn set_display_mode(&mut self, mode: DisplayMode, now: Instant) {
        if mode == self.display_mode {
            return;
        }
        self.display_mode = mode;
        self.feed
            .force_refresh(now, mode, &self.dispatcher, &mut self.buster);
        if mode == DisplayMode::Solved && !self.orchestrator.busy() {
            self.orchestrator.start(&self.dispatcher);
        }
        if let Some(settings) = self.settings.as_mut() {
            if let Err(err) = settings.remember_display_mode(mode) {
                log_debug(&format!("failed to remember display mode: {err:#}"));
            }
        }
        tracing::info!(target: "solvecam::feed", mode = mode.label(), "display.mode");
        state_change!(self, status, format!("Display: {mode}"));
    }

    pub fn toggle_display_mode(&mut self, now: Instant) {
        self.set_display_mode(self.display_mode.toggled(), now);
    }

    /// Manual solve trigger. Disabled while an attempt is running.
    pub fn solve_field(&mut self, now: Instant) -> bool {
        if !self.solve_trigger_enabled() {
            return false;
        }
        let started = self.orchestrator.start(&self.dispatcher);
        if started {
            self.orchestrator
                .tick(now, self.display_mode, &self.dispatcher, &mut self.buster);
            self.request_redraw();
        }
        started
    }

    pub fn solve_trigger_enabled(&self) -> bool {
        !self.orchestrator.busy()
    }

    /// Fetch a full-resolution snapshot and save it in the background.
    pub fn capture_snapshot(&mut self) -> bool {
        if self.snapshot_call.is_some() {
            state_change!(self, status, "Snapshot already in progress.".into());
            return false;
        }
        self.snapshot_call = Some(
            self.dispatcher
                .save_snapshot(self.config.snapshot_dir.clone()),
        );
        state_change!(self, status, "Capturing snapshot...".into());
        true
    }

    /// One turn of the control loop.
    pub fn tick(&mut self, now: Instant) {
        let mut changed =
            self.orchestrator
                .tick(now, self.display_mode, &self.dispatcher, &mut self.buster);
        changed |= self
            .feed
            .tick(now, self.display_mode, &self.dispatcher, &mut self.buster);
        changed |= self.stats.tick(now, &self.dispatcher);
        changed |= self.poll_snapshot();
        if changed {
            self.request_redraw();
        }
    }

    fn poll_snapshot(&mut self) -> bool {
        let Some(call) = self.snapshot_call.as_mut() else {
            return false;
        };
        let result = match call.poll() {
            CallPoll::Pending => return false,
            CallPoll::Ready(result) => result,
        };
        self.snapshot_call = None;
        self.status = match result {
            Ok(path) => {
                log_debug_content(&format!("snapshot saved to {}", path.display()));
                format!("Snapshot saved to {}", path.display())
            }
            Err(err) => {
                log_debug(&format!("snapshot failed: {err}"));
                format!("Snapshot failed: {err}")
            }
        };
        true
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        self.dispatcher.base_url()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn busy(&self) -> bool {
        self.orchestrator.busy()
    }

    pub fn solve_phase(&self) -> SolvePhase {
        self.orchestrator.phase()
    }

    pub fn poll_interval(&self) -> Duration {
        self.orchestrator.poll_interval()
    }

    pub fn solve_attempt(&self) -> u64 {
        self.orchestrator.attempt()
    }

    pub fn solve_counters(&self) -> SolveCounters {
        self.orchestrator.counters()
    }

    pub fn readouts(&self) -> &SolveReadouts {
        self.orchestrator.readouts()
    }

    pub fn feed(&self) -> &FeedSelector {
        &self.feed
    }

    pub fn stats(&self) -> &SystemStatsPoller {
        &self.stats
    }

    pub fn snapshot_pending(&self) -> bool {
        self.snapshot_call.is_some()
    }

    pub fn status_text(&self) -> &str {
        &self.status
    }

    pub(crate) fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    pub(crate) fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }
}
