//! Viewport source selection: which frame URL is on screen for the current
//! display mode, refreshed on a fixed cadence together with the FPS readout.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::backend::{absolute_url, CallPoll, Dispatcher, PendingCall};
use crate::log_debug;
use crate::solve::{DisplayMode, RepeatingTask};

/// Produces strictly increasing `t=` query values so no frame is served from cache.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: u64,
}

impl CacheBuster {
    pub fn next_token(&mut self) -> u64 {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();
        let token = now_ms.max(self.last.saturating_add(1));
        self.last = token;
        token
    }

    pub fn bust(&mut self, url: &str) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}t={}", self.next_token())
    }
}

/// The last frame the viewport managed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    pub url: String,
    pub mode: DisplayMode,
    pub bytes: usize,
}

struct InFlight<T> {
    mode: DisplayMode,
    url: String,
    call: PendingCall<T>,
}

pub struct FeedSelector {
    base_url: String,
    refresh: RepeatingTask,
    frame_call: Option<InFlight<Vec<u8>>>,
    fps_call: Option<InFlight<f64>>,
    current_url: Option<String>,
    last_frame: Option<FrameInfo>,
    fps: Option<f64>,
    frames_loaded: u64,
    frame_errors: u64,
}

impl FeedSelector {
    pub fn new(base_url: &str, cadence: Duration, now: Instant) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            refresh: RepeatingTask::immediate(cadence, now),
            frame_call: None,
            fps_call: None,
            current_url: None,
            last_frame: None,
            fps: None,
            frames_loaded: 0,
            frame_errors: 0,
        }
    }

    /// Frame URL for `mode` with a fresh cache-busting token.
    pub fn frame_url(&self, mode: DisplayMode, buster: &mut CacheBuster) -> String {
        buster.bust(&absolute_url(&self.base_url, mode.frame_path()))
    }

    pub fn cadence(&self) -> Duration {
        self.refresh.interval()
    }

    /// URL the viewport is currently pointed at.
    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn last_frame(&self) -> Option<&FrameInfo> {
        self.last_frame.as_ref()
    }

    pub fn fps(&self) -> Option<f64> {
        self.fps
    }

    pub fn frames_loaded(&self) -> u64 {
        self.frames_loaded
    }

    pub fn frame_errors(&self) -> u64 {
        self.frame_errors
    }

    /// Collect finished fetches and refresh when the cadence is due.
    pub fn tick(
        &mut self,
        now: Instant,
        mode: DisplayMode,
        dispatcher: &Dispatcher,
        buster: &mut CacheBuster,
    ) -> bool {
        let mut changed = self.collect_frame(mode);
        changed |= self.collect_fps(mode);
        if self.refresh.fire_if_due(now) {
            self.refresh_source(mode, dispatcher, buster);
            changed = true;
        }
        changed
    }

    /// Point the viewport at `mode` right away instead of waiting for the next tick.
    /// Fetches still running for the previous source are abandoned.
    pub fn force_refresh(
        &mut self,
        now: Instant,
        mode: DisplayMode,
        dispatcher: &Dispatcher,
        buster: &mut CacheBuster,
    ) {
        if self
            .frame_call
            .as_ref()
            .is_some_and(|inflight| inflight.mode != mode)
        {
            self.frame_call = None;
        }
        if self
            .fps_call
            .as_ref()
            .is_some_and(|inflight| inflight.mode != mode)
        {
            self.fps_call = None;
        }
        self.refresh.fire_now(now);
        self.tick(now, mode, dispatcher, buster);
    }

    fn refresh_source(
        &mut self,
        mode: DisplayMode,
        dispatcher: &Dispatcher,
        buster: &mut CacheBuster,
    ) {
        let url = self.frame_url(mode, buster);
        self.current_url = Some(url.clone());
        // A slow frame keeps its slot; the next tick carries a newer token anyway.
        if self.frame_call.is_none() {
            self.frame_call = Some(InFlight {
                mode,
                url: url.clone(),
                call: dispatcher.frame(url),
            });
        }
        if self.fps_call.is_none() {
            self.fps_call = Some(InFlight {
                mode,
                url: absolute_url(&self.base_url, mode.fps_path()),
                call: dispatcher.fps(mode),
            });
        }
    }

    fn collect_frame(&mut self, mode: DisplayMode) -> bool {
        let Some(inflight) = self.frame_call.as_mut() else {
            return false;
        };
        let result = match inflight.call.poll() {
            CallPoll::Pending => return false,
            CallPoll::Ready(result) => result,
        };
        let Some(inflight) = self.frame_call.take() else {
            return false;
        };
        if inflight.mode != mode {
            return false;
        }
        match result {
            Ok(bytes) => {
                self.frames_loaded += 1;
                self.last_frame = Some(FrameInfo {
                    url: inflight.url,
                    mode: inflight.mode,
                    bytes: bytes.len(),
                });
                true
            }
            Err(err) => {
                // The next tick retries with a new token.
                self.frame_errors += 1;
                log_debug(&format!("frame load failed ({}): {err}", inflight.url));
                false
            }
        }
    }

    fn collect_fps(&mut self, mode: DisplayMode) -> bool {
        let Some(inflight) = self.fps_call.as_mut() else {
            return false;
        };
        let result = match inflight.call.poll() {
            CallPoll::Pending => return false,
            CallPoll::Ready(result) => result,
        };
        let Some(inflight) = self.fps_call.take() else {
            return false;
        };
        if inflight.mode != mode {
            return false;
        }
        match result {
            Ok(fps) => {
                let changed = self.fps != Some(fps);
                self.fps = Some(fps);
                changed
            }
            Err(err) => {
                log_debug(&format!("fps fetch failed ({}): {err}", inflight.url));
                false
            }
        }
    }
}
