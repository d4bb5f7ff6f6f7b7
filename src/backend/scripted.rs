//! In-memory camera service for tests: replies are queued up front and every
//! call is counted so tests can assert on what the console actually sent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::Receiver;

use super::{BackendError, SolveBackend, StartAck, SystemStats};
use crate::solve::{DisplayMode, SolveResult, Solution};

pub(crate) const TEST_BASE_URL: &str = "http://camera.test";

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    acks: Mutex<VecDeque<Result<StartAck, BackendError>>>,
    statuses: Mutex<VecDeque<Result<SolveResult, BackendError>>>,
    frame_results: Mutex<VecDeque<Result<Vec<u8>, BackendError>>>,
    fps_results: Mutex<VecDeque<Result<f64, BackendError>>>,
    begin_gate: Mutex<Option<Receiver<()>>>,
    begin_calls: AtomicUsize,
    status_calls: AtomicUsize,
    snapshot_calls: AtomicUsize,
    frame_urls: Mutex<Vec<String>>,
    fps_modes: Mutex<Vec<DisplayMode>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_ack(&self, status: &str) {
        self.acks.lock().unwrap().push_back(Ok(StartAck {
            status: status.to_string(),
        }));
    }

    pub(crate) fn push_ack_error(&self, err: BackendError) {
        self.acks.lock().unwrap().push_back(Err(err));
    }

    pub(crate) fn push_status(&self, result: SolveResult) {
        self.statuses.lock().unwrap().push_back(Ok(result));
    }

    pub(crate) fn push_status_error(&self, err: BackendError) {
        self.statuses.lock().unwrap().push_back(Err(err));
    }

    pub(crate) fn push_frame(&self, result: Result<Vec<u8>, BackendError>) {
        self.frame_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_fps(&self, result: Result<f64, BackendError>) {
        self.fps_results.lock().unwrap().push_back(result);
    }

    /// Make `begin_solve` block until the returned gate receives a message.
    pub(crate) fn gate_begin(&self, gate: Receiver<()>) {
        *self.begin_gate.lock().unwrap() = Some(gate);
    }

    pub(crate) fn begin_calls(&self) -> usize {
        self.begin_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn frame_urls(&self) -> Vec<String> {
        self.frame_urls.lock().unwrap().clone()
    }

    pub(crate) fn fps_modes(&self) -> Vec<DisplayMode> {
        self.fps_modes.lock().unwrap().clone()
    }
}

impl SolveBackend for ScriptedBackend {
    fn base_url(&self) -> &str {
        TEST_BASE_URL
    }

    fn begin_solve(&self) -> Result<StartAck, BackendError> {
        self.begin_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.begin_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        self.acks.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(StartAck {
                status: "solving".to_string(),
            })
        })
    }

    fn solve_status(&self) -> Result<SolveResult, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(SolveResult::Solving {
                    status: "solving".to_string(),
                })
            })
    }

    fn frame(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        self.frame_urls.lock().unwrap().push(url.to_string());
        self.frame_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![0xFF, 0xD8, 0xFF, 0xD9]))
    }

    fn fps(&self, mode: DisplayMode) -> Result<f64, BackendError> {
        self.fps_modes.lock().unwrap().push(mode);
        self.fps_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(10.0))
    }

    fn system_stats(&self) -> Result<SystemStats, BackendError> {
        Ok(SystemStats::new("48.2", "0.35"))
    }

    fn snapshot(&self) -> Result<Vec<u8>, BackendError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0xFF, 0xD8, 0x00, 0xFF, 0xD9])
    }
}

pub(crate) fn solution(ra: &str, dec: &str) -> Solution {
    Solution {
        ra: ra.to_string(),
        dec: dec.to_string(),
        ra_hms: None,
        dec_dms: None,
        roll: Some("12.0".to_string()),
        solution_time: Some("1.4".to_string()),
        constellation: Some("And".to_string()),
        image_url: Some("/static/solved.jpg".to_string()),
    }
}
