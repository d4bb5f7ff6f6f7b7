use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use chrono::Local;
use crossbeam_channel::{bounded, Receiver, TryRecvError};

use super::{BackendError, SolveBackend, StartAck, SystemStats};
use crate::snapshot::save_snapshot;
use crate::solve::{DisplayMode, SolveResult};
use crate::{log_debug, log_timing};

/// Outcome of polling a [`PendingCall`] from the control loop.
#[derive(Debug)]
pub enum CallPoll<T> {
    Pending,
    Ready(Result<T, BackendError>),
}

/// Handle to one backend call running off the control thread. The worker sends
/// exactly one result; dropping the handle abandons the call and the worker's
/// send is discarded.
pub struct PendingCall<T> {
    label: &'static str,
    receiver: Receiver<Result<T, BackendError>>,
    handle: Option<JoinHandle<()>>,
}

impl<T> PendingCall<T> {
    fn new(
        label: &'static str,
        receiver: Receiver<Result<T, BackendError>>,
        handle: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            label,
            receiver,
            handle,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Check for the result without blocking.
    pub fn poll(&mut self) -> CallPoll<T> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join_worker();
                CallPoll::Ready(result)
            }
            Err(TryRecvError::Empty) => CallPoll::Pending,
            Err(TryRecvError::Disconnected) => {
                self.join_worker();
                CallPoll::Ready(Err(BackendError::Disconnected(self.label)))
            }
        }
    }

    fn join_worker(&mut self) {
        // The worker has already sent or exited, so the join returns promptly.
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log_debug(&format!("{} worker panicked", self.label));
            }
        }
    }
}

/// Runs backend calls on short-lived worker threads.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn SolveBackend>,
    inline: bool,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn SolveBackend>) -> Self {
        Self {
            backend,
            inline: false,
        }
    }

    /// Run every call on the caller's thread. The result is still only observed
    /// on the next poll, so ordering matches the threaded dispatcher.
    #[cfg(test)]
    pub(crate) fn inline(backend: Arc<dyn SolveBackend>) -> Self {
        Self {
            backend,
            inline: true,
        }
    }

    pub fn base_url(&self) -> &str {
        self.backend.base_url()
    }

    pub fn begin_solve(&self) -> PendingCall<StartAck> {
        self.call("begin_solve", |backend| backend.begin_solve())
    }

    pub fn solve_status(&self) -> PendingCall<SolveResult> {
        self.call("solve_status", |backend| backend.solve_status())
    }

    pub fn frame(&self, url: String) -> PendingCall<Vec<u8>> {
        self.call("frame", move |backend| backend.frame(&url))
    }

    pub fn fps(&self, mode: DisplayMode) -> PendingCall<f64> {
        self.call("fps", move |backend| backend.fps(mode))
    }

    pub fn system_stats(&self) -> PendingCall<SystemStats> {
        self.call("system_stats", |backend| backend.system_stats())
    }

    /// Fetch a full-resolution snapshot and write it into `dir` on the worker.
    pub fn save_snapshot(&self, dir: PathBuf) -> PendingCall<PathBuf> {
        self.call("snapshot", move |backend| {
            let bytes = backend.snapshot()?;
            save_snapshot(&dir, &bytes, Local::now())
                .map_err(|err| BackendError::Storage(format!("{err:#}")))
        })
    }

    fn call<T, F>(&self, label: &'static str, work: F) -> PendingCall<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SolveBackend) -> Result<T, BackendError> + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        if self.inline {
            let _ = tx.send(timed(label, || work(self.backend.as_ref())));
            return PendingCall::new(label, rx, None);
        }

        let backend = Arc::clone(&self.backend);
        let spawned = thread::Builder::new()
            .name(format!("solvecam-{label}"))
            .spawn(move || {
                let _ = tx.send(timed(label, || work(backend.as_ref())));
            });
        match spawned {
            Ok(handle) => PendingCall::new(label, rx, Some(handle)),
            Err(err) => {
                log_debug(&format!("failed to spawn {label} worker: {err}"));
                let (tx, rx) = bounded(1);
                let _ = tx.send(Err(BackendError::Transport(format!(
                    "failed to spawn {label} worker: {err}"
                ))));
                PendingCall::new(label, rx, None)
            }
        }
    }
}

fn timed<T>(label: &str, work: impl FnOnce() -> T) -> T {
    let started = Instant::now();
    let result = work();
    log_timing(label, started.elapsed());
    result
}
