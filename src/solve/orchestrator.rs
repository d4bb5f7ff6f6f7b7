use std::time::{Duration, Instant};

use crate::backend::{CallPoll, Dispatcher, PendingCall, StartAck};
use crate::feed::CacheBuster;
use crate::log_debug;

use super::{DisplayMode, PollHandle, SolveReadouts, SolveResult};

const STATUS_STARTING: &str = "Starting solver...";
const STATUS_SOLVING: &str = "Solving...";
const STATUS_START_REJECTED: &str = "Failed to start solver.";
const STATUS_START_ERROR: &str = "Error starting solver.";
const STATUS_SOLVED: &str = "Solved";
const STATUS_FAILED: &str = "Solver failed.";
const STATUS_POLL_ERROR: &str = "Error fetching solver status.";

/// Where the current attempt stands. Busy means anything but `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvePhase {
    Idle,
    /// Begin-solve sent, waiting for the acknowledgment.
    Requesting,
    /// Acknowledged as solving, status checks running.
    Polling,
}

impl SolvePhase {
    pub fn label(self) -> &'static str {
        match self {
            SolvePhase::Idle => "idle",
            SolvePhase::Requesting => "requesting",
            SolvePhase::Polling => "polling",
        }
    }
}

/// Running totals for the session, shown in the HUD and the doctor report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveCounters {
    pub started: u64,
    pub solved: u64,
    pub failed: u64,
    pub rejected: u64,
    pub transport_errors: u64,
    pub polls_cancelled: u64,
}

/// Owns the solve lifecycle: at most one begin-solve/poll sequence at a time.
///
/// All transitions run on the control thread from [`start`](Self::start) and
/// [`tick`](Self::tick). Backend replies only become visible on a tick, so a
/// reply can never race another transition.
pub struct SolveOrchestrator {
    phase: SolvePhase,
    poll_interval: Duration,
    attempt: u64,
    begin_call: Option<PendingCall<StartAck>>,
    status_call: Option<PendingCall<SolveResult>>,
    poll: Option<PollHandle>,
    restart_pending: bool,
    readouts: SolveReadouts,
    counters: SolveCounters,
}

impl SolveOrchestrator {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            phase: SolvePhase::Idle,
            poll_interval,
            attempt: 0,
            begin_call: None,
            status_call: None,
            poll: None,
            restart_pending: false,
            readouts: SolveReadouts::default(),
            counters: SolveCounters::default(),
        }
    }

    pub fn phase(&self) -> SolvePhase {
        self.phase
    }

    pub fn busy(&self) -> bool {
        self.phase != SolvePhase::Idle
    }

    pub fn poll_active(&self) -> bool {
        self.poll.is_some()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_pending
    }

    pub fn readouts(&self) -> &SolveReadouts {
        &self.readouts
    }

    pub fn counters(&self) -> SolveCounters {
        self.counters
    }

    /// Begin a new attempt. While busy this does nothing and returns `false`.
    pub fn start(&mut self, dispatcher: &Dispatcher) -> bool {
        if self.busy() {
            return false;
        }
        debug_assert!(self.poll.is_none() && self.status_call.is_none());
        self.attempt += 1;
        self.counters.started += 1;
        self.phase = SolvePhase::Requesting;
        self.readouts.set_solver_status(STATUS_STARTING);
        self.begin_call = Some(dispatcher.begin_solve());
        tracing::info!(target: "solvecam::solve", attempt = self.attempt, "solve.start");
        log_debug(&format!("solve attempt {} requested", self.attempt));
        true
    }

    /// Advance the lifecycle. Returns true when anything visible changed.
    pub fn tick(
        &mut self,
        now: Instant,
        mode: DisplayMode,
        dispatcher: &Dispatcher,
        buster: &mut CacheBuster,
    ) -> bool {
        let mut changed = false;
        if std::mem::take(&mut self.restart_pending) && mode == DisplayMode::Solved {
            changed |= self.start(dispatcher);
        }
        changed |= self.poll_begin_call(now);
        changed |= self.poll_status_call(mode, dispatcher.base_url(), buster);
        self.fire_status_check(now, dispatcher);
        changed
    }

    fn poll_begin_call(&mut self, now: Instant) -> bool {
        let Some(call) = self.begin_call.as_mut() else {
            return false;
        };
        let result = match call.poll() {
            CallPoll::Pending => return false,
            CallPoll::Ready(result) => result,
        };
        self.begin_call = None;

        match result {
            Ok(ack) if ack.accepted() => {
                self.phase = SolvePhase::Polling;
                self.poll = Some(PollHandle::new(self.attempt, self.poll_interval, now));
                self.readouts.set_solver_status(STATUS_SOLVING);
                tracing::info!(target: "solvecam::solve", attempt = self.attempt, "solve.ack");
            }
            Ok(ack) => {
                self.finish_attempt();
                self.counters.rejected += 1;
                self.readouts.set_solver_status(STATUS_START_REJECTED);
                tracing::warn!(
                    target: "solvecam::solve",
                    attempt = self.attempt,
                    status = %ack.status,
                    "solve.rejected"
                );
                log_debug(&format!(
                    "solve attempt {} rejected by backend (status {:?})",
                    self.attempt, ack.status
                ));
            }
            Err(err) => {
                self.finish_attempt();
                self.counters.transport_errors += 1;
                self.readouts.set_solver_status(STATUS_START_ERROR);
                tracing::warn!(
                    target: "solvecam::solve",
                    attempt = self.attempt,
                    error = %err,
                    "solve.error"
                );
                log_debug(&format!(
                    "solve attempt {} failed to start: {err}",
                    self.attempt
                ));
            }
        }
        true
    }

    fn poll_status_call(
        &mut self,
        mode: DisplayMode,
        base_url: &str,
        buster: &mut CacheBuster,
    ) -> bool {
        let Some(call) = self.status_call.as_mut() else {
            return false;
        };
        let result = match call.poll() {
            CallPoll::Pending => return false,
            CallPoll::Ready(result) => result,
        };
        self.status_call = None;

        match result {
            Ok(SolveResult::Solving { status }) => {
                self.readouts
                    .set_solver_status(format!("Solver status: {status}"));
            }
            Ok(SolveResult::Solved(solution)) => {
                self.finish_attempt();
                self.counters.solved += 1;
                self.readouts.set_solver_status(STATUS_SOLVED);
                self.readouts.show_solution(&solution, base_url, buster);
                tracing::info!(
                    target: "solvecam::solve",
                    attempt = self.attempt,
                    outcome = "solved",
                    ra = %solution.ra,
                    dec = %solution.dec,
                    "solve.terminal"
                );
                self.queue_restart(mode);
            }
            Ok(SolveResult::Failed { image_url }) => {
                self.finish_attempt();
                self.counters.failed += 1;
                self.readouts.set_solver_status(STATUS_FAILED);
                self.readouts
                    .show_failure(image_url.as_deref(), base_url, buster);
                tracing::info!(
                    target: "solvecam::solve",
                    attempt = self.attempt,
                    outcome = "failed",
                    "solve.terminal"
                );
                self.queue_restart(mode);
            }
            Err(err) => {
                // Not a failed solve: stop here and leave re-triggering to the operator.
                self.finish_attempt();
                self.counters.transport_errors += 1;
                self.readouts.set_solver_status(STATUS_POLL_ERROR);
                tracing::warn!(
                    target: "solvecam::solve",
                    attempt = self.attempt,
                    error = %err,
                    "solve.error"
                );
                log_debug(&format!(
                    "solve attempt {} status check failed: {err}",
                    self.attempt
                ));
            }
        }
        true
    }

    fn fire_status_check(&mut self, now: Instant, dispatcher: &Dispatcher) {
        if self.status_call.is_some() {
            return;
        }
        let Some(poll) = self.poll.as_mut() else {
            return;
        };
        if poll.fire_if_due(now) {
            self.status_call = Some(dispatcher.solve_status());
        }
    }

    /// Re-triggering happens on the next tick, never from inside the handler.
    fn queue_restart(&mut self, mode: DisplayMode) {
        if mode == DisplayMode::Solved {
            self.restart_pending = true;
        }
    }

    /// Cancel the poll schedule first, then drop whatever the attempt still owns.
    fn finish_attempt(&mut self) {
        if let Some(poll) = self.poll.take() {
            log_debug(&format!(
                "solve attempt {} poll cancelled after {:?} cadence",
                poll.attempt(),
                poll.interval()
            ));
            poll.cancel();
            self.counters.polls_cancelled += 1;
        }
        self.status_call = None;
        self.begin_call = None;
        self.phase = SolvePhase::Idle;
    }
}
