//! Host readouts (CPU temperature and load) refreshed on their own slow cadence.

use std::time::{Duration, Instant};

use crate::backend::{CallPoll, Dispatcher, PendingCall, SystemStats};
use crate::log_debug;
use crate::solve::RepeatingTask;

pub struct SystemStatsPoller {
    task: RepeatingTask,
    call: Option<PendingCall<SystemStats>>,
    latest: Option<SystemStats>,
    failures: u64,
}

impl SystemStatsPoller {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            task: RepeatingTask::immediate(interval, now),
            call: None,
            latest: None,
            failures: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.task.interval()
    }

    pub fn latest(&self) -> Option<&SystemStats> {
        self.latest.as_ref()
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Collect the outstanding reading and fire the next one when due.
    pub fn tick(&mut self, now: Instant, dispatcher: &Dispatcher) -> bool {
        let changed = self.collect();
        if self.call.is_none() && self.task.fire_if_due(now) {
            self.call = Some(dispatcher.system_stats());
        }
        changed
    }

    fn collect(&mut self) -> bool {
        let Some(call) = self.call.as_mut() else {
            return false;
        };
        let result = match call.poll() {
            CallPoll::Pending => return false,
            CallPoll::Ready(result) => result,
        };
        self.call = None;
        match result {
            Ok(stats) => {
                let changed = self.latest.as_ref() != Some(&stats);
                self.latest = Some(stats);
                changed
            }
            Err(err) => {
                // Keep showing the last reading.
                self.failures += 1;
                log_debug(&format!("system stats fetch failed: {err}"));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::ScriptedBackend;
    use crate::backend::SolveBackend;
    use std::sync::Arc;

    #[test]
    fn polls_on_its_own_cadence() {
        let backend = ScriptedBackend::new();
        let dispatcher = Dispatcher::inline(backend as Arc<dyn SolveBackend>);
        let now = Instant::now();
        let mut poller = SystemStatsPoller::new(Duration::from_secs(5), now);

        assert!(!poller.tick(now, &dispatcher));
        assert!(poller.tick(now + Duration::from_millis(100), &dispatcher));
        let stats = poller.latest().expect("stats loaded");
        assert_eq!(stats.cpu_temp(), "48.2");
        assert_eq!(stats.cpu_load(), "0.35");

        // Same reading again: nothing to redraw.
        assert!(!poller.tick(now + Duration::from_secs(5), &dispatcher));
        assert!(!poller.tick(now + Duration::from_millis(5100), &dispatcher));
        assert_eq!(poller.failures(), 0);
    }
}
