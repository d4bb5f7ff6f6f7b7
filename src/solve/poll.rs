use std::time::{Duration, Instant};

/// Fixed-cadence schedule driven by the control loop's clock. Missed ticks are
/// skipped rather than replayed in a burst.
#[derive(Debug, Clone)]
pub struct RepeatingTask {
    interval: Duration,
    next_due: Instant,
    active: bool,
}

impl RepeatingTask {
    /// First fire one interval from `now`.
    pub fn start(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now + interval,
            active: true,
        }
    }

    /// First fire on the next check.
    pub fn immediate(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            next_due: now,
            active: true,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns true at most once per interval while active.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        if !self.active || now < self.next_due {
            return false;
        }
        self.next_due += self.interval;
        if self.next_due <= now {
            self.next_due = now + self.interval;
        }
        true
    }

    /// Make the next check fire regardless of the cadence.
    pub fn fire_now(&mut self, now: Instant) {
        self.next_due = now;
    }

    pub fn cancel(&mut self) {
        self.active = false;
    }
}

/// Exclusive handle to the status-check schedule of one solve attempt. It is not
/// `Clone`, so the orchestrator holding it is the only thing that can fire it.
#[derive(Debug)]
pub struct PollHandle {
    attempt: u64,
    task: RepeatingTask,
}

impl PollHandle {
    pub(super) fn new(attempt: u64, interval: Duration, now: Instant) -> Self {
        Self {
            attempt,
            task: RepeatingTask::start(interval, now),
        }
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn interval(&self) -> Duration {
        self.task.interval()
    }

    pub(super) fn fire_if_due(&mut self, now: Instant) -> bool {
        self.task.fire_if_due(now)
    }

    /// Consume the handle; nothing can fire it afterwards.
    pub(super) fn cancel(mut self) {
        self.task.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_waits_one_interval() {
        let now = Instant::now();
        let mut task = RepeatingTask::start(Duration::from_millis(100), now);
        assert!(!task.fire_if_due(now));
        assert!(!task.fire_if_due(now + Duration::from_millis(99)));
        assert!(task.fire_if_due(now + Duration::from_millis(100)));
        assert!(!task.fire_if_due(now + Duration::from_millis(150)));
        assert!(task.fire_if_due(now + Duration::from_millis(200)));
    }

    #[test]
    fn missed_ticks_are_skipped() {
        let now = Instant::now();
        let mut task = RepeatingTask::immediate(Duration::from_millis(100), now);
        assert!(task.fire_if_due(now + Duration::from_millis(950)));
        assert!(!task.fire_if_due(now + Duration::from_millis(960)));
        assert!(task.fire_if_due(now + Duration::from_millis(1050)));
    }

    #[test]
    fn cancelled_task_never_fires() {
        let now = Instant::now();
        let mut task = RepeatingTask::immediate(Duration::from_millis(10), now);
        task.cancel();
        assert!(!task.is_active());
        assert!(!task.fire_if_due(now + Duration::from_secs(5)));
    }

    #[test]
    fn fire_now_overrides_cadence() {
        let now = Instant::now();
        let mut task = RepeatingTask::start(Duration::from_secs(10), now);
        task.fire_now(now);
        assert!(task.fire_if_due(now));
        assert!(!task.fire_if_due(now + Duration::from_secs(1)));
    }
}
