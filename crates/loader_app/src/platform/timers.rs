use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use loader_core::Timer;

/// Virtual-clock timer queue. Timers fire in deadline order, ties in scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    seq: u64,
    queue: BTreeMap<(Duration, u64), Timer>,
    armed: HashMap<Timer, (Duration, u64)>,
}

impl TimerQueue {
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Arms `timer` to fire `after` from now, replacing an earlier arming of the same timer.
    pub fn schedule(&mut self, timer: Timer, after: Duration) {
        self.cancel(timer);
        let key = (self.now + after, self.seq);
        self.seq += 1;
        self.queue.insert(key, timer);
        self.armed.insert(timer, key);
    }

    pub fn cancel(&mut self, timer: Timer) -> bool {
        match self.armed.remove(&timer) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pops the earliest timer due at or before `until`, moving the clock to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<Timer> {
        let (&key, _) = self.queue.iter().next()?;
        if key.0 > until {
            return None;
        }
        let timer = self.queue.remove(&key)?;
        self.armed.remove(&timer);
        self.set_now(key.0);
        Some(timer)
    }

    /// Pops the earliest timer regardless of its deadline.
    pub fn pop_next(&mut self) -> Option<Timer> {
        let until = self.next_due()?;
        self.pop_due(until)
    }

    /// Moves the clock forward to `to`; never backwards.
    pub fn advance_to(&mut self, to: Duration) {
        if to > self.now {
            self.set_now(to);
        }
    }

    fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
        loader_logging::set_clock_ms(u64::try_from(self.now.as_millis()).unwrap_or(u64::MAX));
    }
}
