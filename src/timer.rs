// src/timer.rs
use std::time::{Duration, Instant};

/// Fixed-interval tick scheduler driven by the caller's clock.
///
/// At most one tick is due per poll; a late poll delays the following tick
/// instead of producing a burst.
#[derive(Debug, Clone)]
pub struct TickTimer {
    interval: Duration,
    next_due: Option<Instant>,
    stopped: bool,
}

impl TickTimer {
    pub fn new(interval: Duration) -> Self {
        Self { interval, next_due: None, stopped: false }
    }

    /// Returns true when a tick should run now. The first poll always fires.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.stopped {
            return false;
        }
        match self.next_due {
            Some(due) if now < due => false,
            _ => {
                self.next_due = Some(now + self.interval);
                true
            }
        }
    }

    /// Time left until the next tick, `None` once stopped.
    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        if self.stopped {
            return None;
        }
        Some(self.next_due.map_or(Duration::ZERO, |due| due.saturating_duration_since(now)))
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
