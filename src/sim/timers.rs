//! Timer and scheduling primitives
//!
//! All timing compares absolute millisecond timestamps against thresholds
//! ("at least N ms since T"). Nothing accumulates per tick, so a run is
//! reproducible from its timestamp stream regardless of frame pacing.

use serde::{Deserialize, Serialize};

/// Monotonic milliseconds supplied by the host once per tick
pub type Millis = u64;

/// Milliseconds since `since` (zero if the clock is behind it)
#[inline]
pub fn elapsed(now: Millis, since: Millis) -> Millis {
    now.saturating_sub(since)
}

/// Whether at least `threshold` ms have passed since `since`
#[inline]
pub fn has_elapsed(now: Millis, since: Millis, threshold: Millis) -> bool {
    elapsed(now, since) >= threshold
}

/// A repeating period measured from the last time it fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub period: Millis,
    pub last: Millis,
}

impl Interval {
    pub fn new(period: Millis, now: Millis) -> Self {
        Self { period, last: now }
    }

    pub fn is_due(&self, now: Millis) -> bool {
        has_elapsed(now, self.last, self.period)
    }

    pub fn restart(&mut self, now: Millis) {
        self.last = now;
    }

    /// If due, restart from `now` and report true
    pub fn fire(&mut self, now: Millis) -> bool {
        if self.is_due(now) {
            self.restart(now);
            true
        } else {
            false
        }
    }
}

/// Pending enemy respawns, as absolute due times
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespawnQueue {
    due: Vec<Millis>,
}

impl RespawnQueue {
    pub fn schedule(&mut self, at: Millis) {
        self.due.push(at);
    }

    /// Remove every entry that is due and return how many there were
    pub fn take_due(&mut self, now: Millis) -> usize {
        let before = self.due.len();
        self.due.retain(|&at| now < at);
        before - self.due.len()
    }

    pub fn len(&self) -> usize {
        self.due.len()
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.due.iter().copied().min()
    }

    pub fn clear(&mut self) {
        self.due.clear();
    }
}

/// A "long line" at the cashier
///
/// Delivery goes through once the wait time has passed since the line
/// started, or once the come-back time is reached, whichever is first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWait {
    pub start_time: Millis,
    pub next_available_time: Millis,
}

impl DeliveryWait {
    pub fn begin(now: Millis, come_back_delay: Millis) -> Self {
        Self {
            start_time: now,
            next_available_time: now + come_back_delay,
        }
    }

    pub fn is_ready(&self, now: Millis, wait_time: Millis) -> bool {
        has_elapsed(now, self.start_time, wait_time) || now >= self.next_available_time
    }

    /// Milliseconds left before waiting in place completes the delivery
    pub fn remaining(&self, now: Millis, wait_time: Millis) -> Millis {
        wait_time.saturating_sub(elapsed(now, self.start_time))
    }

    /// Fraction of the in-place wait already served, in [0, 1]
    pub fn progress(&self, now: Millis, wait_time: Millis) -> f32 {
        if wait_time == 0 {
            return 1.0;
        }
        (elapsed(now, self.start_time) as f32 / wait_time as f32).min(1.0)
    }
}

/// Session-wide timers owned by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduler {
    pub chair_drop: Interval,
    pub boomerang_spawn: Interval,
    pub speed_boost_spawn: Interval,
    pub respawns: RespawnQueue,
    pub delivery_wait: Option<DeliveryWait>,
}

impl Scheduler {
    pub fn new(settings: &crate::Settings, now: Millis) -> Self {
        Self {
            chair_drop: Interval::new(settings.chair_drop_interval_ms, now),
            boomerang_spawn: Interval::new(settings.boomerang_spawn_interval_ms, now),
            speed_boost_spawn: Interval::new(settings.speed_boost_spawn_interval_ms, now),
            respawns: RespawnQueue::default(),
            delivery_wait: None,
        }
    }
}
