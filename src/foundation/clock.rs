//! Host-driven time.
//!
//! Nothing in the crate reads the wall clock. The host passes a monotonic `Duration` into every
//! `tick`, so tests and the simulation harness can drive the exact same code with a
//! [`DeterministicClock`] and a fixed refresh interval.

use std::time::Duration;

/// Nominal display refresh interval (60 Hz).
pub const DEFAULT_REFRESH: Duration = Duration::from_micros(16_667);

/// Manually advanced monotonic clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Current monotonic time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

/// Fake display-refresh source: yields successive tick instants `interval` apart.
#[derive(Clone, Debug)]
pub struct RefreshTicker {
    clock: DeterministicClock,
    interval: Duration,
}

impl RefreshTicker {
    /// Ticker starting at `0` with the given refresh interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            clock: DeterministicClock::new(),
            interval,
        }
    }

    /// Time of the most recent tick.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Refresh interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Advance one refresh and return the new tick time.
    pub fn next_tick(&mut self) -> Duration {
        self.clock.advance(self.interval);
        self.clock.now()
    }

    /// Jump the clock without producing ticks, as a backgrounded tab does.
    pub fn stall(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }
}

impl Default for RefreshTicker {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH)
    }
}

/// One-shot timer evaluated against host time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Duration>,
}

impl Deadline {
    /// A disarmed deadline.
    pub const fn idle() -> Self {
        Self { at: None }
    }

    /// Arm to fire `after` from `now`, replacing any earlier arming.
    pub fn arm(&mut self, now: Duration, after: Duration) {
        self.at = Some(now.saturating_add(after));
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.at = None;
    }

    /// `true` while armed.
    pub fn is_armed(&self) -> bool {
        self.at.is_some()
    }

    /// Instant the deadline fires at, if armed.
    pub fn at(&self) -> Option<Duration> {
        self.at
    }

    /// `true` if armed and `now` has reached the deadline. Does not disarm.
    pub fn is_due(&self, now: Duration) -> bool {
        self.at.is_some_and(|at| now >= at)
    }

    /// Fire once: returns `true` and disarms if the deadline has passed.
    pub fn take_due(&mut self, now: Duration) -> bool {
        match self.at {
            Some(at) if now >= at => {
                self.at = None;
                true
            }
            _ => false,
        }
    }
}
