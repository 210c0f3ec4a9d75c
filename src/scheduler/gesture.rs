//! Raw input to navigation intents.
//!
//! Nothing here knows about the lock or the transport. Each tracker turns a device-specific
//! stream into at most one [`Intent`] per gesture.

use std::time::Duration;

/// A navigation request before it is resolved against the current section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// One section down.
    Next,
    /// One section up.
    Previous,
    /// Section 1.
    First,
    /// Last section.
    Last,
    /// An exact section, possibly several away.
    Goto(u32),
}

impl Intent {
    /// Target section, or `None` when the intent points outside `1..=section_count`.
    ///
    /// Never wraps: `Next` on the last section and `Previous` on the first resolve to `None`.
    pub fn resolve(self, current: u32, section_count: u32) -> Option<u32> {
        let target = match self {
            Self::Next => current.checked_add(1)?,
            Self::Previous => current.checked_sub(1)?,
            Self::First => 1,
            Self::Last => section_count,
            Self::Goto(s) => s,
        };
        (1..=section_count).contains(&target).then_some(target)
    }
}

/// Keys that navigate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NavKey {
    /// `ArrowDown`.
    ArrowDown,
    /// `ArrowUp`.
    ArrowUp,
    /// `PageDown`.
    PageDown,
    /// `PageUp`.
    PageUp,
    /// `Home`.
    Home,
    /// `End`.
    End,
}

impl NavKey {
    /// Parse a DOM `KeyboardEvent.key` value. Other keys are not navigation keys.
    pub fn from_key_name(name: &str) -> Option<Self> {
        Some(match name {
            "ArrowDown" => Self::ArrowDown,
            "ArrowUp" => Self::ArrowUp,
            "PageDown" => Self::PageDown,
            "PageUp" => Self::PageUp,
            "Home" => Self::Home,
            "End" => Self::End,
            _ => return None,
        })
    }

    /// Intent this key stands for.
    pub fn intent(self) -> Intent {
        match self {
            Self::ArrowDown | Self::PageDown => Intent::Next,
            Self::ArrowUp | Self::PageUp => Intent::Previous,
            Self::Home => Intent::First,
            Self::End => Intent::Last,
        }
    }
}

/// Accumulates wheel `deltaY` until it crosses the threshold in one direction.
///
/// Small trackpad jitter never adds up to a step: accumulation restarts after a quiet period
/// and whenever the direction flips.
#[derive(Clone, Debug)]
pub struct WheelAccumulator {
    threshold: f64,
    idle_reset: Duration,
    accumulated: f64,
    last: Option<Duration>,
}

impl WheelAccumulator {
    /// Accumulator emitting a step once `|sum| > threshold`.
    pub fn new(threshold: f64, idle_reset: Duration) -> Self {
        Self {
            threshold,
            idle_reset,
            accumulated: 0.0,
            last: None,
        }
    }

    /// Feed one wheel event.
    pub fn push(&mut self, now: Duration, delta_y: f64) -> Option<Intent> {
        if !delta_y.is_finite() {
            return None;
        }
        let quiet = self
            .last
            .is_some_and(|last| now.saturating_sub(last) > self.idle_reset);
        let flipped = self.accumulated * delta_y < 0.0;
        if quiet || flipped {
            self.accumulated = 0.0;
        }
        self.last = Some(now);
        self.accumulated += delta_y;

        let intent = if self.accumulated > self.threshold {
            Intent::Next
        } else if self.accumulated < -self.threshold {
            Intent::Previous
        } else {
            return None;
        };
        self.accumulated = 0.0;
        Some(intent)
    }

    /// Drop any partial accumulation.
    pub fn reset(&mut self) {
        self.accumulated = 0.0;
        self.last = None;
    }

    /// Current partial sum.
    pub fn accumulated(&self) -> f64 {
        self.accumulated
    }
}

/// Vertical swipe detector.
#[derive(Clone, Debug)]
pub struct TouchTracker {
    threshold_px: f64,
    start_y: Option<f64>,
}

impl TouchTracker {
    /// Tracker requiring a swipe longer than `threshold_px`.
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px,
            start_y: None,
        }
    }

    /// Record where a touch started.
    pub fn start(&mut self, y: f64) {
        self.start_y = Some(y);
    }

    /// Finish the touch. Swiping up (finger moving toward the top) is [`Intent::Next`].
    pub fn end(&mut self, y: f64) -> Option<Intent> {
        let start = self.start_y.take()?;
        let delta = start - y;
        if delta > self.threshold_px {
            Some(Intent::Next)
        } else if delta < -self.threshold_px {
            Some(Intent::Previous)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/gesture.rs"]
mod tests;
