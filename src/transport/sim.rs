//! In-memory video element for tests, the CLI simulator and debugging.
//!
//! A [`SimVideo`] is a cheap shared handle: mount one clone into the transport and keep another
//! to advance media time and inspect what the transport did.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::transport::handle::PlaybackHandle;

/// One control call received by a [`SimVideo`].
#[derive(Clone, Debug, PartialEq)]
pub enum SimCall {
    /// `seek(secs)`.
    Seek(f64),
    /// `set_playback_rate(rate)`.
    Rate(f64),
    /// `play()`.
    Play,
    /// `pause()`.
    Pause,
}

#[derive(Debug)]
struct SimState {
    position: f64,
    duration: f64,
    rate: f64,
    playing: bool,
    seek_latency: Duration,
    seek_remaining: Option<Duration>,
    calls: Vec<SimCall>,
}

/// Simulated media element with configurable seek latency.
#[derive(Clone, Debug)]
pub struct SimVideo {
    state: Rc<RefCell<SimState>>,
}

impl SimVideo {
    /// Paused element of `duration_secs` at position 0 with instant seeks.
    pub fn new(duration_secs: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                position: 0.0,
                duration: duration_secs.max(0.0),
                rate: 1.0,
                playing: false,
                seek_latency: Duration::ZERO,
                seek_remaining: None,
                calls: Vec::new(),
            })),
        }
    }

    /// Make every seek take `latency` of media time to complete.
    pub fn with_seek_latency(self, latency: Duration) -> Self {
        self.state.borrow_mut().seek_latency = latency;
        self
    }

    /// Advance media time by `dt`: finish pending seeks, then move the playhead if playing.
    pub fn advance(&self, dt: Duration) {
        let mut s = self.state.borrow_mut();
        if let Some(rem) = s.seek_remaining {
            if rem > dt {
                s.seek_remaining = Some(rem - dt);
                return;
            }
            s.seek_remaining = None;
        }
        if s.playing {
            s.position += dt.as_secs_f64() * s.rate;
            if s.position >= s.duration {
                s.position = s.duration;
                s.playing = false;
            }
        }
    }

    /// Current playhead in seconds.
    pub fn position(&self) -> f64 {
        self.state.borrow().position
    }

    /// `true` while natively playing.
    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    /// Last playback rate set.
    pub fn rate(&self) -> f64 {
        self.state.borrow().rate
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<SimCall> {
        self.state.borrow().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Number of `seek` calls received so far.
    pub fn seek_count(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| matches!(c, SimCall::Seek(_)))
            .count()
    }
}

impl PlaybackHandle for SimVideo {
    fn current_time(&self) -> f64 {
        self.position()
    }

    fn seek(&mut self, secs: f64) {
        let mut s = self.state.borrow_mut();
        s.position = secs.clamp(0.0, s.duration);
        s.seek_remaining = (!s.seek_latency.is_zero()).then_some(s.seek_latency);
        s.calls.push(SimCall::Seek(secs));
    }

    fn is_seeking(&self) -> bool {
        self.state.borrow().seek_remaining.is_some()
    }

    fn set_playback_rate(&mut self, rate: f64) {
        let mut s = self.state.borrow_mut();
        s.rate = rate;
        s.calls.push(SimCall::Rate(rate));
    }

    fn play(&mut self) {
        let mut s = self.state.borrow_mut();
        s.playing = true;
        s.calls.push(SimCall::Play);
    }

    fn pause(&mut self) {
        let mut s = self.state.borrow_mut();
        s.playing = false;
        s.calls.push(SimCall::Pause);
    }
}
