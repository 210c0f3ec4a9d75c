//! Asset readiness aggregation and background-resume detection.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::LifecycleConfig;
use crate::foundation::clock::Deadline;
use crate::foundation::core::Track;

/// Transition reported by the gate. Each fires at most once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateSignal {
    /// Both videos can play (or their fallback elapsed). The transport may be primed.
    VideosReady,
    /// Videos, images and the window load are all settled.
    Ready,
}

/// Aggregates load signals into one monotonic `Ready`.
///
/// Failures count the same as successes; a broken asset must never keep the page blocked.
/// Two fallback timers bound the wait: an optional one for the videos and one for everything.
#[derive(Clone, Debug)]
pub struct ReadinessGate {
    cfg: LifecycleConfig,
    videos: [bool; 2],
    videos_ready: bool,
    images_expected: u32,
    images_settled: u32,
    window_loaded: bool,
    ready: bool,
    video_fallback: Deadline,
    ready_fallback: Deadline,
}

impl ReadinessGate {
    /// Gate waiting on two videos, `image_count` images and the window load.
    pub fn new(cfg: LifecycleConfig, image_count: u32) -> Self {
        Self {
            cfg,
            videos: [false, false],
            videos_ready: false,
            images_expected: image_count,
            images_settled: 0,
            window_loaded: false,
            ready: false,
            video_fallback: Deadline::idle(),
            ready_fallback: Deadline::idle(),
        }
    }

    /// Arm the fallback timers. Call once when loading starts.
    pub fn start(&mut self, now: Duration) {
        if let Some(ms) = self.cfg.video_fallback_ms {
            self.video_fallback.arm(now, Duration::from_millis(ms));
        }
        self.ready_fallback
            .arm(now, Duration::from_millis(self.cfg.ready_fallback_ms));
    }

    /// `true` once `Ready` has fired.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// `true` once `VideosReady` has fired.
    pub fn videos_ready(&self) -> bool {
        self.videos_ready
    }

    /// `(settled, expected)` image counts.
    pub fn image_progress(&self) -> (u32, u32) {
        (self.images_settled, self.images_expected)
    }

    /// The video for `track` can play through.
    pub fn on_video_ready(&mut self, track: Track, out: &mut Vec<GateSignal>) {
        self.videos[track.slot()] = true;
        self.evaluate(out);
    }

    /// One content image finished loading, successfully or not.
    pub fn on_image_settled(&mut self, loaded: bool, out: &mut Vec<GateSignal>) {
        if !loaded {
            debug!("image failed to load; counting as settled");
        }
        self.images_settled = self.images_settled.saturating_add(1);
        self.evaluate(out);
    }

    /// The window `load` event fired.
    pub fn on_window_load(&mut self, out: &mut Vec<GateSignal>) {
        self.window_loaded = true;
        self.evaluate(out);
    }

    /// Fire due fallback timers.
    pub fn tick(&mut self, now: Duration, out: &mut Vec<GateSignal>) {
        if self.video_fallback.take_due(now) && !self.videos_ready {
            warn!("videos did not report ready in time; proceeding");
            self.videos = [true, true];
        }
        if self.ready_fallback.take_due(now) && !self.ready {
            warn!(
                videos = ?self.videos,
                images = self.images_settled,
                expected = self.images_expected,
                window = self.window_loaded,
                "assets did not settle in time; forcing ready"
            );
            self.videos = [true, true];
            self.images_settled = self.images_settled.max(self.images_expected);
            self.window_loaded = true;
        }
        self.evaluate(out);
    }

    /// Page visibility changed. Returns `true` when a visible page should re-stabilize.
    pub fn on_visibility_change(&self, visible: bool) -> bool {
        visible && self.ready
    }

    /// `pageshow` fired. `persisted` is set for back/forward cache restores.
    pub fn on_page_show(&self, persisted: bool) -> bool {
        self.ready && (persisted || self.cfg.resettle_on_every_pageshow)
    }

    fn evaluate(&mut self, out: &mut Vec<GateSignal>) {
        if !self.videos_ready && self.videos.iter().all(|&v| v) {
            self.videos_ready = true;
            self.video_fallback.cancel();
            info!("both videos ready");
            out.push(GateSignal::VideosReady);
        }
        if !self.ready
            && self.videos_ready
            && self.window_loaded
            && self.images_settled >= self.images_expected
        {
            self.ready = true;
            self.ready_fallback.cancel();
            info!("app ready");
            out.push(GateSignal::Ready);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lifecycle/readiness.rs"]
mod tests;
