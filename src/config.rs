//! Variant parameters for the experience.
//!
//! Pointer (desktop) and touch (mobile) devices share one implementation; they differ only in
//! the values here. Documents are JSON; every nested section falls back to the pointer defaults.

use std::time::Duration;

use crate::foundation::core::Fps;
use crate::foundation::error::{ScrubError, ScrubResult};
use crate::timing::table::SectionTimingTable;

/// Input device class, probed by the host once at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    #[default]
    Pointer,
    Touch,
}

/// How a transport advances a track through a segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// `play()` the handle and poll its position each tick.
    #[default]
    Native,
    /// Keep the handle paused and write an interpolated position every tick.
    Scrub,
}

/// Dual-video transport tuning.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub playback: PlaybackMode,
    /// A handle within this distance of the segment start skips the seek.
    pub seek_tolerance_secs: f64,
    /// Position at or beyond `end - end_tolerance` counts as arrived.
    pub end_tolerance_secs: f64,
    /// Segments longer than this (source seconds) play at `fast_rate`.
    pub fast_segment_secs: f64,
    pub fast_rate: f64,
    /// Paint barrier before a track swap becomes visible.
    pub swap_ticks: u32,
    /// Delay before the idle track is pre-positioned.
    pub prebuffer_delay_ms: u64,
    /// Give up waiting for a seek confirmation after this long.
    pub seek_timeout_ms: u64,
    /// Snap to the end if native playback runs this long past the expected wall time.
    pub overrun_grace_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackMode::Native,
            seek_tolerance_secs: 0.05,
            end_tolerance_secs: 0.02,
            fast_segment_secs: 2.0,
            fast_rate: 2.0,
            swap_ticks: 2,
            prebuffer_delay_ms: 100,
            seek_timeout_ms: 1_000,
            overrun_grace_ms: 1_500,
        }
    }
}

impl TransportConfig {
    pub fn prebuffer_delay(&self) -> Duration {
        Duration::from_millis(self.prebuffer_delay_ms)
    }

    pub fn seek_timeout(&self) -> Duration {
        Duration::from_millis(self.seek_timeout_ms)
    }

    pub fn overrun_grace(&self) -> Duration {
        Duration::from_millis(self.overrun_grace_ms)
    }
}

/// Gesture thresholds and scheduler timing.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Accumulated wheel `deltaY` needed for one section step.
    pub wheel_threshold: f64,
    /// Wheel accumulation restarts after this much quiet time.
    pub wheel_idle_reset_ms: u64,
    /// Vertical swipe distance (px) needed for one section step.
    pub touch_threshold_px: f64,
    /// Extra hold after a transition completes before input is accepted again.
    pub settle_delay_ms: u64,
    /// Intro playback waits for an explicit tap after `splash-complete`.
    pub tap_to_start: bool,
    /// The scroll hint reappears after this much time without navigation input.
    pub hint_idle_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            wheel_threshold: 20.0,
            wheel_idle_reset_ms: 250,
            touch_threshold_px: 50.0,
            settle_delay_ms: 500,
            tap_to_start: false,
            hint_idle_ms: 9_000,
        }
    }
}

impl GestureConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn wheel_idle_reset(&self) -> Duration {
        Duration::from_millis(self.wheel_idle_reset_ms)
    }

    pub fn hint_idle(&self) -> Duration {
        Duration::from_millis(self.hint_idle_ms)
    }
}

/// Readiness aggregation and background-recovery settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Declare both videos loaded after this long, if set.
    pub video_fallback_ms: Option<u64>,
    /// Declare the whole gate ready after this long.
    pub ready_fallback_ms: u64,
    /// Re-settle on every `pageshow`, not only on back/forward-cache restores.
    pub resettle_on_every_pageshow: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            video_fallback_ms: None,
            ready_fallback_ms: 10_000,
            resettle_on_every_pageshow: false,
        }
    }
}

/// Splash sequence timing.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SplashConfig {
    /// Run the splash at all; when `false` the reveal events fire as soon as the app is ready.
    pub enabled: bool,
    /// Skip the splash when returning from a project page after a completed splash.
    pub skip_when_returning: bool,
    /// Consecutive unchanged viewport samples that count as stable.
    pub stable_viewport_ticks: u32,
    /// Upper bound on the viewport stability wait, in ticks.
    pub max_viewport_ticks: u32,
    pub signature_delay_ms: u64,
    /// Added to the signature animation's own duration.
    pub signature_safety_ms: u64,
    /// Minimum shimmer dwell before the reveal may start.
    pub shimmer_hold_ms: u64,
    /// Content fade-out before the site is shown.
    pub fade_out_ms: u64,
    pub handoff_ms: u64,
    /// Proceed without the app-ready signal after this long.
    pub app_ready_timeout_ms: u64,
    /// Hide the splash this long after an asset failure.
    pub failure_reveal_ms: u64,
}

impl Default for SplashConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_when_returning: true,
            stable_viewport_ticks: 3,
            max_viewport_ticks: 30,
            signature_delay_ms: 100,
            signature_safety_ms: 100,
            shimmer_hold_ms: 2_200,
            fade_out_ms: 500,
            handoff_ms: 500,
            app_ready_timeout_ms: 15_000,
            failure_reveal_ms: 2_000,
        }
    }
}

/// Complete parameter set for one device variant.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExperienceConfig {
    #[serde(default)]
    pub device: DeviceClass,
    pub fps: Fps,
    pub total_frames: u64,
    /// Forward freeze frame of each section, in order.
    pub freeze_frames: Vec<u64>,
    /// Content images that must settle before the gate is ready.
    #[serde(default)]
    pub image_count: u32,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub gestures: GestureConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub splash: SplashConfig,
}

impl ExperienceConfig {
    pub fn for_device(device: DeviceClass) -> Self {
        match device {
            DeviceClass::Pointer => Self::pointer(),
            DeviceClass::Touch => Self::touch(),
        }
    }

    /// Desktop preset: native playback, 24 fps, 240 frames, four sections.
    pub fn pointer() -> Self {
        Self {
            device: DeviceClass::Pointer,
            fps: Fps { num: 24, den: 1 },
            total_frames: 240,
            freeze_frames: vec![24, 55, 168, 240],
            image_count: 4,
            transport: TransportConfig::default(),
            gestures: GestureConfig::default(),
            lifecycle: LifecycleConfig::default(),
            splash: SplashConfig::default(),
        }
    }

    /// Mobile preset: interpolated playback, looser seek tolerance, tap-to-start.
    pub fn touch() -> Self {
        Self {
            device: DeviceClass::Touch,
            fps: Fps { num: 24, den: 1 },
            total_frames: 240,
            freeze_frames: vec![24, 56, 168, 240],
            image_count: 4,
            transport: TransportConfig {
                playback: PlaybackMode::Scrub,
                seek_tolerance_secs: 0.1,
                ..TransportConfig::default()
            },
            gestures: GestureConfig {
                settle_delay_ms: 400,
                tap_to_start: true,
                ..GestureConfig::default()
            },
            lifecycle: LifecycleConfig {
                video_fallback_ms: Some(4_000),
                resettle_on_every_pageshow: true,
                ..LifecycleConfig::default()
            },
            splash: SplashConfig {
                skip_when_returning: false,
                ..SplashConfig::default()
            },
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(s: &str) -> ScrubResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> ScrubResult<()> {
        Fps::new(self.fps.num, self.fps.den)
            .map_err(|e| ScrubError::config(format!("fps: {e}")))?;
        if self.total_frames == 0 {
            return Err(ScrubError::config("total_frames must be > 0"));
        }
        if self.freeze_frames.is_empty() {
            return Err(ScrubError::config("freeze_frames must list at least one section"));
        }
        for w in self.freeze_frames.windows(2) {
            if w[1] <= w[0] {
                return Err(ScrubError::config(format!(
                    "freeze_frames must be strictly increasing ({} then {})",
                    w[0], w[1]
                )));
            }
        }
        if self.freeze_frames.iter().any(|&f| f > self.total_frames) {
            return Err(ScrubError::config("freeze frame beyond total_frames"));
        }

        let t = &self.transport;
        for (name, v) in [
            ("seek_tolerance_secs", t.seek_tolerance_secs),
            ("end_tolerance_secs", t.end_tolerance_secs),
            ("fast_rate", t.fast_rate),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ScrubError::config(format!("{name} must be finite and > 0")));
            }
        }
        if !self.gestures.wheel_threshold.is_finite() || self.gestures.wheel_threshold <= 0.0 {
            return Err(ScrubError::config("wheel_threshold must be finite and > 0"));
        }
        if !self.gestures.touch_threshold_px.is_finite() || self.gestures.touch_threshold_px <= 0.0
        {
            return Err(ScrubError::config("touch_threshold_px must be finite and > 0"));
        }
        Ok(())
    }

    /// Timing table described by this config.
    pub fn timing_table(&self) -> ScrubResult<SectionTimingTable> {
        SectionTimingTable::from_freeze_frames(self.fps, self.total_frames, &self.freeze_frames)
    }
}
