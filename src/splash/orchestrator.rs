use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::SplashConfig;
use crate::events::{Event, Outbox, SplashCue};
use crate::foundation::clock::Deadline;
use crate::gif::patch::{self, PatchedGif};

/// Inner window size sampled by the host each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels.
    pub width: u32,
    /// Height in CSS pixels.
    pub height: u32,
}

/// Coarse position in the splash sequence, for the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplashStage {
    /// Not started.
    Idle,
    /// Waiting for the page to become visible.
    AwaitingVisibility,
    /// Waiting for the viewport size to settle.
    StabilizingViewport,
    /// Waiting for the logo and the signature.
    LoadingAssets,
    /// Logo shown.
    ShowingLogo,
    /// Signature animation playing.
    ShowingSignature,
    /// Minimum shimmer dwell.
    ShimmerHold,
    /// Sequence finished; waiting for the app.
    AwaitingReady,
    /// Content fading out.
    FadingOut,
    /// Site fading in.
    HandingOff,
    /// Asset failure; hiding after a delay.
    Failed,
    /// Skipped; waiting for the app.
    Skipped,
    /// Complete.
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Step {
    Idle,
    AwaitingVisibility,
    Stabilizing {
        last: Viewport,
        stable: u32,
        total: u32,
    },
    LoadingAssets,
    ShowingLogo(Deadline),
    SignatureBarrier {
        ticks_left: u32,
    },
    ShowingSignature(Deadline),
    ShimmerHold(Deadline),
    AwaitingReady,
    FadingOut(Deadline),
    HandingOff(Deadline),
    Failed(Deadline),
    Skipped,
    Done,
}

/// Splash sequence driver.
///
/// `logo -> signature -> shimmer -> (app ready) -> fade out -> site in -> done`. The minimum
/// sequence and app readiness are joined with an order-independent AND; the app-ready wait
/// is bounded by its own timeout.
#[derive(Debug)]
pub struct SplashOrchestrator {
    cfg: SplashConfig,
    step: Step,
    visible: bool,
    viewport: Viewport,
    logo: Option<bool>,
    signature: Option<PatchedGif>,
    signature_decoded: Option<bool>,
    app_ready: bool,
    app_ready_timeout: Deadline,
}

impl SplashOrchestrator {
    /// Orchestrator for `cfg`; nothing happens until [`Self::start`].
    pub fn new(cfg: SplashConfig) -> Self {
        Self {
            cfg,
            step: Step::Idle,
            visible: true,
            viewport: Viewport::default(),
            logo: None,
            signature: None,
            signature_decoded: None,
            app_ready: false,
            app_ready_timeout: Deadline::idle(),
        }
    }

    /// Begin. With `skip`, or when the splash is disabled, nothing is shown and the reveal
    /// events fire as soon as the app is ready.
    pub fn start(&mut self, now: Duration, skip: bool, out: &mut Outbox) {
        if self.step != Step::Idle {
            return;
        }
        self.app_ready_timeout
            .arm(now, Duration::from_millis(self.cfg.app_ready_timeout_ms));
        if skip || !self.cfg.enabled {
            info!(skip, enabled = self.cfg.enabled, "splash skipped");
            out.emit(Event::Splash {
                cue: SplashCue::SiteVisible,
            });
            out.emit(Event::Splash {
                cue: SplashCue::OverlayRemoved,
            });
            self.step = Step::Skipped;
            self.advance(now, out);
            return;
        }
        self.step = Step::AwaitingVisibility;
        self.advance(now, out);
    }

    /// Where the sequence is.
    pub fn stage(&self) -> SplashStage {
        match self.step {
            Step::Idle => SplashStage::Idle,
            Step::AwaitingVisibility => SplashStage::AwaitingVisibility,
            Step::Stabilizing { .. } => SplashStage::StabilizingViewport,
            Step::LoadingAssets => SplashStage::LoadingAssets,
            Step::ShowingLogo(_) => SplashStage::ShowingLogo,
            Step::SignatureBarrier { .. } | Step::ShowingSignature(_) => {
                SplashStage::ShowingSignature
            }
            Step::ShimmerHold(_) => SplashStage::ShimmerHold,
            Step::AwaitingReady => SplashStage::AwaitingReady,
            Step::FadingOut(_) => SplashStage::FadingOut,
            Step::HandingOff(_) => SplashStage::HandingOff,
            Step::Failed(_) => SplashStage::Failed,
            Step::Skipped => SplashStage::Skipped,
            Step::Done => SplashStage::Done,
        }
    }

    /// `true` once `splash-complete` has fired.
    pub fn is_done(&self) -> bool {
        self.step == Step::Done
    }

    /// Patched signature, once fetched.
    pub fn signature(&self) -> Option<&PatchedGif> {
        self.signature.as_ref()
    }

    /// Page visibility changed.
    pub fn on_visibility_change(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Latest viewport size.
    pub fn on_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Logo image settled.
    pub fn on_logo_loaded(&mut self, ok: bool) {
        if !ok {
            warn!("splash logo failed to load");
        }
        self.logo = Some(ok);
    }

    /// Signature GIF fetched. A failed fetch keeps the original asset with the fallback
    /// duration. Returns the bytes the host should display.
    pub fn on_signature_fetched(&mut self, fetched: Result<Vec<u8>, String>) -> &PatchedGif {
        let gif = match fetched {
            Ok(bytes) => patch::patch(&bytes),
            Err(e) => {
                warn!(error = %e, "signature fetch failed; using original asset");
                PatchedGif::fallback(Vec::new())
            }
        };
        debug!(duration_ms = gif.duration_ms, patched = gif.patched, "signature ready");
        self.signature.insert(gif)
    }

    /// The host finished decoding the signature image.
    pub fn on_signature_decoded(&mut self, ok: bool) {
        if !ok {
            warn!("splash signature failed to decode");
        }
        self.signature_decoded = Some(ok);
    }

    /// The readiness gate fired `app-ready`.
    pub fn on_app_ready(&mut self) {
        self.app_ready = true;
        self.app_ready_timeout.cancel();
    }

    /// Advance by one display refresh.
    pub fn tick(&mut self, now: Duration, out: &mut Outbox) {
        if self.app_ready_timeout.take_due(now) && !self.app_ready {
            warn!("app not ready in time; revealing anyway");
            self.app_ready = true;
        }
        if let Step::Stabilizing {
            last,
            stable,
            total,
        } = self.step
        {
            let total = total + 1;
            let (last, stable) = if self.viewport == last {
                (last, stable + 1)
            } else {
                (self.viewport, 0)
            };
            self.step = if stable >= self.cfg.stable_viewport_ticks
                || total >= self.cfg.max_viewport_ticks
            {
                debug!(stable, total, "viewport settled");
                Step::LoadingAssets
            } else {
                Step::Stabilizing {
                    last,
                    stable,
                    total,
                }
            };
        }
        if let Step::SignatureBarrier { ticks_left } = self.step {
            self.step = if ticks_left > 1 {
                Step::SignatureBarrier {
                    ticks_left: ticks_left - 1,
                }
            } else {
                let duration_ms = self
                    .signature
                    .as_ref()
                    .map_or(patch::FALLBACK_DURATION_MS, |g| g.duration_ms);
                let hold_ms = duration_ms.saturating_add(self.cfg.signature_safety_ms);
                Step::ShowingSignature(Self::timer(now, hold_ms))
            };
        }
        self.advance(now, out);
    }

    fn timer(now: Duration, ms: u64) -> Deadline {
        let mut d = Deadline::idle();
        d.arm(now, Duration::from_millis(ms));
        d
    }

    fn asset_failed(&self) -> bool {
        self.logo == Some(false) || self.signature_decoded == Some(false)
    }

    fn assets_loaded(&self) -> bool {
        self.logo == Some(true) && self.signature.is_some() && self.signature_decoded == Some(true)
    }

    /// Take every transition that is already possible at `now`.
    fn advance(&mut self, now: Duration, out: &mut Outbox) {
        loop {
            let step = self.step;
            let next = match step {
                Step::AwaitingVisibility if self.visible => Step::Stabilizing {
                    last: self.viewport,
                    stable: 0,
                    total: 0,
                },
                Step::AwaitingVisibility | Step::LoadingAssets if self.asset_failed() => {
                    warn!(
                        after_ms = self.cfg.failure_reveal_ms,
                        "splash asset failed; hiding"
                    );
                    Step::Failed(Self::timer(now, self.cfg.failure_reveal_ms))
                }
                Step::LoadingAssets if self.assets_loaded() => {
                    info!("splash logo visible");
                    out.emit(Event::Splash {
                        cue: SplashCue::LogoVisible,
                    });
                    Step::ShowingLogo(Self::timer(now, self.cfg.signature_delay_ms))
                }
                Step::ShowingLogo(d) if d.is_due(now) => {
                    out.emit(Event::Splash {
                        cue: SplashCue::SignatureVisible,
                    });
                    Step::SignatureBarrier { ticks_left: 2 }
                }
                Step::ShowingSignature(d) if d.is_due(now) => {
                    info!("signature done; shimmer start");
                    out.emit(Event::Splash {
                        cue: SplashCue::ShimmerStarted,
                    });
                    Step::ShimmerHold(Self::timer(now, self.cfg.shimmer_hold_ms))
                }
                Step::ShimmerHold(d) if d.is_due(now) => Step::AwaitingReady,
                Step::AwaitingReady if self.app_ready => {
                    out.emit(Event::Splash {
                        cue: SplashCue::ShimmerStopped,
                    });
                    self.begin_reveal(now, out)
                }
                Step::Failed(d) if d.is_due(now) => self.begin_reveal(now, out),
                Step::FadingOut(d) if d.is_due(now) => {
                    out.emit(Event::Splash {
                        cue: SplashCue::SiteVisible,
                    });
                    out.emit(Event::SiteReveal);
                    Step::HandingOff(Self::timer(now, self.cfg.handoff_ms))
                }
                Step::HandingOff(d) if d.is_due(now) => {
                    out.emit(Event::Splash {
                        cue: SplashCue::OverlayRemoved,
                    });
                    info!("splash complete");
                    out.emit(Event::SplashComplete);
                    Step::Done
                }
                Step::Skipped if self.app_ready => {
                    out.emit(Event::SiteReveal);
                    out.emit(Event::SplashComplete);
                    Step::Done
                }
                _ => return,
            };
            self.step = next;
        }
    }

    fn begin_reveal(&mut self, now: Duration, out: &mut Outbox) -> Step {
        debug!("splash hiding");
        out.emit(Event::Splash {
            cue: SplashCue::ContentFadeOut,
        });
        Step::FadingOut(Self::timer(now, self.cfg.fade_out_ms))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/splash/orchestrator.rs"]
mod tests;
