//! Events the experience exposes to the host.

use crate::foundation::core::Track;

/// Presentation cue emitted by the splash sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplashCue {
    /// Logo may be shown.
    LogoVisible,
    /// Signature animation may start; the patched GIF is ready.
    SignatureVisible,
    /// Shimmer loop starts.
    ShimmerStarted,
    /// Shimmer loop stops; the reveal is starting.
    ShimmerStopped,
    /// Splash content starts fading out.
    ContentFadeOut,
    /// Site layer becomes visible underneath the splash.
    SiteVisible,
    /// Splash overlay may be removed from the page.
    OverlayRemoved,
}

/// Something the host may react to. Drained from [`Outbox`] after each call into the experience.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Readiness gate satisfied. One-shot.
    AppReady,
    /// Video opacity may begin fading in. One-shot.
    SiteReveal,
    /// Playback and input may begin. One-shot.
    SplashComplete,
    /// Splash presentation step.
    Splash {
        /// Which step.
        cue: SplashCue,
    },
    /// A section move was accepted and the transport started on it.
    TransitionStarted {
        /// Track playing the move.
        track: Track,
        /// Section being left (0 for the intro).
        from: u32,
        /// Section being entered.
        to: u32,
    },
    /// The transport finished a move; `section` is now current.
    SectionChanged {
        /// New current section.
        section: u32,
    },
    /// Navigation input is accepted again.
    InputUnlocked,
    /// A stalled move was abandoned and the video frozen on `section`.
    Settled {
        /// Current section.
        section: u32,
        /// Track left visible.
        track: Track,
    },
}

impl Event {
    fn one_shot_slot(&self) -> Option<usize> {
        match self {
            Self::AppReady => Some(0),
            Self::SiteReveal => Some(1),
            Self::SplashComplete => Some(2),
            _ => None,
        }
    }
}

/// Ordered event queue that drops repeats of one-shot events.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    queue: Vec<Event>,
    fired: [bool; 3],
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event`. Returns `false` if it is a one-shot event that already fired.
    pub fn emit(&mut self, event: Event) -> bool {
        if let Some(slot) = event.one_shot_slot() {
            if self.fired[slot] {
                tracing::debug!(?event, "one-shot event already fired");
                return false;
            }
            self.fired[slot] = true;
        }
        self.queue.push(event);
        true
    }

    /// `true` if the one-shot `event` has been emitted. Always `false` for other events.
    pub fn has_fired(&self, event: Event) -> bool {
        event.one_shot_slot().is_some_and(|slot| self.fired[slot])
    }

    /// Take queued events, oldest first.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.queue)
    }

    /// Queued events not yet drained.
    pub fn pending(&self) -> &[Event] {
        &self.queue
    }
}
