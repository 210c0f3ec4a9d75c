use std::time::Duration;

use tracing::debug;

use crate::config::GestureConfig;
use crate::events::{Event, Outbox};
use crate::foundation::clock::Deadline;
use crate::foundation::core::Track;
use crate::scheduler::gesture::{Intent, NavKey, TouchTracker, WheelAccumulator};
use crate::transport::dual::DualTransport;
use crate::transport::segment::SegmentPlan;

/// What the host should do with the raw input event it just forwarded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputOutcome {
    /// A move started.
    Navigated(SegmentPlan),
    /// Consumed without moving; the host should prevent native scrolling.
    Suppressed,
    /// Not ours; let the platform handle it.
    Ignored,
}

impl InputOutcome {
    /// `true` when the host should call `preventDefault` on the event.
    pub fn prevent_default(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Show/hide flags for one content panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PanelState {
    /// The panel's section is current and content is shown.
    pub active: bool,
    /// The panel is animating out during a move away from its section.
    pub exiting: bool,
}

/// Navigation scheduler: owns the current section and the transition lock.
///
/// Idle accepts input; Transitioning drops it. A move holds the lock from the moment the
/// transport accepts it until `settle_delay` after the transport reports completion. Requests
/// arriving while locked are dropped, never queued.
#[derive(Debug)]
pub struct Navigator {
    cfg: GestureConfig,
    section_count: u32,
    current: u32,
    pending: Option<u32>,
    locked: bool,
    started: bool,
    intro_done: bool,
    show_content: bool,
    exiting: Option<u32>,
    overlay_open: bool,
    unlock: Deadline,
    wheel: WheelAccumulator,
    touch: TouchTracker,
    hint_visible: bool,
    hint_reshow: Deadline,
}

impl Navigator {
    /// Scheduler positioned on section 1, locked until [`Self::begin_intro`].
    pub fn new(cfg: GestureConfig, section_count: u32) -> Self {
        let wheel = WheelAccumulator::new(cfg.wheel_threshold, cfg.wheel_idle_reset());
        let touch = TouchTracker::new(cfg.touch_threshold_px);
        Self {
            cfg,
            section_count,
            current: 1,
            pending: None,
            locked: true,
            started: false,
            intro_done: false,
            show_content: false,
            exiting: None,
            overlay_open: false,
            unlock: Deadline::idle(),
            wheel,
            touch,
            hint_visible: true,
            hint_reshow: Deadline::idle(),
        }
    }

    /// Section the intro should land on. Ignored once the intro has started.
    pub fn set_start_section(&mut self, section: u32) {
        if self.started {
            debug!(section, "start section set after intro; ignoring");
            return;
        }
        self.current = section.clamp(1, self.section_count.max(1));
    }

    /// Current section.
    pub fn current_section(&self) -> u32 {
        self.current
    }

    /// Target of the in-flight move, if any.
    pub fn pending_section(&self) -> Option<u32> {
        self.pending
    }

    /// Number of sections.
    pub fn section_count(&self) -> u32 {
        self.section_count
    }

    /// The navigation lock.
    pub fn is_transitioning(&self) -> bool {
        self.locked
    }

    /// `true` once the intro has been requested.
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// `true` once the intro move has completed or been settled.
    pub fn intro_done(&self) -> bool {
        self.intro_done
    }

    /// `true` while content for the current section is shown.
    pub fn show_content(&self) -> bool {
        self.show_content
    }

    /// Presentation flags for `section`.
    pub fn panel(&self, section: u32) -> PanelState {
        PanelState {
            active: self.show_content && self.current == section,
            exiting: self.exiting == Some(section),
        }
    }

    /// `true` while the scroll hint should be shown.
    pub fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    /// `true` while a modal overlay is open.
    pub fn overlay_open(&self) -> bool {
        self.overlay_open
    }

    /// Open or close the modal overlay. Navigation input is ignored while it is open.
    pub fn set_overlay_open(&mut self, open: bool) {
        self.overlay_open = open;
        self.wheel.reset();
    }

    /// Play the intro from the virtual section 0 to the start section and start accepting input.
    pub fn begin_intro(
        &mut self,
        now: Duration,
        transport: &mut DualTransport,
        out: &mut Outbox,
    ) -> Option<SegmentPlan> {
        if self.started {
            return None;
        }
        self.started = true;
        self.locked = false;
        let plan = self.navigate(now, transport, 0, self.current, out);
        if plan.is_none() {
            tracing::warn!(section = self.current, "intro could not play; showing content");
            self.intro_done = true;
            self.show_content = true;
        }
        plan
    }

    /// Move to `target`.
    ///
    /// Does nothing (and returns `None`) before the intro, while locked, when `target` is out of
    /// range or equal to the current section, or when the transport refuses the move.
    #[tracing::instrument(level = "debug", skip(self, transport, out), fields(current = self.current))]
    pub fn request_section(
        &mut self,
        now: Duration,
        target: u32,
        transport: &mut DualTransport,
        out: &mut Outbox,
    ) -> Option<SegmentPlan> {
        if !self.started {
            debug!("not started; dropped");
            return None;
        }
        if self.locked {
            debug!("locked; dropped");
            return None;
        }
        if !(1..=self.section_count).contains(&target) {
            debug!("out of range; dropped");
            return None;
        }
        if target == self.current {
            return None;
        }
        self.navigate(now, transport, self.current, target, out)
    }

    fn request_intent(
        &mut self,
        now: Duration,
        intent: Intent,
        transport: &mut DualTransport,
        out: &mut Outbox,
    ) -> Option<SegmentPlan> {
        let target = intent.resolve(self.current, self.section_count)?;
        self.request_section(now, target, transport, out)
    }

    fn navigate(
        &mut self,
        now: Duration,
        transport: &mut DualTransport,
        from: u32,
        to: u32,
        out: &mut Outbox,
    ) -> Option<SegmentPlan> {
        let track = Track::for_move(from, to)?;
        let plan = transport.play_segment(now, track, from, to)?;
        self.locked = true;
        self.unlock.cancel();
        self.pending = Some(to);
        self.exiting = (from >= 1).then_some(from);
        self.show_content = false;
        out.emit(Event::TransitionStarted { track, from, to });
        Some(plan)
    }

    /// Commit a completed move and schedule the unlock.
    pub fn on_transport_complete(&mut self, now: Duration, plan: &SegmentPlan, out: &mut Outbox) {
        if self.pending != Some(plan.to) {
            debug!(to = plan.to, "completion for a move we no longer track");
            return;
        }
        self.pending = None;
        self.current = plan.to;
        self.exiting = None;
        self.show_content = true;
        if plan.from == 0 {
            self.intro_done = true;
        }
        self.unlock.arm(now, self.cfg.settle_delay());
        out.emit(Event::SectionChanged { section: plan.to });
    }

    /// Fire due timers.
    pub fn tick(&mut self, now: Duration, out: &mut Outbox) {
        if self.unlock.take_due(now) {
            self.locked = false;
            debug!(section = self.current, "input unlocked");
            out.emit(Event::InputUnlocked);
        }
        if self.hint_reshow.take_due(now) {
            self.hint_visible = true;
        }
    }

    /// `true` when a resume from the background should force-settle.
    pub fn needs_resettle(&self, transport: &DualTransport) -> bool {
        self.started && (self.locked || transport.is_busy())
    }

    /// Abandon any in-flight move, freeze the visible track on the current section and unlock.
    pub fn force_settle(&mut self, transport: &mut DualTransport, out: &mut Outbox) {
        let track = transport.active_track();
        transport.settle_to_freeze_frame(self.current, track);
        self.pending = None;
        self.exiting = None;
        self.intro_done = true;
        self.show_content = true;
        self.unlock.cancel();
        self.locked = false;
        self.wheel.reset();
        tracing::info!(section = self.current, track = %track, "force-settled");
        out.emit(Event::Settled {
            section: self.current,
            track,
        });
    }

    fn poke_hint(&mut self, now: Duration) {
        self.hint_visible = false;
        self.hint_reshow.arm(now, self.cfg.hint_idle());
    }

    /// Wheel input. Suppressed whenever no overlay is open, so the page itself never scrolls.
    pub fn on_wheel(
        &mut self,
        now: Duration,
        delta_y: f64,
        transport: &mut DualTransport,
        out: &mut Outbox,
    ) -> InputOutcome {
        if self.overlay_open {
            return InputOutcome::Ignored;
        }
        if !self.started || self.locked {
            self.wheel.reset();
            return InputOutcome::Suppressed;
        }
        self.poke_hint(now);
        match self.wheel.push(now, delta_y) {
            Some(intent) => self
                .request_intent(now, intent, transport, out)
                .map_or(InputOutcome::Suppressed, InputOutcome::Navigated),
            None => InputOutcome::Suppressed,
        }
    }

    /// Touch start at vertical position `y`.
    pub fn on_touch_start(&mut self, y: f64) {
        if self.overlay_open || !self.started {
            return;
        }
        self.touch.start(y);
    }

    /// Touch end at vertical position `y`.
    pub fn on_touch_end(
        &mut self,
        now: Duration,
        y: f64,
        transport: &mut DualTransport,
        out: &mut Outbox,
    ) -> InputOutcome {
        let intent = self.touch.end(y);
        if self.overlay_open || !self.started || self.locked {
            return InputOutcome::Ignored;
        }
        let Some(intent) = intent else {
            return InputOutcome::Ignored;
        };
        self.poke_hint(now);
        self.request_intent(now, intent, transport, out)
            .map_or(InputOutcome::Ignored, InputOutcome::Navigated)
    }

    /// Navigation key press.
    pub fn on_key(
        &mut self,
        now: Duration,
        key: NavKey,
        transport: &mut DualTransport,
        out: &mut Outbox,
    ) -> InputOutcome {
        if self.overlay_open {
            return InputOutcome::Ignored;
        }
        self.poke_hint(now);
        self.request_intent(now, key.intent(), transport, out)
            .map_or(InputOutcome::Ignored, InputOutcome::Navigated)
    }

    /// Click on a section indicator; jumps straight to `section` in one segment.
    pub fn on_indicator_click(
        &mut self,
        now: Duration,
        section: u32,
        transport: &mut DualTransport,
        out: &mut Outbox,
    ) -> InputOutcome {
        if self.overlay_open {
            return InputOutcome::Ignored;
        }
        self.poke_hint(now);
        self.request_intent(now, Intent::Goto(section), transport, out)
            .map_or(InputOutcome::Ignored, InputOutcome::Navigated)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/navigator.rs"]
mod tests;
