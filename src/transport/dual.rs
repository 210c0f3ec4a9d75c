use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{PlaybackMode, TransportConfig};
use crate::foundation::clock::Deadline;
use crate::foundation::core::{FrameIndex, Track, frame_to_time};
use crate::timing::table::SectionTimingTable;
use crate::transport::handle::PlaybackHandle;
use crate::transport::segment::{Phase, SegmentPlan, Transition};

/// Something the presentation layer or the scheduler may react to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransportEvent {
    /// `track` became the visible track.
    Swapped {
        /// Newly visible track.
        track: Track,
    },
    /// The segment started moving.
    Started(SegmentPlan),
    /// The segment reached its freeze frame; the move is over.
    Completed(SegmentPlan),
}

#[derive(Clone, Copy, Debug)]
struct Prebuffer {
    track: Track,
    secs: f64,
    due: Deadline,
}

/// Two playback handles, forward- and reverse-encoded, presented as one scrubbable video.
///
/// Callers never reach the handles. They ask for a segment with [`Self::play_segment`] and
/// learn about completion from [`Self::tick`]. The navigation lock is not kept here.
pub struct DualTransport {
    table: SectionTimingTable,
    cfg: TransportConfig,
    handles: [Option<Box<dyn PlaybackHandle>>; 2],
    active: Track,
    swap_pending: bool,
    ready: [bool; 2],
    transition: Option<Transition>,
    prebuffer: Option<Prebuffer>,
    prebuffer_seek: Option<Track>,
}

impl DualTransport {
    /// Transport with no handles mounted and the forward track visible.
    pub fn new(table: SectionTimingTable, cfg: TransportConfig) -> Self {
        Self {
            table,
            cfg,
            handles: [None, None],
            active: Track::Forward,
            swap_pending: false,
            ready: [true, true],
            transition: None,
            prebuffer: None,
            prebuffer_seek: None,
        }
    }

    /// Attach the element for `track`, replacing any previous one.
    pub fn mount(&mut self, track: Track, handle: Box<dyn PlaybackHandle>) {
        self.handles[track.slot()] = Some(handle);
    }

    /// Detach the element for `track`. An in-flight segment on it completes on the next tick.
    pub fn unmount(&mut self, track: Track) -> Option<Box<dyn PlaybackHandle>> {
        self.handles[track.slot()].take()
    }

    pub fn is_mounted(&self, track: Track) -> bool {
        self.handles[track.slot()].is_some()
    }

    pub fn table(&self) -> &SectionTimingTable {
        &self.table
    }

    pub fn active_track(&self) -> Track {
        self.active
    }

    /// `true` for the track the presentation layer should show.
    pub fn is_visible(&self, track: Track) -> bool {
        self.active == track
    }

    /// `true` while an incoming track is prepared but not yet shown.
    pub fn swap_pending(&self) -> bool {
        self.swap_pending
    }

    /// `false` while `track` is being repositioned in the background.
    pub fn is_track_ready(&self, track: Track) -> bool {
        self.ready[track.slot()]
    }

    /// `true` while a segment is in flight.
    pub fn is_busy(&self) -> bool {
        self.transition.is_some()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.transition.map(|t| t.phase)
    }

    fn handle(&self, track: Track) -> Option<&(dyn PlaybackHandle + 'static)> {
        self.handles[track.slot()].as_deref()
    }

    fn handle_mut(&mut self, track: Track) -> Option<&mut (dyn PlaybackHandle + 'static)> {
        self.handles[track.slot()].as_deref_mut()
    }

    /// Put both tracks on the first picture: forward at frame 0, reverse at its last frame.
    pub fn prime(&mut self) {
        let fps = self.table.fps();
        let last = FrameIndex(self.table.total_frames());
        if let Some(h) = self.handle_mut(Track::Forward) {
            h.seek(frame_to_time(FrameIndex(0), fps));
        }
        if let Some(h) = self.handle_mut(Track::Reverse) {
            h.seek(frame_to_time(last, fps));
        }
        debug!("transport primed");
    }

    /// Begin moving from `from`'s freeze frame to `to`'s on `track`.
    ///
    /// Returns the resolved plan, or `None` (and does nothing) when the handle is not mounted,
    /// either section is unknown, or a segment is already in flight.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn play_segment(
        &mut self,
        now: Duration,
        track: Track,
        from: u32,
        to: u32,
    ) -> Option<SegmentPlan> {
        if self.transition.is_some() {
            warn!("segment requested while another is in flight; ignoring");
            return None;
        }
        let Some(plan) = SegmentPlan::resolve(&self.table, &self.cfg, track, from, to) else {
            debug!("sections not in timing table; no-op");
            return None;
        };
        let Some(handle) = self.handle_mut(track) else {
            debug!("handle not mounted; no-op");
            return None;
        };
        handle.set_playback_rate(plan.rate);
        self.prebuffer = None;

        let phase = if self.active != track && self.cfg.swap_ticks > 0 {
            self.swap_pending = true;
            self.ready[track.slot()] = false;
            Phase::AwaitingSwap {
                ticks_left: self.cfg.swap_ticks,
                since: now,
            }
        } else {
            // Only when swap_ticks is 0; the swap completes immediately.
            if self.active != track {
                self.active = track;
            }
            let mut ignored = Vec::new();
            self.enter_seek(now, &plan, &mut ignored)
        };
        debug!(
            start = plan.start_secs,
            end = plan.end_secs,
            rate = plan.rate,
            phase = phase.name(),
            "segment accepted"
        );
        self.transition = Some(Transition { plan, phase });
        Some(plan)
    }

    /// Advance the in-flight segment and any pending background seek by one display refresh.
    pub fn tick(&mut self, now: Duration, out: &mut Vec<TransportEvent>) {
        self.service_prebuffer(now);

        let Some(tr) = self.transition else {
            return;
        };
        let plan = tr.plan;
        if !self.is_mounted(plan.track) {
            debug!(track = %plan.track, "handle unmounted mid-segment; completing");
            self.transition = None;
            self.swap_pending = false;
            out.push(TransportEvent::Completed(plan));
            return;
        }

        let timeout = self.cfg.seek_timeout();
        let next = match tr.phase {
            Phase::AwaitingSwap { ticks_left, since } if ticks_left > 1 => {
                Some(Phase::AwaitingSwap {
                    ticks_left: ticks_left - 1,
                    since,
                })
            }
            // The incoming track must not be shown while a background seek is still landing.
            Phase::AwaitingSwap { since, .. }
                if self.handle(plan.track).is_some_and(|h| h.is_seeking())
                    && now.saturating_sub(since) < timeout =>
            {
                Some(tr.phase)
            }
            Phase::AwaitingSwap { since, .. } => {
                if self.handle(plan.track).is_some_and(|h| h.is_seeking()) {
                    warn!(
                        track = %plan.track,
                        waited_ms = now.saturating_sub(since).as_millis(),
                        "incoming track still seeking; swapping anyway"
                    );
                }
                self.active = plan.track;
                self.swap_pending = false;
                self.ready[plan.track.slot()] = true;
                out.push(TransportEvent::Swapped { track: plan.track });
                Some(self.enter_seek(now, &plan, out))
            }
            Phase::AwaitingSeek { since } => {
                let seeking = self.handle(plan.track).is_some_and(|h| h.is_seeking());
                if seeking && now.saturating_sub(since) < timeout {
                    Some(tr.phase)
                } else {
                    if seeking {
                        warn!(track = %plan.track, "seek not confirmed in time; playing anyway");
                    }
                    Some(self.start_playback(now, &plan, out))
                }
            }
            Phase::Playing { since } => Some(self.advance_playback(now, since, &plan)),
            Phase::Settling { since } => {
                let seeking = self.handle(plan.track).is_some_and(|h| h.is_seeking());
                if seeking && now.saturating_sub(since) < timeout {
                    Some(tr.phase)
                } else {
                    None
                }
            }
        };

        match next {
            Some(phase) => {
                if phase.name() != tr.phase.name() {
                    debug!(from = tr.phase.name(), to = phase.name(), "segment phase");
                }
                self.transition = Some(Transition { plan, phase });
            }
            None => {
                debug!(to = plan.to, track = %plan.track, "segment complete");
                self.transition = None;
                out.push(TransportEvent::Completed(plan));
            }
        }
    }

    /// Pause and snap `track` to `section`'s freeze frame immediately.
    ///
    /// Abandons any in-flight segment and background seek, then repositions the hidden track
    /// on the mirrored frame so a later swap shows the same picture. Never animates.
    pub fn settle_to_freeze_frame(&mut self, section: u32, track: Track) {
        let Some(secs) = self.table.freeze_time(track, section) else {
            debug!(section, "settle target not in timing table; no-op");
            return;
        };
        if let Some(tr) = self.transition.take() {
            warn!(
                phase = tr.phase.name(),
                from = tr.plan.from,
                to = tr.plan.to,
                "abandoning in-flight segment"
            );
        }
        self.prebuffer = None;
        self.prebuffer_seek = None;
        self.swap_pending = false;
        self.ready = [true, true];
        self.active = track;

        let idle = track.other();
        let idle_secs = self.table.freeze_time(idle, section);
        if let Some(h) = self.handle_mut(idle) {
            h.pause();
            if let Some(idle_secs) = idle_secs {
                h.seek(idle_secs);
                self.ready[idle.slot()] = false;
                self.prebuffer_seek = Some(idle);
            }
        }
        if let Some(h) = self.handle_mut(track) {
            h.pause();
            h.seek(secs);
        }
        debug!(section, track = %track, secs, "settled to freeze frame");
    }

    fn enter_seek(
        &mut self,
        now: Duration,
        plan: &SegmentPlan,
        out: &mut Vec<TransportEvent>,
    ) -> Phase {
        let tolerance = self.cfg.seek_tolerance_secs;
        let at_start = self
            .handle(plan.track)
            .is_some_and(|h| (h.current_time() - plan.start_secs).abs() < tolerance);
        if at_start {
            return self.start_playback(now, plan, out);
        }
        if let Some(h) = self.handle_mut(plan.track) {
            h.seek(plan.start_secs);
        }
        Phase::AwaitingSeek { since: now }
    }

    fn start_playback(
        &mut self,
        now: Duration,
        plan: &SegmentPlan,
        out: &mut Vec<TransportEvent>,
    ) -> Phase {
        let native = self.cfg.playback == PlaybackMode::Native;
        if let Some(h) = self.handle_mut(plan.track) {
            if native {
                h.play();
            }
        }

        // The idle track is repositioned only after the swap has painted, so the seek never
        // shows on the visible element.
        let idle = plan.track.other();
        if let Some(secs) = self.table.freeze_time(idle, plan.to) {
            let mut due = Deadline::idle();
            due.arm(now, self.cfg.prebuffer_delay());
            self.prebuffer = Some(Prebuffer {
                track: idle,
                secs,
                due,
            });
        }

        out.push(TransportEvent::Started(*plan));
        Phase::Playing { since: now }
    }

    fn advance_playback(&mut self, now: Duration, since: Duration, plan: &SegmentPlan) -> Phase {
        let mode = self.cfg.playback;
        let end_tolerance = self.cfg.end_tolerance_secs;
        let overrun = plan.wall_time().saturating_add(self.cfg.overrun_grace());
        let elapsed = now.saturating_sub(since);

        let Some(h) = self.handle_mut(plan.track) else {
            return Phase::Settling { since: now };
        };
        match mode {
            PlaybackMode::Native => {
                let pos = h.current_time();
                if pos < plan.end_secs - end_tolerance {
                    if elapsed <= overrun {
                        return Phase::Playing { since };
                    }
                    warn!(pos, end = plan.end_secs, "playback overran; snapping to end");
                }
            }
            PlaybackMode::Scrub => {
                let wall = plan.wall_time().as_secs_f64();
                let progress = if wall <= 0.0 {
                    1.0
                } else {
                    (elapsed.as_secs_f64() / wall).min(1.0)
                };
                if progress < 1.0 {
                    h.seek(plan.start_secs + progress * (plan.end_secs - plan.start_secs));
                    return Phase::Playing { since };
                }
            }
        }

        h.pause();
        h.seek(plan.end_secs);
        Phase::Settling { since: now }
    }

    fn service_prebuffer(&mut self, now: Duration) {
        if let Some(track) = self.prebuffer_seek {
            let done = self.handle(track).is_none_or(|h| !h.is_seeking());
            if done {
                self.ready[track.slot()] = true;
                self.prebuffer_seek = None;
            }
        }

        let due = match self.prebuffer.as_mut() {
            Some(pb) => pb.due.take_due(now),
            None => false,
        };
        if !due {
            return;
        }
        let Some(pb) = self.prebuffer.take() else {
            return;
        };
        if pb.track == self.active {
            debug!(track = %pb.track, "pre-buffer target is visible; skipping");
            return;
        }
        if let Some(h) = self.handle_mut(pb.track) {
            h.seek(pb.secs);
            self.ready[pb.track.slot()] = false;
            self.prebuffer_seek = Some(pb.track);
            debug!(track = %pb.track, secs = pb.secs, "pre-buffered idle track");
        }
    }
}

impl std::fmt::Debug for DualTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualTransport")
            .field("active", &self.active)
            .field("swap_pending", &self.swap_pending)
            .field("mounted", &[self.handles[0].is_some(), self.handles[1].is_some()])
            .field("transition", &self.transition)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transport/dual.rs"]
mod tests;
