use std::time::Duration;

use crate::config::TransportConfig;
use crate::foundation::core::{Track, frame_to_time};
use crate::timing::table::SectionTimingTable;

/// Resolved timestamps and pacing of one section-to-section move.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SegmentPlan {
    pub track: Track,
    pub from: u32,
    pub to: u32,
    pub start_secs: f64,
    pub end_secs: f64,
    pub rate: f64,
}

impl SegmentPlan {
    /// Resolve a move, or `None` if either section is not in the table.
    ///
    /// Long segments are played at `fast_rate` to cap the wall-clock length of a transition.
    pub fn resolve(
        table: &SectionTimingTable,
        cfg: &TransportConfig,
        track: Track,
        from: u32,
        to: u32,
    ) -> Option<Self> {
        let (start, end) = table.segment_frames(track, from, to)?;
        let start_secs = frame_to_time(start, table.fps());
        let end_secs = frame_to_time(end, table.fps());
        let rate = if end_secs - start_secs > cfg.fast_segment_secs {
            cfg.fast_rate
        } else {
            1.0
        };
        Some(Self {
            track,
            from,
            to,
            start_secs,
            end_secs,
            rate,
        })
    }

    pub fn source_secs(&self) -> f64 {
        (self.end_secs - self.start_secs).max(0.0)
    }

    /// Expected wall-clock length at the plan's rate.
    pub fn wall_time(&self) -> Duration {
        Duration::from_secs_f64(self.source_secs() / self.rate)
    }
}

/// Where an in-flight transition is.
///
/// Phases only move forward: `AwaitingSwap -> AwaitingSeek -> Playing -> Settling`. `Done` is
/// reported by the transport rather than stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    /// Incoming track marked not ready; waiting for paint ticks before it becomes visible.
    AwaitingSwap {
        ticks_left: u32,
        since: Duration,
    },
    /// Seek to the segment start issued; waiting for the handle to confirm it.
    AwaitingSeek {
        since: Duration,
    },
    /// Moving from start to end.
    Playing {
        since: Duration,
    },
    /// Paused and snapped to the end; waiting for the snap to land.
    Settling {
        since: Duration,
    },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingSwap { .. } => "awaiting_swap",
            Self::AwaitingSeek { .. } => "awaiting_seek",
            Self::Playing { .. } => "playing",
            Self::Settling { .. } => "settling",
        }
    }
}

/// One in-flight `play_segment` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub plan: SegmentPlan,
    pub phase: Phase,
}
