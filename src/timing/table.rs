use crate::foundation::core::{FrameIndex, Fps, Track, frame_to_time};
use crate::foundation::error::{ScrubError, ScrubResult};

/// Frame span of one section on the forward track. `end_frame` is the freeze frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SectionTimingEntry {
    /// 1-based section index (`0` is the virtual pre-start section).
    pub index: u32,
    /// First frame of the section's segment.
    pub start_frame: FrameIndex,
    /// Frame the video freezes on when the section is shown.
    pub end_frame: FrameIndex,
}

/// Section index → frame span mapping for both tracks.
///
/// Only the forward spans are authored. Reverse spans are derived by mirroring, so the
/// reverse freeze frame of a section shows the same picture as its forward freeze frame:
/// `reverse(i) = [total - forward_end(i), total - forward_start(i)]`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SectionTimingTable {
    fps: Fps,
    total_frames: u64,
    forward: Vec<SectionTimingEntry>,
}

impl SectionTimingTable {
    /// Build a table from explicit forward spans for sections `1..=spans.len()`.
    ///
    /// Adjacent sections must share an endpoint within `join_tolerance_secs`, and every frame
    /// must lie in `[0, total_frames]`.
    pub fn new(
        fps: Fps,
        total_frames: u64,
        spans: &[(u64, u64)],
        join_tolerance_secs: f64,
    ) -> ScrubResult<Self> {
        if spans.is_empty() {
            return Err(ScrubError::validation("timing table needs at least one section"));
        }
        if total_frames == 0 {
            return Err(ScrubError::validation("total_frames must be > 0"));
        }

        let mut forward = Vec::with_capacity(spans.len());
        for (i, &(start, end)) in spans.iter().enumerate() {
            let index = u32::try_from(i + 1)
                .map_err(|_| ScrubError::validation("too many sections"))?;
            if start > end {
                return Err(ScrubError::validation(format!(
                    "section {index}: start frame {start} is after end frame {end}"
                )));
            }
            if end > total_frames {
                return Err(ScrubError::validation(format!(
                    "section {index}: end frame {end} exceeds total frames {total_frames}"
                )));
            }
            forward.push(SectionTimingEntry {
                index,
                start_frame: FrameIndex(start),
                end_frame: FrameIndex(end),
            });
        }

        for pair in forward.windows(2) {
            let gap = pair[0].end_frame.0.abs_diff(pair[1].start_frame.0);
            if fps.frames_to_secs(gap) > join_tolerance_secs {
                return Err(ScrubError::validation(format!(
                    "sections {} and {} do not join: freeze frame {} vs next start {}",
                    pair[0].index, pair[1].index, pair[0].end_frame.0, pair[1].start_frame.0
                )));
            }
        }

        Ok(Self {
            fps,
            total_frames,
            forward,
        })
    }

    /// Build a table from forward freeze frames: section `i` spans
    /// `[freeze(i - 1), freeze(i)]` with `freeze(0) = 0`.
    pub fn from_freeze_frames(fps: Fps, total_frames: u64, freeze: &[u64]) -> ScrubResult<Self> {
        let mut spans = Vec::with_capacity(freeze.len());
        let mut prev = 0u64;
        for &f in freeze {
            if f < prev {
                return Err(ScrubError::validation(format!(
                    "freeze frames must be non-decreasing ({f} after {prev})"
                )));
            }
            spans.push((prev, f));
            prev = f;
        }
        Self::new(fps, total_frames, &spans, 0.0)
    }

    /// Frame rate of both tracks.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Frame count of both tracks.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Number of real sections (`N`).
    pub fn section_count(&self) -> u32 {
        self.forward.len() as u32
    }

    /// `true` for `1..=N`.
    pub fn contains(&self, section: u32) -> bool {
        section >= 1 && section <= self.section_count()
    }

    /// Authored forward entries for sections `1..=N`.
    pub fn entries(&self) -> &[SectionTimingEntry] {
        &self.forward
    }

    /// Forward `(start, end)` frames. Section `0` maps to `(0, 0)`.
    pub fn forward_range(&self, section: u32) -> Option<(FrameIndex, FrameIndex)> {
        if section == 0 {
            return Some((FrameIndex(0), FrameIndex(0)));
        }
        let e = self.forward.get(section as usize - 1)?;
        Some((e.start_frame, e.end_frame))
    }

    /// Reverse `(start, end)` frames, mirrored from the forward span.
    pub fn reverse_range(&self, section: u32) -> Option<(FrameIndex, FrameIndex)> {
        let (start, end) = self.forward_range(section)?;
        Some((
            end.mirrored(self.total_frames),
            start.mirrored(self.total_frames),
        ))
    }

    /// Range on the given track.
    pub fn range(&self, track: Track, section: u32) -> Option<(FrameIndex, FrameIndex)> {
        match track {
            Track::Forward => self.forward_range(section),
            Track::Reverse => self.reverse_range(section),
        }
    }

    /// Frame a track rests on while `section` is shown.
    ///
    /// Forward rests at the end of its span, reverse at the start of its (mirrored) span.
    pub fn freeze_frame(&self, track: Track, section: u32) -> Option<FrameIndex> {
        let (start, end) = self.range(track, section)?;
        Some(match track {
            Track::Forward => end,
            Track::Reverse => start,
        })
    }

    /// Seek timestamp of [`Self::freeze_frame`].
    pub fn freeze_time(&self, track: Track, section: u32) -> Option<f64> {
        self.freeze_frame(track, section)
            .map(|f| frame_to_time(f, self.fps))
    }

    /// `(start, end)` frames of one segment from `from`'s freeze frame to `to`'s on `track`.
    ///
    /// Multi-section jumps are one continuous segment.
    pub fn segment_frames(
        &self,
        track: Track,
        from: u32,
        to: u32,
    ) -> Option<(FrameIndex, FrameIndex)> {
        Some((self.freeze_frame(track, from)?, self.freeze_frame(track, to)?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timing/table.rs"]
mod tests;
