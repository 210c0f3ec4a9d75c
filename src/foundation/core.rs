use crate::foundation::error::{ScrubError, ScrubResult};

/// Offset added to every frame timestamp so a seek lands inside the intended frame.
///
/// Decoders round `currentTime` to a frame boundary; without the offset a timestamp that is
/// exactly `frame / fps` can decode as `frame - 1`.
pub const FRAME_EPSILON_SECS: f64 = 0.001;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    pub fn mirrored(self, total_frames: u64) -> Self {
        Self(total_frames.saturating_sub(self.0))
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32,
}

impl Fps {
    pub fn new(num: u32, den: u32) -> ScrubResult<Self> {
        if den == 0 {
            return Err(ScrubError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ScrubError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn whole(num: u32) -> ScrubResult<Self> {
        Self::new(num, 1)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    pub fn frame_to_time(self, frame: FrameIndex) -> f64 {
        frame_to_time(frame, self)
    }
}

/// Playback timestamp (seconds) that decodes to exactly `frame`.
///
/// Every seek target and every position comparison in the crate goes through this function so
/// that all call sites agree on [`FRAME_EPSILON_SECS`].
pub fn frame_to_time(frame: FrameIndex, fps: Fps) -> f64 {
    fps.frames_to_secs(frame.0) + FRAME_EPSILON_SECS
}

/// One of the two encodings of the background video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Forward,
    Reverse,
}

impl Track {
    pub const ALL: [Track; 2] = [Track::Forward, Track::Reverse];

    pub fn other(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    pub fn slot(self) -> usize {
        match self {
            Self::Forward => 0,
            Self::Reverse => 1,
        }
    }

    /// Track that moves from `from` to `to`, or `None` when they are equal.
    pub fn for_move(from: u32, to: u32) -> Option<Self> {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Some(Self::Forward),
            std::cmp::Ordering::Less => Some(Self::Reverse),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Reverse => f.write_str("reverse"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
