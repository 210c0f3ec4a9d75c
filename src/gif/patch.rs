//! In-place GIF timing patcher for the splash signature.
//!
//! Walks the GIF89a block stream once, then rewrites two little-endian fields: the NETSCAPE2.0
//! loop count (set to 1) and the first frame's delay (extended to cover the fade-in). Every
//! other byte passes through untouched and the buffer length never changes.

use tracing::{debug, warn};

use crate::foundation::error::{ScrubError, ScrubResult};

/// First-frame delay written by [`patch`], in GIF centiseconds (600 ms).
pub const FADE_IN_CENTISECONDS: u16 = 60;

/// Duration reported when a buffer cannot be patched.
pub const FALLBACK_DURATION_MS: u64 = 3_000;

const HEADER_LEN: usize = 13;
const NETSCAPE_ID: &[u8; 11] = b"NETSCAPE2.0";

/// Offsets and delays found by [`scan`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GifLayout {
    /// Offset of the NETSCAPE2.0 loop-count field, if the extension is present.
    pub loop_count_offset: Option<usize>,
    /// Offset of the first Graphic Control Extension's delay field.
    pub first_delay_offset: Option<usize>,
    /// Delay of every frame, in centiseconds, in stream order.
    pub frame_delays_cs: Vec<u16>,
}

/// Output of [`patch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchedGif {
    /// Total play time of `bytes`.
    pub duration_ms: u64,
    /// Patched buffer, or the input unchanged when `patched` is `false`.
    pub bytes: Vec<u8>,
    /// `false` when the input could not be parsed and was passed through.
    pub patched: bool,
}

impl PatchedGif {
    /// Pass `bytes` through with [`FALLBACK_DURATION_MS`].
    pub fn fallback(bytes: Vec<u8>) -> Self {
        Self {
            duration_ms: FALLBACK_DURATION_MS,
            bytes,
            patched: false,
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn byte(&mut self) -> ScrubResult<u8> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| ScrubError::gif(format!("truncated at offset {}", self.pos)))?;
        self.pos += 1;
        Ok(b)
    }

    fn slice(&self, at: usize, len: usize) -> ScrubResult<&'a [u8]> {
        self.bytes
            .get(at..at + len)
            .ok_or_else(|| ScrubError::gif(format!("truncated at offset {at}")))
    }

    fn skip(&mut self, n: usize) -> ScrubResult<()> {
        let end = self.pos + n;
        if end > self.bytes.len() {
            return Err(ScrubError::gif(format!(
                "block at offset {} runs past end of data",
                self.pos
            )));
        }
        self.pos = end;
        Ok(())
    }

    fn skip_sub_blocks(&mut self) -> ScrubResult<()> {
        loop {
            let len = self.byte()?;
            if len == 0 {
                return Ok(());
            }
            self.skip(usize::from(len))?;
        }
    }
}

fn color_table_len(packed: u8) -> usize {
    if packed & 0x80 == 0 {
        0
    } else {
        3 * (1usize << ((packed & 0x07) + 1))
    }
}

/// Locate the patchable fields and collect frame delays.
///
/// Unknown bytes between blocks are skipped and a missing trailer is tolerated. Only a block
/// that runs past the end of the data is an error.
pub fn scan(bytes: &[u8]) -> ScrubResult<GifLayout> {
    if bytes.len() < HEADER_LEN {
        return Err(ScrubError::gif("shorter than the GIF header"));
    }
    if &bytes[..6] != b"GIF89a" && &bytes[..6] != b"GIF87a" {
        return Err(ScrubError::gif("missing GIF signature"));
    }

    let mut r = Reader {
        bytes,
        pos: HEADER_LEN,
    };
    r.skip(color_table_len(bytes[10]))?;

    let mut layout = GifLayout::default();
    let mut stray = 0usize;
    // Running out of data between blocks counts as the end of the stream.
    while r.pos < bytes.len() {
        let start = r.pos;
        match r.byte()? {
            0x21 => {
                let label = r.byte()?;
                match label {
                    0xF9 => {
                        // 21 F9 04 <packed> <delay lo> <delay hi> <transparent> 00
                        let size = r.slice(start + 2, 1)?[0];
                        if size < 4 {
                            return Err(ScrubError::gif(format!(
                                "graphic control extension at {start} has size {size}"
                            )));
                        }
                        let delay = r.slice(start + 4, 2)?;
                        layout
                            .frame_delays_cs
                            .push(u16::from_le_bytes([delay[0], delay[1]]));
                        layout.first_delay_offset.get_or_insert(start + 4);
                    }
                    0xFF => {
                        // 21 FF 0B NETSCAPE2.0 03 01 <loop lo> <loop hi> 00
                        let is_netscape = r.slice(start + 2, 1)?[0] == 11
                            && r.slice(start + 3, 11)? == NETSCAPE_ID;
                        if is_netscape {
                            let sub = r.slice(start + 14, 2)?;
                            if sub[0] >= 3 && sub[1] == 1 {
                                r.slice(start + 16, 2)?;
                                layout.loop_count_offset = Some(start + 16);
                            }
                        }
                    }
                    _ => {}
                }
                r.skip_sub_blocks()?;
            }
            0x2C => {
                // Position, size and packed fields, then the optional local color table.
                r.skip(8)?;
                let packed = r.byte()?;
                r.skip(color_table_len(packed))?;
                // LZW minimum code size.
                r.byte()?;
                r.skip_sub_blocks()?;
            }
            0x3B => break,
            other => {
                if stray == 0 {
                    debug!(byte = other, offset = start, "skipping stray byte between blocks");
                }
                stray += 1;
            }
        }
    }
    if stray > 0 {
        debug!(stray, "gif had bytes outside any block");
    }
    Ok(layout)
}

/// Play time after patching: every original delay except the first, plus the fade-in hold.
pub fn patched_duration_ms(delays_cs: &[u16]) -> u64 {
    let total: u64 = delays_cs.iter().map(|&d| u64::from(d)).sum();
    let first = delays_cs.first().map_or(0, |&d| u64::from(d));
    (total - first) * 10 + u64::from(FADE_IN_CENTISECONDS) * 10
}

/// Make a looping GIF play once and hold its first frame for the fade-in.
///
/// Never fails: an unparseable buffer, or one without any frame timing, comes back unchanged
/// with [`FALLBACK_DURATION_MS`].
pub fn patch(bytes: &[u8]) -> PatchedGif {
    let layout = match scan(bytes) {
        Ok(layout) => layout,
        Err(e) => {
            warn!(error = %e, "gif not patched");
            return PatchedGif::fallback(bytes.to_vec());
        }
    };
    let Some(delay_at) = layout.first_delay_offset else {
        warn!("gif has no graphic control extension; not patched");
        return PatchedGif::fallback(bytes.to_vec());
    };

    let mut out = bytes.to_vec();
    if let Some(at) = layout.loop_count_offset
        && let Some(field) = out.get_mut(at..at + 2)
    {
        field.copy_from_slice(&1u16.to_le_bytes());
    }
    if let Some(field) = out.get_mut(delay_at..delay_at + 2) {
        field.copy_from_slice(&FADE_IN_CENTISECONDS.to_le_bytes());
    }

    PatchedGif {
        duration_ms: patched_duration_ms(&layout.frame_delays_cs),
        bytes: out,
        patched: true,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gif/patch.rs"]
mod tests;
