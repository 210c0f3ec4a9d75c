use super::*;

use std::io::Cursor;
use std::time::Duration;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, Frame, Rgba, RgbaImage};

#[derive(Default)]
struct Synth {
    global_table: bool,
    local_table: bool,
    netscape_loops: Option<u16>,
    comment: bool,
}

impl Synth {
    fn build(&self, delays_cs: &[u16]) -> Vec<u8> {
        let mut b = b"GIF89a".to_vec();
        // 1x1 canvas; packed flags a 2-entry global table when requested.
        b.extend_from_slice(&[1, 0, 1, 0]);
        b.push(if self.global_table { 0x80 } else { 0x00 });
        b.extend_from_slice(&[0, 0]);
        if self.global_table {
            b.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
        }
        if let Some(loops) = self.netscape_loops {
            b.extend_from_slice(&[0x21, 0xFF, 0x0B]);
            b.extend_from_slice(b"NETSCAPE2.0");
            b.extend_from_slice(&[0x03, 0x01]);
            b.extend_from_slice(&loops.to_le_bytes());
            b.push(0x00);
        }
        if self.comment {
            b.extend_from_slice(&[0x21, 0xFE, 0x03, b'h', b'i', b'!', 0x00]);
        }
        for &d in delays_cs {
            b.extend_from_slice(&[0x21, 0xF9, 0x04, 0x00]);
            b.extend_from_slice(&d.to_le_bytes());
            b.extend_from_slice(&[0x00, 0x00]);
            b.extend_from_slice(&[0x2C, 0, 0, 0, 0, 1, 0, 1, 0]);
            if self.local_table {
                b.push(0x80);
                b.extend_from_slice(&[10, 20, 30, 40, 50, 60]);
            } else {
                b.push(0x00);
            }
            b.extend_from_slice(&[0x02, 0x02, 0x44, 0x01, 0x00]);
        }
        b.push(0x3B);
        b
    }
}

fn looping() -> Synth {
    Synth {
        netscape_loops: Some(0),
        ..Synth::default()
    }
}

#[test]
fn duration_is_the_sum_minus_first_plus_fade_in() {
    let delays = [10u16, 10, 10];
    let out = patch(&looping().build(&delays));
    assert!(out.patched);
    let expected = (10 + 10 + 10 - 10) * 10 + u64::from(FADE_IN_CENTISECONDS) * 10;
    assert_eq!(out.duration_ms, expected);

    let uneven = [7u16, 25, 4, 100];
    assert_eq!(
        patched_duration_ms(&uneven),
        (7 + 25 + 4 + 100 - 7) * 10 + u64::from(FADE_IN_CENTISECONDS) * 10
    );
    assert_eq!(patched_duration_ms(&[]), u64::from(FADE_IN_CENTISECONDS) * 10);
}

#[test]
fn only_the_two_fields_change_and_length_is_kept() {
    let input = looping().build(&[10, 20, 30]);
    let layout = scan(&input).unwrap();
    let loop_at = layout.loop_count_offset.unwrap();
    let delay_at = layout.first_delay_offset.unwrap();
    assert_eq!(layout.frame_delays_cs, vec![10, 20, 30]);

    let out = patch(&input);
    assert_eq!(out.bytes.len(), input.len());
    assert_eq!(&out.bytes[loop_at..loop_at + 2], &[1, 0]);
    assert_eq!(
        &out.bytes[delay_at..delay_at + 2],
        &FADE_IN_CENTISECONDS.to_le_bytes()
    );

    let allowed = [loop_at, loop_at + 1, delay_at, delay_at + 1];
    for (i, (a, b)) in input.iter().zip(&out.bytes).enumerate() {
        if a != b {
            assert!(allowed.contains(&i), "byte {i} changed: {a:#04x} -> {b:#04x}");
        }
    }
}

#[test]
fn color_tables_and_other_extensions_are_skipped() {
    let synth = Synth {
        global_table: true,
        local_table: true,
        netscape_loops: Some(5),
        comment: true,
    };
    let input = synth.build(&[3, 4]);
    let layout = scan(&input).unwrap();
    assert_eq!(layout.frame_delays_cs, vec![3, 4]);
    // Header, 6-byte global table, then the NETSCAPE block.
    assert_eq!(layout.loop_count_offset, Some(13 + 6 + 16));

    let out = patch(&input);
    assert!(out.patched);
    assert_eq!(out.duration_ms, 4 * 10 + 600);
}

#[test]
fn gif_without_netscape_block_still_gets_the_first_frame_hold() {
    let input = Synth::default().build(&[8, 8]);
    let layout = scan(&input).unwrap();
    assert_eq!(layout.loop_count_offset, None);

    let out = patch(&input);
    assert!(out.patched);
    let at = layout.first_delay_offset.unwrap();
    assert_eq!(&out.bytes[at..at + 2], &[60, 0]);
}

#[test]
fn unparseable_input_passes_through() {
    let mut truncated = looping().build(&[10, 10]);
    truncated.truncate(truncated.len() - 6);
    for input in [
        truncated,
        b"not a gif at all".to_vec(),
        Vec::new(),
        looping().build(&[]),
    ] {
        let out = patch(&input);
        assert!(!out.patched);
        assert_eq!(out.bytes, input);
        assert_eq!(out.duration_ms, FALLBACK_DURATION_MS);
    }
}

#[test]
fn missing_trailer_still_patches() {
    let mut input = looping().build(&[10, 20, 30]);
    assert_eq!(input.pop(), Some(0x3B));

    let layout = scan(&input).unwrap();
    assert_eq!(layout.frame_delays_cs, vec![10, 20, 30]);
    assert!(layout.loop_count_offset.is_some());

    let out = patch(&input);
    assert!(out.patched);
    assert_eq!(out.bytes.len(), input.len());
    assert_eq!(out.duration_ms, (20 + 30) * 10 + 600);
}

#[test]
fn padding_between_blocks_is_skipped() {
    let clean = looping().build(&[10, 20]);
    let mut input = clean.clone();
    let trailer = input.len() - 1;
    input.splice(trailer..trailer, [0x00, 0x99, 0x00]);
    // Stray bytes right after the header as well.
    input.splice(13..13, [0x00, 0x00]);

    let layout = scan(&input).unwrap();
    assert_eq!(layout.frame_delays_cs, vec![10, 20]);
    assert_eq!(layout.loop_count_offset, Some(13 + 2 + 16));

    let out = patch(&input);
    assert!(out.patched);
    assert_eq!(out.duration_ms, 20 * 10 + 600);
    let at = layout.loop_count_offset.unwrap();
    assert_eq!(&out.bytes[at..at + 2], &[1, 0]);
}

#[test]
fn block_running_past_the_end_is_an_error() {
    let mut input = looping().build(&[10]);
    // Cut inside the image data sub-blocks.
    input.truncate(input.len() - 3);
    let err = scan(&input).unwrap_err();
    assert!(matches!(err, ScrubError::Gif(_)));
}

fn encode(delays_ms: &[u32]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut enc = GifEncoder::new(&mut buf);
        enc.set_repeat(Repeat::Infinite).unwrap();
        for (i, &ms) in delays_ms.iter().enumerate() {
            let shade = (i as u8).wrapping_mul(60);
            let img = RgbaImage::from_pixel(4, 4, Rgba([shade, 255 - shade, 0, 255]));
            let frame = Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(ms, 1));
            enc.encode_frame(frame).unwrap();
        }
    }
    buf
}

fn decoded_delays(bytes: &[u8]) -> Vec<Duration> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).unwrap();
    decoder
        .into_frames()
        .collect_frames()
        .unwrap()
        .iter()
        .map(|f| Duration::from(f.delay()))
        .collect()
}

#[test]
fn encoder_output_is_patched_and_still_decodes() {
    let input = encode(&[100, 100, 100]);
    assert_eq!(decoded_delays(&input), vec![Duration::from_millis(100); 3]);

    let out = patch(&input);
    assert!(out.patched);
    assert_eq!(out.bytes.len(), input.len());
    assert_eq!(out.duration_ms, (10 + 10 + 10 - 10) * 10 + 600);

    let layout = scan(&out.bytes).unwrap();
    let at = layout.loop_count_offset.unwrap();
    assert_eq!(&out.bytes[at..at + 2], &[1, 0]);
    assert_eq!(
        decoded_delays(&out.bytes),
        vec![
            Duration::from_millis(600),
            Duration::from_millis(100),
            Duration::from_millis(100)
        ]
    );
}
