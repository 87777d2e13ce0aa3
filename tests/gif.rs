//! Integration tests driving `decode` end to end over small, hand-built
//! GIF byte streams — no on-disk fixtures, so every test documents exactly
//! what bytes it's exercising.

use gifwalk::alloc::Allocator;
use gifwalk::descriptor::Disposal;
use gifwalk::sink::{FrameDescriptor, MetadataDescriptor, MetadataSink};
use gifwalk::{decode, sink::FrameSink};

/// Minimal LZW encoder for building test fixtures. Mirrors the rules
/// `lzw::decode_frame` decodes by (clear code, literal codes, stop code,
/// no code-width growth for inputs this small); it does not need to be a
/// general compressor, just a correct encoder for streams the decoder
/// must accept.
fn lzw_encode(min_code_size: u8, indices: &[u8]) -> Vec<u8> {
    let clear_code = 1u32 << min_code_size;
    let stop_code = clear_code + 1;
    let width = min_code_size as u32 + 1;

    let mut bits = Vec::new();
    let mut push = |code: u32, bits: &mut Vec<bool>| {
        for i in 0..width {
            bits.push((code >> i) & 1 != 0);
        }
    };
    push(clear_code, &mut bits);
    for &b in indices {
        push(b as u32, &mut bits);
    }
    push(stop_code, &mut bits);

    let mut bytes = Vec::new();
    let mut cur = 0u8;
    let mut n = 0;
    for bit in bits {
        if bit {
            cur |= 1 << n;
        }
        n += 1;
        if n == 8 {
            bytes.push(cur);
            cur = 0;
            n = 0;
        }
    }
    if n > 0 {
        bytes.push(cur);
    }

    let mut out = vec![min_code_size];
    for chunk in bytes.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
    out
}

fn image_descriptor(left: u16, top: u16, width: u16, height: u16, flags: u8) -> Vec<u8> {
    let mut v = vec![0x2C];
    v.extend_from_slice(&left.to_le_bytes());
    v.extend_from_slice(&top.to_le_bytes());
    v.extend_from_slice(&width.to_le_bytes());
    v.extend_from_slice(&height.to_le_bytes());
    v.push(flags);
    v
}

fn global_descriptor(width: u16, height: u16, flags: u8, bg: u8) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&width.to_le_bytes());
    v.extend_from_slice(&height.to_le_bytes());
    v.push(flags);
    v.push(bg);
    v.push(0); // pixel aspect ratio
    v
}

fn gray_palette(colors: usize) -> Vec<u8> {
    (0..colors).flat_map(|i| [i as u8; 3]).collect()
}

fn gce(flags: u8, delay: u16, transparent: u8) -> Vec<u8> {
    vec![
        0x21,
        0xF9,
        4,
        flags,
        delay.to_le_bytes()[0],
        delay.to_le_bytes()[1],
        transparent,
        0,
    ]
}

#[derive(Default)]
struct RecordingSink {
    frames: Vec<(usize, u16, u16, Disposal, Option<u8>, u16, Vec<u8>)>,
}

impl FrameSink for RecordingSink {
    fn frame(&mut self, f: &FrameDescriptor) {
        self.frames.push((
            f.frame_index,
            f.width,
            f.height,
            f.disposal,
            f.transparent_index,
            f.delay,
            f.raster.to_vec(),
        ));
    }
}

#[derive(Default)]
struct RecordingMetadataSink {
    calls: Vec<(Vec<u8>, Vec<u8>)>,
}

impl MetadataSink for RecordingMetadataSink {
    fn metadata(&mut self, m: &MetadataDescriptor) {
        self.calls.push((m.identifier.to_vec(), m.authentication_code.to_vec()));
    }
}

/// S1: the smallest legal GIF — a 2x2 screen, a global palette, one
/// non-interlaced frame covering the whole screen, then the trailer.
#[test]
fn s1_minimal_single_frame_gif() {
    let mut data = b"GIF87a".to_vec();
    data.extend(global_descriptor(2, 2, 0b1000_0000, 0)); // global palette, 2 colors
    data.extend(gray_palette(2));
    data.extend(image_descriptor(0, 0, 2, 2, 0));
    data.extend(lzw_encode(2, &[0, 1, 1, 0]));
    data.push(0x3B);

    let mut sink = RecordingSink::default();
    let count = decode(&data, 0, &mut sink, None, None);

    assert_eq!(count, 1);
    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.frames[0].6, vec![0, 1, 1, 0]);
}

/// S2: a frame with no local palette must fall back to the global one.
#[test]
fn s2_frame_without_local_palette_uses_global() {
    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(2, 1, 0b1000_0001, 0)); // exponent 1 -> 4 colors
    data.extend(gray_palette(4));
    data.extend(image_descriptor(0, 0, 2, 1, 0)); // no local palette flag
    data.extend(lzw_encode(2, &[3, 2]));
    data.push(0x3B);

    let mut sink = RecordingSink::default();
    let count = decode(&data, 0, &mut sink, None, None);
    assert_eq!(count, 1);
    assert_eq!(sink.frames[0].6, vec![3, 2]);
}

/// S3: a Graphics Control Extension applies to exactly the frame that
/// follows it, then reverts to defaults for the next one.
#[test]
fn s3_gce_applies_only_to_the_next_frame() {
    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(1, 1, 0b1000_0000, 0));
    data.extend(gray_palette(2));

    // frame 0: preceded by a GCE (background disposal, transparent index 1, delay 5)
    data.extend(gce(0b0000_1001, 5, 1)); // disposal bits 010 (background) << 2, transparency flag set
    data.extend(image_descriptor(0, 0, 1, 1, 0));
    data.extend(lzw_encode(2, &[0]));

    // frame 1: no GCE before it, so defaults apply
    data.extend(image_descriptor(0, 0, 1, 1, 0));
    data.extend(lzw_encode(2, &[1]));
    data.push(0x3B);

    let mut sink = RecordingSink::default();
    let count = decode(&data, 0, &mut sink, None, None);
    assert_eq!(count, 2);

    let (_, _, _, disposal0, transparent0, delay0, _) = &sink.frames[0];
    assert_eq!(*disposal0, Disposal::Background);
    assert_eq!(*transparent0, Some(1));
    assert_eq!(*delay0, 5);

    let (_, _, _, disposal1, transparent1, delay1, _) = &sink.frames[1];
    assert_eq!(*disposal1, Disposal::None);
    assert_eq!(*transparent1, None);
    assert_eq!(*delay1, 0);
}

/// S4: the decoder does not deinterlace — raster bytes come out in
/// whatever order the LZW bitstream produced them, and the interlace flag
/// is simply surfaced for the caller to act on.
#[test]
fn s4_interlaced_frame_is_not_deinterlaced() {
    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(2, 2, 0b1000_0000, 0));
    data.extend(gray_palette(2));
    data.extend(image_descriptor(0, 0, 2, 2, 0b0100_0000)); // interlace flag set
    let raw_order = [0u8, 1, 1, 0];
    data.extend(lzw_encode(2, &raw_order));
    data.push(0x3B);

    let mut sink = RecordingSink::default();
    decode(&data, 0, &mut sink, None, None);
    // the raster holds exactly the bitstream's own order, untouched
    assert_eq!(sink.frames[0].6, raw_order.to_vec());
}

/// S5: an Application Extension reaches the metadata sink with its
/// identifier and authentication code split out, and is otherwise opaque.
#[test]
fn s5_application_extension_reaches_metadata_sink() {
    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(1, 1, 0, 0));
    data.push(0x21);
    data.push(0xFF);
    data.push(11);
    data.extend_from_slice(b"NETSCAPE2.0");
    data.extend_from_slice(&[3, 1, 0, 0, 0]); // NETSCAPE loop sub-block + terminator
    data.extend(image_descriptor(0, 0, 1, 1, 0b1000_0000));
    data.extend(gray_palette(2));
    data.extend(lzw_encode(2, &[0]));
    data.push(0x3B);

    let mut sink = RecordingSink::default();
    let mut meta = RecordingMetadataSink::default();
    decode(&data, 0, &mut sink, Some(&mut meta), None);

    assert_eq!(meta.calls.len(), 1);
    assert_eq!(meta.calls[0].0, b"NETSCAPE");
    assert_eq!(meta.calls[0].1, b"2.0");
}

/// S6: a stream cut off partway through reports a negative frame count
/// equal in magnitude to however many frames it did manage to decode.
#[test]
fn s6_truncated_stream_reports_negative_count() {
    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(1, 1, 0b1000_0000, 0));
    data.extend(gray_palette(2));
    data.extend(image_descriptor(0, 0, 1, 1, 0));
    data.extend(lzw_encode(2, &[0]));
    // second frame's header present but its LZW data is cut off entirely
    data.extend(image_descriptor(0, 0, 1, 1, 0));
    data.push(2); // minimum code size byte only, no sub-blocks, no trailer

    let mut sink = RecordingSink::default();
    let count = decode(&data, 0, &mut sink, None, None);
    assert_eq!(count, -1);
    assert_eq!(sink.frames.len(), 1);
}

/// `skip` suppresses sink calls for the leading frames but doesn't change
/// the reported total.
#[test]
fn skip_suppresses_leading_frames_without_changing_the_count() {
    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(1, 1, 0b1000_0000, 0));
    data.extend(gray_palette(2));
    for v in [0u8, 1, 0] {
        data.extend(image_descriptor(0, 0, 1, 1, 0));
        data.extend(lzw_encode(2, &[v]));
    }
    data.push(0x3B);

    let mut sink = RecordingSink::default();
    let count = decode(&data, 2, &mut sink, None, None);
    assert_eq!(count, 3);
    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.frames[0].0, 2); // frame_index is absolute, not relative to skip
}

/// Resumption: decoding a truncated prefix reports how many frames it
/// managed to deliver; feeding the *full* buffer back in with `skip` set
/// to that count picks up exactly where the truncated call left off.
#[test]
fn resuming_after_truncation_picks_up_where_it_left_off() {
    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(1, 1, 0b1000_0000, 0));
    data.extend(gray_palette(2));
    for v in [0u8, 1, 0, 1] {
        data.extend(image_descriptor(0, 0, 1, 1, 0));
        data.extend(lzw_encode(2, &[v]));
    }
    data.push(0x3B);

    // truncate partway through the third frame's LZW data.
    let cut = data.len() - 10;
    let prefix = &data[..cut];

    let mut first_sink = RecordingSink::default();
    let partial_count = decode(prefix, 0, &mut first_sink, None, None);
    assert!(partial_count <= 0);
    let delivered = first_sink.frames.len();
    assert_eq!(partial_count, -(delivered as i64));

    let mut second_sink = RecordingSink::default();
    let full_count = decode(&data, delivered as i64, &mut second_sink, None, None);
    assert!(full_count > 0);
    assert_eq!(second_sink.frames.len(), full_count as usize - delivered);
    assert_eq!(second_sink.frames[0].0, delivered);
}

/// A negative `skip` is rejected outright, regardless of how well-formed
/// the rest of the stream is.
#[test]
fn negative_skip_returns_zero() {
    let mut data = b"GIF87a".to_vec();
    data.extend(global_descriptor(1, 1, 0, 0));
    data.push(0x3B);

    let mut sink = RecordingSink::default();
    assert_eq!(decode(&data, -1, &mut sink, None, None), 0);
    assert!(sink.frames.is_empty());
}

/// A non-GIF signature is rejected without reading anything further.
#[test]
fn invalid_signature_returns_zero() {
    let data = b"PNG\x89\x50\x4E\x47".to_vec();
    let mut sink = RecordingSink::default();
    assert_eq!(decode(&data, 0, &mut sink, None, None), 0);
}

/// A frame with neither a local nor a global palette is dropped: it isn't
/// delivered to the sink and doesn't count towards the total.
#[test]
fn frame_without_any_palette_is_dropped() {
    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(1, 2, 0, 0)); // no global palette
    data.extend(image_descriptor(0, 0, 1, 1, 0)); // no local palette either
    data.extend(lzw_encode(2, &[0]));
    data.extend(image_descriptor(0, 1, 1, 1, 0b1000_0000)); // this one has its own palette
    data.extend(gray_palette(2));
    data.extend(lzw_encode(2, &[1]));
    data.push(0x3B);

    let mut sink = RecordingSink::default();
    let count = decode(&data, 0, &mut sink, None, None);
    assert_eq!(count, 1);
    assert_eq!(sink.frames[0].0, 0);
}

/// spec.md §4.5: a set user-input bit forces disposal to NONE even though
/// the GCE's own disposal bits ask for something else.
#[test]
fn gce_user_input_bit_forces_disposal_to_none() {
    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(1, 1, 0b1000_0000, 0));
    data.extend(gray_palette(2));
    // disposal bits 010 (background) << 2, user-input bit (0b10) also set
    data.extend(gce(0b0000_1010, 0, 0));
    data.extend(image_descriptor(0, 0, 1, 1, 0));
    data.extend(lzw_encode(2, &[0]));
    data.push(0x3B);

    let mut sink = RecordingSink::default();
    decode(&data, 0, &mut sink, None, None);
    assert_eq!(sink.frames[0].3, Disposal::None);
}

/// The frame descriptor's `total_frames` field carries the same value
/// `decode` returns, including its sign for a truncated stream.
#[test]
fn frame_descriptor_carries_the_same_total_frames_decode_returns() {
    #[derive(Default)]
    struct TotalsSink {
        totals: Vec<i64>,
    }
    impl FrameSink for TotalsSink {
        fn frame(&mut self, f: &FrameDescriptor) {
            self.totals.push(f.total_frames);
        }
    }

    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(1, 1, 0b1000_0000, 0));
    data.extend(gray_palette(2));
    data.extend(image_descriptor(0, 0, 1, 1, 0));
    data.extend(lzw_encode(2, &[0]));
    data.extend(image_descriptor(0, 0, 1, 1, 0));
    data.push(2); // truncated: min code size only, no sub-blocks, no trailer

    let mut sink = TotalsSink::default();
    let count = decode(&data, 0, &mut sink, None, None);
    assert_eq!(count, -1);
    assert_eq!(sink.totals, vec![-1]);
}

/// spec.md §8 property 10: a caller-supplied allocator is invoked exactly
/// twice per `decode` call — once to allocate, once to free.
#[test]
fn caller_supplied_allocator_is_invoked_exactly_twice() {
    struct CountingAllocator {
        allocate_calls: std::cell::Cell<u32>,
        free_calls: std::cell::Cell<u32>,
    }
    impl Allocator for CountingAllocator {
        fn allocate(&self, size: usize) -> Vec<u8> {
            self.allocate_calls.set(self.allocate_calls.get() + 1);
            vec![0u8; size]
        }
        fn free(&self, buf: Vec<u8>) {
            self.free_calls.set(self.free_calls.get() + 1);
            drop(buf);
        }
    }

    let mut data = b"GIF87a".to_vec();
    data.extend(global_descriptor(2, 2, 0b1000_0000, 0));
    data.extend(gray_palette(2));
    data.extend(image_descriptor(0, 0, 2, 2, 0));
    data.extend(lzw_encode(2, &[0, 1, 1, 0]));
    data.push(0x3B);

    let allocator = CountingAllocator {
        allocate_calls: std::cell::Cell::new(0),
        free_calls: std::cell::Cell::new(0),
    };
    let mut sink = RecordingSink::default();
    decode(&data, 0, &mut sink, None, Some(&allocator));

    assert_eq!(allocator.allocate_calls.get(), 1);
    assert_eq!(allocator.free_calls.get(), 1);
}

/// A frame rectangle exceeding the logical screen is clipped, not rejected:
/// the stream is still reported as complete (positive count), per property
/// 1 of spec.md §8.
#[test]
fn oversized_frame_rectangle_does_not_cause_a_false_truncation_report() {
    let mut data = b"GIF89a".to_vec();
    data.extend(global_descriptor(2, 2, 0b1000_0000, 0));
    data.extend(gray_palette(2));
    // image rectangle is larger than the 2x2 logical screen
    data.extend(image_descriptor(0, 0, 4, 4, 0));
    data.extend(lzw_encode(2, &[0u8; 16]));
    data.push(0x3B);

    let mut sink = RecordingSink::default();
    let count = decode(&data, 0, &mut sink, None, None);
    assert_eq!(count, 1);
    assert_eq!(sink.frames.len(), 1);
}
