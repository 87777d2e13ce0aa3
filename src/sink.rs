//! The push-based sink interface, `spec.md` §5: "the decoder does not
//! return a collection of frames; it calls back into caller-supplied sinks
//! once per frame (and once per recognized metadata block)."
//!
//! The C shape is two function pointers plus a `void *` context threaded
//! through every call. The idiomatic Rust shape is two traits: callers
//! implement `FrameSink` (mandatory) and optionally `MetadataSink`, and
//! `decode` takes `&mut` references to them rather than raw callbacks.

use crate::descriptor::Disposal;
use crate::error::DecodeWarning;
use crate::palette::Palette;

/// Everything the caller needs to place and interpret one decoded frame.
/// Borrows into the raster and palette that the extraction pass owns, so
/// it only lives for the duration of one `FrameSink::frame` call.
#[derive(Clone, Copy, Debug)]
pub struct FrameDescriptor<'a> {
    /// Logical screen dimensions, `spec.md` §3's global descriptor.
    pub screen_width: u16,
    pub screen_height: u16,

    /// The active palette for this frame (local, or global as fallback)
    /// and its color count. `spec.md` §4.2: "a frame descriptor carries a
    /// palette pointer and a color count, not an owned copy."
    pub palette: Palette<'a>,

    pub background_color_index: u8,
    /// `None` if the Graphics Control Extension didn't set the
    /// transparency flag, or if no GCE preceded this frame.
    pub transparent_index: Option<u8>,

    /// How this frame should be disposed of before the next one is drawn.
    pub disposal: Disposal,

    pub interlace: bool,

    /// This frame's rectangle within the logical screen.
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,

    /// Hundredths of a second, from the Graphics Control Extension (0 if
    /// none preceded this frame).
    pub delay: u16,

    /// 0-based position of this frame among all frames in the stream.
    pub frame_index: usize,

    /// The same total-frame-count value `decode` will return for this
    /// call: positive for a clean stream, negative if the counting pass
    /// found the stream truncated. `spec.md` §7: "the partial condition is
    /// encoded ... in the sign of the `total frame count` field of the
    /// descriptor," so a sink can tell a truncated stream apart from a
    /// complete one without waiting for `decode` to return.
    pub total_frames: i64,

    /// Decoded indexed pixels for the *whole logical screen*, not just
    /// this frame's rectangle — `spec.md` §9: "only the frame rectangle is
    /// freshly written; remaining area is caller-managed," i.e. the
    /// composite of previous frames under whatever disposal policy the
    /// caller implements.
    pub raster: &'a [u8],

    /// Set if this frame's LZW stream ended without a stop code or with
    /// trailing data after one. `spec.md` §7: delivered to the sink rather
    /// than aborting the pass.
    pub warning: Option<DecodeWarning>,
}

/// Receives one call per decoded frame, in order, starting from frame
/// `skip`. `spec.md` §6: "one call per decoded frame (those at or past
/// `skip`)."
pub trait FrameSink {
    fn frame(&mut self, frame: &FrameDescriptor);
}

/// An Application Extension's identifying header and raw sub-block chain.
/// `spec.md` §3: kept opaque — this decoder recognizes the block type but
/// does not interpret known identifiers like `NETSCAPE2.0` specially.
#[derive(Clone, Copy, Debug)]
pub struct MetadataDescriptor<'a> {
    pub identifier: &'a [u8],
    pub authentication_code: &'a [u8],
    /// The sub-block chain's raw bytes, length-prefixes and terminator
    /// included, exactly as it appears in the file.
    pub sub_blocks: &'a [u8],
}

/// Receives one call per Application Extension encountered, in container
/// order. Optional: callers that don't care about metadata can skip
/// implementing this and pass `None` to `decode`.
pub trait MetadataSink {
    fn metadata(&mut self, metadata: &MetadataDescriptor);
}
