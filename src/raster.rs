//! The indexed-pixel raster that frames are decoded into, and the scratch
//! space the LZW expander needs alongside it.
//!
//! `spec.md` §9: "the source computes `dictionary = raster_ptr −
//! 4096·sizeof(entry)`, relying on a single allocation whose first 16384
//! bytes are dictionary and whose remainder is raster ... preserve the
//! single-allocation property for locality if desired." This keeps that
//! single allocation — obtained from the caller's `Allocator` — and splits
//! it into two named byte ranges rather than reaching for raw pointer
//! arithmetic across them, which is the safe-Rust equivalent of the same
//! trick.

use crate::alloc::{Allocator, DefaultAllocator};
use crate::lzw::DictEntry;

/// Bytes of dictionary scratch that precede the raster in the combined
/// allocation: 4096 entries, 4 bytes (one `u32`) each.
const DICT_BYTES: usize = 4096 * 4;

/// Owns the logical-screen-sized indexed-pixel buffer delivered to the
/// frame sink, plus the 4096-entry LZW dictionary reused across frames —
/// both carved out of one allocation obtained from an `Allocator`.
///
/// Allocated once per `decode` call and reused for every frame in the
/// stream; only each frame's own rectangle is freshly written between
/// calls, exactly as `spec.md`'s frame descriptor documents ("only the
/// frame rectangle is freshly written; remaining area is caller-managed").
pub struct RasterBuffer {
    storage: Vec<u8>,
    width: usize,
    height: usize,
}

impl RasterBuffer {
    /// Allocates through the global allocator. Equivalent to
    /// `with_allocator(width, height, &DefaultAllocator)`.
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_allocator(width, height, &DefaultAllocator)
    }

    /// Allocates the combined dictionary-scratch-plus-raster region through
    /// `allocator` in a single call, per `spec.md` §5's "invoked at most
    /// twice per call: once to allocate, once to free." Pairs with
    /// `into_storage`, which the caller passes back to `allocator.free`.
    pub fn with_allocator(width: u16, height: u16, allocator: &dyn Allocator) -> Self {
        let width = width as usize;
        let height = height as usize;
        let storage = allocator.allocate(DICT_BYTES + width * height);
        debug_assert_eq!(storage.len(), DICT_BYTES + width * height);
        RasterBuffer { storage, width, height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.storage[DICT_BYTES..]
    }

    /// Hands the whole backing allocation back to the caller, who is
    /// expected to pass it to the same `Allocator`'s `free`.
    pub(crate) fn into_storage(self) -> Vec<u8> {
        self.storage
    }

    /// A writer that clips `(left, top, width, height)` to the raster's own
    /// bounds and fills that sub-rectangle in row-major order.
    ///
    /// `spec.md` §9's open question on frames exceeding the logical screen
    /// is resolved here by clipping (see DESIGN.md): rows or columns that
    /// fall outside the screen are simply never written, rather than
    /// erroring or growing the raster.
    pub fn writer(&mut self, left: u16, top: u16, width: u16, height: u16) -> RasterWriter<'_> {
        let (x0, y0, w, h) = clip(self.width, self.height, left, top, width, height);
        let stride = self.width;
        RasterWriter {
            raster: &mut self.storage[DICT_BYTES..],
            stride,
            x: x0,
            y: y0,
            width: w,
            height: h,
            row: 0,
            col: 0,
        }
    }

    /// Like `writer`, but also hands back the dictionary scratch space —
    /// needed wherever a caller must borrow both at once to drive
    /// `lzw::decode_frame`, which takes them as two separate parameters.
    pub(crate) fn writer_and_dict(
        &mut self,
        left: u16,
        top: u16,
        width: u16,
        height: u16,
    ) -> (Dictionary<'_>, RasterWriter<'_>) {
        let (x0, y0, w, h) = clip(self.width, self.height, left, top, width, height);
        let stride = self.width;
        let (dict_bytes, pixels) = self.storage.split_at_mut(DICT_BYTES);
        let writer = RasterWriter {
            raster: pixels,
            stride,
            x: x0,
            y: y0,
            width: w,
            height: h,
            row: 0,
            col: 0,
        };
        (Dictionary::new(dict_bytes), writer)
    }
}

fn clip(
    raster_width: usize,
    raster_height: usize,
    left: u16,
    top: u16,
    width: u16,
    height: u16,
) -> (usize, usize, usize, usize) {
    let x0 = (left as usize).min(raster_width);
    let y0 = (top as usize).min(raster_height);
    let w = (width as usize).min(raster_width.saturating_sub(x0));
    let h = (height as usize).min(raster_height.saturating_sub(y0));
    (x0, y0, w, h)
}

/// A byte-backed view of the 4096-entry LZW dictionary, one `u32` per
/// entry. Carved out of `RasterBuffer`'s single allocation (`spec.md` §9)
/// rather than living in its own `Vec`/`Box`.
pub struct Dictionary<'a> {
    bytes: &'a mut [u8],
}

impl<'a> Dictionary<'a> {
    fn new(bytes: &'a mut [u8]) -> Self {
        debug_assert_eq!(bytes.len(), DICT_BYTES);
        Dictionary { bytes }
    }

    pub fn get(&self, index: usize) -> DictEntry {
        let i = index * 4;
        let raw = u32::from_le_bytes(self.bytes[i..i + 4].try_into().unwrap());
        DictEntry::from_raw(raw)
    }

    pub fn set(&mut self, index: usize, entry: DictEntry) {
        let i = index * 4;
        self.bytes[i..i + 4].copy_from_slice(&entry.to_raw().to_le_bytes());
    }
}

/// A sequential write cursor over one frame's rectangle within the full
/// raster. `spec.md` §4.4 describes the LZW expander as advancing "the
/// raster pointer" forward by each decoded string's length; this is that
/// pointer, generalized to wrap at the end of each row of the rectangle
/// rather than assuming the frame spans the whole raster width.
///
/// Bytes are accepted in whatever order the LZW bitstream produces them.
/// For an interlaced image that is the interlaced scan order, not true
/// top-to-bottom row order — `spec.md` §2 is explicit that deinterlacing
/// is the caller's job, so this writer never reorders rows itself.
pub struct RasterWriter<'r> {
    raster: &'r mut [u8],
    stride: usize,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    row: usize,
    col: usize,
}

impl<'r> RasterWriter<'r> {
    /// Writes as many of `bytes` as still fit within the clipped rectangle,
    /// silently discarding the rest. A frame rectangle that exceeds the
    /// logical screen is clipped, not rejected (DESIGN.md open question 2);
    /// a well-formed LZW stream decoded against the clipped rectangle can
    /// legitimately produce more bytes than the visible area holds.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.row >= self.height || self.width == 0 {
                return;
            }
            let offset = (self.y + self.row) * self.stride + self.x + self.col;
            self.raster[offset] = b;
            self.col += 1;
            if self.col == self.width {
                self.col = 0;
                self.row += 1;
            }
        }
    }
}
