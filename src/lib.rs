//! A streaming decoder for GIF87a/GIF89a.
//!
//! This crate parses the GIF container, LZW-decompresses each frame's
//! pixel data, and delivers indexed pixels and per-frame metadata to
//! caller-supplied sinks as it goes — it never builds an owned list of
//! frames or composites them into RGBA itself. Compositing, disposal
//! handling, and deinterlacing are all left to the caller; see the
//! `sink` module for the shape that takes.
//!
//! ```
//! use gifwalk::{decode, sink::{FrameDescriptor, FrameSink}};
//!
//! struct CountingSink(u32);
//! impl FrameSink for CountingSink {
//!     fn frame(&mut self, _frame: &FrameDescriptor) {
//!         self.0 += 1;
//!     }
//! }
//!
//! // "GIF87a", 1x1 screen with no global palette, immediate trailer.
//! let data = b"GIF87a\x01\x00\x01\x00\x00\x00\x00\x3B";
//! let mut sink = CountingSink(0);
//! let count = decode(data, 0, &mut sink, None, None);
//! assert_eq!(count, 0);
//! ```

pub mod alloc;
mod blocks;
mod cursor;
pub mod descriptor;
pub mod error;
mod lzw;
pub mod palette;
pub mod raster;
pub mod sink;
mod walker;

pub use error::{DecodeError, DecodeWarning};
pub use walker::decode;
