//! The allocator hook, `spec.md` §9: "Memory is obtained through an
//! allocator hook passed in by the caller, not directly from the system
//! allocator, so that embedders can supply arena or pool allocation."
//!
//! A C API expresses this as a pair of function pointers plus a context
//! pointer threaded through every call; the same policy-object idea in
//! Rust is a trait object the caller supplies once up front.

/// A pluggable allocation policy for the one buffer `decode` needs: the
/// combined raster + LZW dictionary scratch region (`raster::RasterBuffer`).
/// `spec.md` §5: "Allocation is via a single allocator hook ... with the
/// contract `alloc(ptr, size, op)` where op=1 allocates/resizes and op=0
/// frees ... invoked at most twice per call: once to allocate, once to
/// free." `allocate`/`free` are that same two-operation contract split into
/// two methods instead of one function with an op flag.
///
/// The default implementation defers to the global allocator. Callers
/// embedding this decoder in an arena or a pool can supply their own; see
/// `decode`'s `allocator` parameter.
pub trait Allocator {
    fn allocate(&self, size: usize) -> Vec<u8> {
        vec![0u8; size]
    }

    fn free(&self, buf: Vec<u8>) {
        drop(buf);
    }
}

/// The allocator used when the caller doesn't supply one: the ordinary
/// global allocator, via `Vec`.
#[derive(Default, Clone, Copy, Debug)]
pub struct DefaultAllocator;

impl Allocator for DefaultAllocator {}
