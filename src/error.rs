//! Error and warning taxonomy.
//!
//! `spec.md` §7 keeps these internal to the decoder: none of them reach a
//! sink as a distinct call, and the top-level `decode` entry point folds
//! them into the sign of its returned count. They're still given a proper
//! public type here (the way `netvl-immeta::types::Error` and
//! `scarydoors-jif`'s `thiserror`-based errors do) so the lower-level
//! per-component parsers — which callers can use directly instead of going
//! through `decode` — return something typed rather than `Result<T, ()>`.

use thiserror::Error;

/// Fatal conditions that abort the current pass.
///
/// Every variant here corresponds to one of the "Fatal errors" bullets in
/// `spec.md` §4.4 and the error taxonomy in §7.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Not a GIF87a/GIF89a signature, or fewer bytes than the minimum
    /// header requires.
    #[error("not a valid GIF signature")]
    InvalidSignature,

    /// Ran out of input bytes at some parse point. `spec.md` §7: "stop
    /// further frames; return negative count to signal partial."
    #[error("input truncated")]
    Truncated,

    /// Minimum LZW code size outside `[2, 8]`.
    #[error("invalid minimum LZW code size {0}")]
    InvalidMinCodeSize(u8),

    /// The first sub-block of an image's LZW data has length zero.
    #[error("empty LZW data stream")]
    EmptyLzwStream,

    /// The first code read after the minimum-code-size byte was not the
    /// clear code.
    #[error("LZW stream did not open with a clear code")]
    MissingInitialClearCode,

    /// A code referenced a dictionary slot that does not exist yet.
    #[error("LZW code {0} out of range of the current dictionary")]
    InvalidLzwCode(usize),

    /// Neither a local nor a global palette is available for a frame.
    /// `spec.md` §4.2: "a fatal per-frame condition in the extraction pass
    /// (the frame is dropped)."
    #[error("no palette available for this frame")]
    MissingPalette,

    /// `skip` was negative.
    #[error("skip count must not be negative")]
    NegativeSkip,
}

/// Recoverable conditions: the frame is still delivered to the sink, but
/// something about its LZW stream was unusual. `spec.md` §7 calls these out
/// by name ("RECOVERABLE", "optional warning").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeWarning {
    /// The sub-block chain ended (a zero-length sub-block was read) before
    /// a stop code was seen. Pixels decoded so far are kept.
    MissingStopCode,
    /// A stop code was read, but the sub-block chain continued with a
    /// nonzero-length block afterwards.
    TrailingDataAfterStop,
}
