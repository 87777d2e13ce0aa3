//! The sub-block chain skipper (`spec.md` §4.1).
//!
//! A sub-block chain is GIF's framing for variable-length data: a sequence
//! of `(length byte L, L data bytes)` pairs terminated by `L = 0`. This is
//! used for extension payloads the decoder doesn't interpret (plain text,
//! comment, application-extension data) and, with its own exit condition
//! baked into the LZW expander, for LZW-compressed image data.

use crate::cursor::Cursor;
use crate::error::DecodeError;

/// Advances `cursor` past one sub-block chain without interpreting its
/// payload. `spec.md` §4.1: "Post-condition on success: cursor points one
/// past the zero-length terminator."
pub fn skip_sub_blocks(cursor: &mut Cursor) -> Result<(), DecodeError> {
    loop {
        let len = cursor.read_u8()? as usize;
        if len == 0 {
            return Ok(());
        }
        cursor.skip(len)?;
    }
}
