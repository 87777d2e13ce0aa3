//! The LZW decompressor, `spec.md` §4.3 (bit reader) and §4.4 (dictionary
//! and expansion). This is the core of the decoder: everything upstream
//! exists to hand this module a minimum-code-size byte and a sub-block
//! chain, and everything downstream exists to place its output.
//!
//! Grounded on the shape of `pcwalton-rust-media`'s `ParseState` /
//! `decompress_input` / `get_prefix_char` in `containers/gif.rs`: a
//! shift-register bit reader over the sub-block chain, a flat dictionary
//! array addressed by code value, and a prefix-chain walk (rather than a
//! recursive data structure) to resolve both a code's full expansion and
//! its first byte. The dictionary's cell layout is `spec.md`'s own: one
//! `u32` per entry rather than the teacher's three parallel arrays, which
//! is the detail `spec.md` §4.4 calls out explicitly ("packs each entry
//! into one machine word").

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeWarning};
use crate::raster::{Dictionary, RasterWriter};

/// One dictionary entry, packed into a single `u32`: bits 31-24 the suffix
/// byte, bits 23-12 the string length minus one, bits 11-0 the prefix code.
/// `spec.md` §4.4: "Dictionary entry encoding ... packs each entry into one
/// machine word: suffix byte, length, and prefix code."
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DictEntry(u32);

impl DictEntry {
    pub fn zero() -> Self {
        DictEntry(0)
    }

    pub(crate) fn new(prefix: u16, length: u16, suffix: u8) -> Self {
        debug_assert!(length >= 1 && length <= 4096);
        debug_assert!(prefix <= 0xFFF);
        let length_minus_one = (length - 1) & 0xFFF;
        let packed =
            ((suffix as u32) << 24) | ((length_minus_one as u32) << 12) | (prefix as u32 & 0xFFF);
        DictEntry(packed)
    }

    /// Reinterprets a raw `u32` (as stored in `Dictionary`'s backing bytes)
    /// as a `DictEntry` without re-validating its fields.
    pub(crate) fn from_raw(raw: u32) -> Self {
        DictEntry(raw)
    }

    pub(crate) fn to_raw(self) -> u32 {
        self.0
    }

    pub(crate) fn suffix(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub(crate) fn length(self) -> u16 {
        (((self.0 >> 12) & 0xFFF) as u16) + 1
    }

    pub(crate) fn prefix(self) -> u16 {
        (self.0 & 0xFFF) as u16
    }
}

/// Walks the prefix chain from `code` down to a literal entry and returns
/// that literal's byte value — the first byte of `code`'s expansion.
/// Grounded on `get_prefix_char` in the teacher's `containers/gif.rs`,
/// which performs the same walk for the same reason: a newly created
/// dictionary entry's suffix is the first byte of the code that extended
/// it, and that byte isn't known without walking back to the root.
fn first_byte(dict: &Dictionary<'_>, mut code: usize, clear_code: usize) -> u8 {
    while code >= clear_code {
        code = dict.get(code).prefix() as usize;
    }
    code as u8
}

/// Expands `code`'s full string into `buf`, writing backward from the end
/// exactly as `spec.md` §4.4 describes ("Expansion walks the prefix chain
/// from tail to head, writing bytes from the end of the output string
/// backward"). Returns the string's length.
fn expand_into(dict: &Dictionary<'_>, code: usize, clear_code: usize, buf: &mut [u8; 4096]) -> usize {
    let total_len = dict.get(code).length() as usize;
    let mut idx = total_len;
    let mut c = code;
    loop {
        idx -= 1;
        if c < clear_code {
            buf[idx] = c as u8;
            break;
        }
        buf[idx] = dict.get(c).suffix();
        c = dict.get(c).prefix() as usize;
    }
    total_len
}

/// Reads fixed-width codes out of a GIF sub-block chain, LSB-first,
/// transparently crossing sub-block boundaries. `spec.md` §4.3: "a shift
/// register wide enough to hold the largest code plus one byte of slack."
/// A `u32` accumulator gives that slack for the 12-bit maximum code width
/// without the teacher's separate 16-bit-register bookkeeping.
struct CodeReader<'a, 'c> {
    cursor: &'c mut Cursor<'a>,
    bit_buffer: u32,
    bits_in_buffer: u32,
    block_remaining: u8,
}

impl<'a, 'c> CodeReader<'a, 'c> {
    fn new(cursor: &'c mut Cursor<'a>) -> Self {
        CodeReader {
            cursor,
            bit_buffer: 0,
            bits_in_buffer: 0,
            block_remaining: 0,
        }
    }

    /// Reads one code of `width` bits. `Ok(None)` means the sub-block chain
    /// ended (a zero-length sub-block was read) before enough bits were
    /// available — `spec.md` §7's "Termination without stop code" case,
    /// which is recoverable rather than fatal.
    fn read_code(&mut self, width: u32) -> Result<Option<u16>, DecodeError> {
        while self.bits_in_buffer < width {
            if self.block_remaining == 0 {
                let len = self.cursor.read_u8()?;
                if len == 0 {
                    return Ok(None);
                }
                self.block_remaining = len;
            }
            let byte = self.cursor.read_u8()?;
            self.bit_buffer |= (byte as u32) << self.bits_in_buffer;
            self.bits_in_buffer += 8;
            self.block_remaining -= 1;
        }
        let mask = (1u32 << width) - 1;
        let code = (self.bit_buffer & mask) as u16;
        self.bit_buffer >>= width;
        self.bits_in_buffer -= width;
        Ok(Some(code))
    }

    /// Called once a stop code has been read. Drains whatever is left of
    /// the in-flight sub-block (padding bits an encoder left unused), then
    /// checks whether the chain terminates cleanly right after. `spec.md`
    /// §7: "consume the following sub-block length byte; if it is zero the
    /// decode is clean-successful; otherwise ... trailing data" (reported
    /// as a warning, not an error).
    fn finish_after_stop(&mut self) -> Result<Option<DecodeWarning>, DecodeError> {
        if self.block_remaining > 0 {
            self.cursor.skip(self.block_remaining as usize)?;
            self.block_remaining = 0;
        }
        let len = self.cursor.read_u8()?;
        if len == 0 {
            return Ok(None);
        }
        self.cursor.skip(len as usize)?;
        crate::blocks::skip_sub_blocks(self.cursor)?;
        Ok(Some(DecodeWarning::TrailingDataAfterStop))
    }
}

/// Decodes one frame's LZW-compressed image data, writing decoded index
/// bytes into `dest` as they're produced. `cursor` must be positioned at
/// the minimum-code-size byte; on return (success or failure) it has been
/// advanced past the whole sub-block chain.
///
/// `dict` is scratch space owned by the caller (`RasterBuffer::writer_and_dict`)
/// so it can be reused across frames without reallocating 16KB per frame.
///
/// Returns `Ok(None)` for a clean decode, `Ok(Some(warning))` for a
/// recoverable one, and `Err` for the fatal conditions in `spec.md` §7.
pub fn decode_frame(
    cursor: &mut Cursor,
    dict: &mut Dictionary<'_>,
    dest: &mut RasterWriter<'_>,
) -> Result<Option<DecodeWarning>, DecodeError> {
    let min_code_size = cursor.read_u8()?;
    if !(2..=8).contains(&min_code_size) {
        return Err(DecodeError::InvalidMinCodeSize(min_code_size));
    }
    let clear_code = 1usize << min_code_size;
    let stop_code = clear_code + 1;

    for i in 0..clear_code {
        dict.set(i, DictEntry::new(0, 1, i as u8));
    }

    let mut reader = CodeReader::new(cursor);
    let base_width = min_code_size as u32 + 1;
    let mut width = base_width;
    let mut mask = (1u32 << width) - 1;
    let mut t = clear_code + 2;

    match reader.read_code(width)? {
        None => return Err(DecodeError::EmptyLzwStream),
        Some(code) => {
            if code as usize != clear_code {
                return Err(DecodeError::MissingInitialClearCode);
            }
        }
    }

    let mut prev: Option<usize> = None;
    let mut buf = [0u8; 4096];

    loop {
        let code = match reader.read_code(width)? {
            None => return Ok(Some(DecodeWarning::MissingStopCode)),
            Some(c) => c as usize,
        };

        if code == clear_code {
            t = clear_code + 2;
            width = base_width;
            mask = (1u32 << width) - 1;
            prev = None;
            continue;
        }

        if code == stop_code {
            return reader.finish_after_stop();
        }

        match prev {
            None => {
                if code >= t {
                    return Err(DecodeError::InvalidLzwCode(code));
                }
                let len = expand_into(&*dict, code, clear_code, &mut buf);
                dest.write(&buf[..len]);
                prev = Some(code);
            }
            Some(prev_code) => {
                let (kwkwk, can_grow) = if t < 4096 {
                    if code > t {
                        return Err(DecodeError::InvalidLzwCode(code));
                    }
                    (code == t, true)
                } else {
                    if code >= t {
                        return Err(DecodeError::InvalidLzwCode(code));
                    }
                    (false, false)
                };

                let suffix_source = if kwkwk { prev_code } else { code };
                let new_suffix = first_byte(&*dict, suffix_source, clear_code);

                if can_grow {
                    let length = dict.get(prev_code).length() as usize + 1;
                    if length > 4096 {
                        return Err(DecodeError::InvalidLzwCode(code));
                    }
                    dict.set(t, DictEntry::new(prev_code as u16, length as u16, new_suffix));
                    t += 1;
                    if width < 12 && t == mask as usize && t < 4095 {
                        width += 1;
                        mask = (mask << 1) | 1;
                    }
                }

                let expand_code = if kwkwk { prev_code } else { code };
                let mut len = expand_into(&*dict, expand_code, clear_code, &mut buf);
                if kwkwk {
                    buf[len] = new_suffix;
                    len += 1;
                }
                dest.write(&buf[..len]);

                prev = Some(code);
            }
        }
    }
}
