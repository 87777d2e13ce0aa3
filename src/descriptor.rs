//! Header-level block parsing: the global descriptor, a frame's image
//! descriptor (§4.2's "frame-header parser"), the Graphics Control
//! Extension, and the Application Extension's opaque header.

use crate::blocks::skip_sub_blocks;
use crate::cursor::Cursor;
use crate::error::DecodeError;
use crate::palette::{color_count_from_exponent, read_palette, Palette};

/// GIF87a vs. GIF89a. The two versions differ only in which extension
/// blocks are defined; this decoder treats both identically once past the
/// signature check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    Gif87a,
    Gif89a,
}

/// `spec.md` §3: "6-byte signature ("GIF87a" or "GIF89a")".
pub fn parse_signature(cursor: &mut Cursor) -> Result<Version, DecodeError> {
    let sig = cursor.read_array::<6>()?;
    match &sig {
        b"GIF87a" => Ok(Version::Gif87a),
        b"GIF89a" => Ok(Version::Gif89a),
        _ => Err(DecodeError::InvalidSignature),
    }
}

/// The Logical Screen Descriptor, `spec.md` §3 "Global descriptor".
#[derive(Clone, Copy, Debug)]
pub struct GlobalDescriptor {
    pub width: u16,
    pub height: u16,
    pub global_palette_present: bool,
    pub color_resolution: u8,
    pub sort_flag: bool,
    pub palette_size_exponent: u8,
    pub background_color_index: u8,
    pub pixel_aspect_ratio: u8,
}

impl GlobalDescriptor {
    pub fn global_palette_color_count(&self) -> usize {
        if self.global_palette_present {
            color_count_from_exponent(self.palette_size_exponent)
        } else {
            0
        }
    }
}

pub fn parse_global_descriptor(cursor: &mut Cursor) -> Result<GlobalDescriptor, DecodeError> {
    let width = cursor.read_u16_le()?;
    let height = cursor.read_u16_le()?;
    let flags = cursor.read_u8()?;
    let background_color_index = cursor.read_u8()?;
    let pixel_aspect_ratio = cursor.read_u8()?;

    Ok(GlobalDescriptor {
        width,
        height,
        global_palette_present: flags & 0b1000_0000 != 0,
        color_resolution: (flags & 0b0111_0000) >> 4,
        sort_flag: flags & 0b0000_1000 != 0,
        palette_size_exponent: flags & 0b0000_0111,
        background_color_index,
        pixel_aspect_ratio,
    })
}

/// One frame's Image Descriptor, `spec.md` §3 "Frame image block". The tag
/// byte `0x2C` has already been consumed by the container walker.
#[derive(Clone, Copy, Debug)]
pub struct ImageDescriptor {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub local_palette_present: bool,
    pub interlace: bool,
    pub sort_flag: bool,
    pub palette_size_exponent: u8,
}

fn parse_image_descriptor(cursor: &mut Cursor) -> Result<ImageDescriptor, DecodeError> {
    let left = cursor.read_u16_le()?;
    let top = cursor.read_u16_le()?;
    let width = cursor.read_u16_le()?;
    let height = cursor.read_u16_le()?;
    let flags = cursor.read_u8()?;

    Ok(ImageDescriptor {
        left,
        top,
        width,
        height,
        local_palette_present: flags & 0b1000_0000 != 0,
        interlace: flags & 0b0100_0000 != 0,
        sort_flag: flags & 0b0010_0000 != 0,
        palette_size_exponent: flags & 0b0000_0111,
    })
}

/// Result of the frame-header parser (`spec.md` §4.2): the image descriptor
/// plus whichever palette — local or global — is active for this frame.
/// `palette` is `None` when neither is available, which §4.2 calls "a fatal
/// per-frame condition" the extraction pass must handle by dropping the
/// frame, not by erroring out here.
pub struct FrameHeader<'a> {
    pub image: ImageDescriptor,
    pub palette: Option<Palette<'a>>,
}

/// Reads the image descriptor and, if present, the local palette that
/// follows it; otherwise falls back to `global_palette`. Does not touch the
/// LZW data that follows (minimum-code-size byte onward) — that is read
/// separately by the LZW expander once the caller has decided whether to
/// skip or decode this frame.
pub fn parse_frame_header<'a>(
    cursor: &mut Cursor<'a>,
    global_palette: Option<Palette<'a>>,
) -> Result<FrameHeader<'a>, DecodeError> {
    let image = parse_image_descriptor(cursor)?;

    let palette = if image.local_palette_present {
        let count = color_count_from_exponent(image.palette_size_exponent);
        Some(read_palette(cursor, count)?)
    } else {
        global_palette
    };

    Ok(FrameHeader { image, palette })
}

/// `spec.md` §9: the four-state disposal the original encoded as a
/// sentinel-valued pointer. Values 4-7 of the packed 3-bit field are
/// undefined by the GIF89a spec; this decoder treats them as `None` rather
/// than rejecting the frame (see DESIGN.md's open-question log).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Disposal {
    #[default]
    None,
    Keep,
    Background,
    RestorePrevious,
}

impl Disposal {
    fn from_bits(bits: u8) -> Disposal {
        match bits {
            0 => Disposal::None,
            1 => Disposal::Keep,
            2 => Disposal::Background,
            3 => Disposal::RestorePrevious,
            _ => Disposal::None,
        }
    }
}

/// The Graphics Control Extension (label `0xF9`). Applies to exactly the
/// next image block encountered (`spec.md` §3).
#[derive(Clone, Copy, Debug)]
pub struct GraphicControlExtension {
    pub disposal: Disposal,
    pub user_input: bool,
    pub transparent_index: Option<u8>,
    pub delay: u16,
}

impl Default for GraphicControlExtension {
    /// `spec.md` §3: "if none has been seen, defaults are: delay 0,
    /// transparent index -1, disposal NONE."
    fn default() -> Self {
        GraphicControlExtension {
            disposal: Disposal::None,
            user_input: false,
            transparent_index: None,
            delay: 0,
        }
    }
}

/// Parses a GCE block. The label byte (`0xF9`) has already been consumed.
pub fn parse_graphic_control_extension(
    cursor: &mut Cursor,
) -> Result<GraphicControlExtension, DecodeError> {
    let block_size = cursor.read_u8()? as usize;
    if block_size < 4 {
        return Err(DecodeError::Truncated);
    }
    let payload = cursor.read_slice(block_size)?;
    let flags = payload[0];
    let delay = u16::from_le_bytes([payload[1], payload[2]]);
    let transparent_index = if flags & 0b0000_0001 != 0 {
        Some(payload[3])
    } else {
        None
    };
    let disposal = Disposal::from_bits((flags & 0b0001_1100) >> 2);
    let user_input = flags & 0b0000_0010 != 0;

    // the GCE is itself a one-block sub-block chain; consume its terminator
    // (and, leniently, anything unexpected that follows it).
    skip_sub_blocks(cursor)?;

    Ok(GraphicControlExtension {
        disposal,
        user_input,
        transparent_index,
        delay,
    })
}

/// An Application Extension's opaque payload: an 11-byte identifier/
/// authentication header followed by its own sub-block chain, which this
/// decoder does not interpret (`spec.md` §3). `raw` spans exactly that
/// region — header plus chain, terminator included — so a metadata sink
/// can walk it on its own without reading into unrelated parts of the GIF.
#[derive(Clone, Copy, Debug)]
pub struct ApplicationExtension<'a> {
    pub raw: &'a [u8],
}

impl<'a> ApplicationExtension<'a> {
    /// The 8-byte application identifier, e.g. `b"NETSCAPE"`.
    pub fn identifier(&self) -> &'a [u8] {
        &self.raw[1..9]
    }

    /// The 3-byte authentication code, e.g. `b"2.0"`.
    pub fn authentication_code(&self) -> &'a [u8] {
        &self.raw[9..12]
    }

    /// The application's own sub-block chain, header stripped.
    pub fn sub_blocks(&self) -> &'a [u8] {
        &self.raw[12..]
    }
}

/// Parses an Application Extension. The label byte (`0xFF`) has already
/// been consumed. Always advances `cursor` past the whole block, regardless
/// of whether a metadata sink ends up using the result (`spec.md` §4.5:
/// "Then skip the extension's sub-block chain regardless.").
pub fn parse_application_extension<'a>(
    cursor: &mut Cursor<'a>,
) -> Result<ApplicationExtension<'a>, DecodeError> {
    let start = cursor.position();
    let _block_size = cursor.read_u8()?;
    cursor.skip(8 + 3)?; // identifier + authentication code
    skip_sub_blocks(cursor)?;
    let end = cursor.position();
    Ok(ApplicationExtension {
        raw: cursor.slice(start, end),
    })
}
