//! The two-pass container walker and the top-level `decode` entry point,
//! `spec.md` §4.5 and §6.
//!
//! Pass one walks the whole stream — extensions, image descriptors, and a
//! full (but throwaway) LZW decode of every frame's pixel data — purely to
//! learn how many frames the stream actually contains and whether it's
//! truncated. Pass two walks it again for real, this time writing into the
//! caller's raster and calling the sinks. The two passes do identical work
//! byte-for-byte (same parser, same `lzw::decode_frame`), which is what
//! lets pass two trust the frame count pass one produced instead of having
//! to reconcile two different notions of "how far did we get."

use log::{debug, trace, warn};

use crate::alloc::{Allocator, DefaultAllocator};
use crate::blocks::skip_sub_blocks;
use crate::cursor::Cursor;
use crate::descriptor::{
    parse_application_extension, parse_frame_header, parse_global_descriptor,
    parse_graphic_control_extension, parse_signature, Disposal, GlobalDescriptor,
    GraphicControlExtension,
};
use crate::error::DecodeError;
use crate::palette::{read_palette, Palette};
use crate::raster::RasterBuffer;
use crate::sink::{FrameDescriptor, FrameSink, MetadataDescriptor, MetadataSink};

const EXTENSION_INTRODUCER: u8 = 0x21;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;
const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
const APPLICATION_LABEL: u8 = 0xFF;
const PLAIN_TEXT_LABEL: u8 = 0x01;
const COMMENT_LABEL: u8 = 0xFE;

/// Named purely for clearer trace output; both are skipped identically to
/// any other unrecognized extension label (`spec.md` §3: "All other
/// extension labels are skipped").
fn trace_extension_label(label: u8) {
    match label {
        PLAIN_TEXT_LABEL => trace!("skipping a plain text extension"),
        COMMENT_LABEL => trace!("skipping a comment extension"),
        _ => trace!("skipping extension label {label:#04x}"),
    }
}

fn skip_image_data(cursor: &mut Cursor) -> Result<(), DecodeError> {
    let _min_code_size = cursor.read_u8()?;
    skip_sub_blocks(cursor)
}

struct CountResult {
    total: u32,
    truncated: bool,
}

/// The dry-run pass: identical control flow to `extract_frames`, but with
/// nowhere for the decoded pixels to go and no sinks to call.
fn count_frames(cursor: &mut Cursor, global: &GlobalDescriptor, global_palette: Option<Palette>) -> CountResult {
    let mut scratch = RasterBuffer::new(global.width.max(1), global.height.max(1));
    let mut total = 0u32;

    loop {
        let tag = match cursor.read_u8() {
            Ok(b) => b,
            Err(_) => return CountResult { total, truncated: true },
        };
        match tag {
            TRAILER => return CountResult { total, truncated: false },
            EXTENSION_INTRODUCER => {
                let label = match cursor.read_u8() {
                    Ok(b) => b,
                    Err(_) => return CountResult { total, truncated: true },
                };
                let result = match label {
                    GRAPHIC_CONTROL_LABEL => parse_graphic_control_extension(cursor).map(|_| ()),
                    APPLICATION_LABEL => parse_application_extension(cursor).map(|_| ()),
                    _ => {
                        trace_extension_label(label);
                        skip_sub_blocks(cursor)
                    }
                };
                if result.is_err() {
                    return CountResult { total, truncated: true };
                }
            }
            IMAGE_SEPARATOR => {
                let header = match parse_frame_header(cursor, global_palette) {
                    Ok(h) => h,
                    Err(_) => return CountResult { total, truncated: true },
                };
                match header.palette {
                    None => {
                        if skip_image_data(cursor).is_err() {
                            return CountResult { total, truncated: true };
                        }
                    }
                    Some(_) => {
                        let (mut dict, mut writer) = scratch.writer_and_dict(
                            header.image.left,
                            header.image.top,
                            header.image.width,
                            header.image.height,
                        );
                        match crate::lzw::decode_frame(cursor, &mut dict, &mut writer) {
                            Ok(_) => total += 1,
                            Err(_) => return CountResult { total, truncated: true },
                        }
                    }
                }
            }
            _ => return CountResult { total, truncated: true },
        }
    }
}

/// The real pass: same walk as `count_frames`, but decoding into `raster`
/// and calling `frame_sink`/`metadata_sink` as it goes.
#[allow(clippy::too_many_arguments)]
fn extract_frames(
    cursor: &mut Cursor,
    global: &GlobalDescriptor,
    global_palette: Option<Palette>,
    skip: u64,
    total_frames: i64,
    raster: &mut RasterBuffer,
    frame_sink: &mut dyn FrameSink,
    mut metadata_sink: Option<&mut dyn MetadataSink>,
) {
    let mut pending_gce: Option<GraphicControlExtension> = None;
    let mut frame_index: u64 = 0;

    loop {
        let tag = match cursor.read_u8() {
            Ok(b) => b,
            Err(_) => {
                debug!("extraction pass stopped: ran out of input");
                return;
            }
        };
        match tag {
            TRAILER => return,
            EXTENSION_INTRODUCER => {
                let label = match cursor.read_u8() {
                    Ok(b) => b,
                    Err(_) => return,
                };
                match label {
                    GRAPHIC_CONTROL_LABEL => match parse_graphic_control_extension(cursor) {
                        Ok(gce) => pending_gce = Some(gce),
                        Err(_) => return,
                    },
                    APPLICATION_LABEL => match parse_application_extension(cursor) {
                        Ok(app) => {
                            if let Some(sink) = &mut metadata_sink {
                                sink.metadata(&MetadataDescriptor {
                                    identifier: app.identifier(),
                                    authentication_code: app.authentication_code(),
                                    sub_blocks: app.sub_blocks(),
                                });
                            }
                        }
                        Err(_) => return,
                    },
                    _ => {
                        trace_extension_label(label);
                        if skip_sub_blocks(cursor).is_err() {
                            return;
                        }
                    }
                }
            }
            IMAGE_SEPARATOR => {
                let header = match parse_frame_header(cursor, global_palette) {
                    Ok(h) => h,
                    Err(_) => return,
                };
                let gce = pending_gce.take().unwrap_or_default();

                let palette = match header.palette {
                    Some(p) => p,
                    None => {
                        warn!("dropping a frame with no local or global palette");
                        if skip_image_data(cursor).is_err() {
                            return;
                        }
                        continue;
                    }
                };

                let (mut dict, mut writer) = raster.writer_and_dict(
                    header.image.left,
                    header.image.top,
                    header.image.width,
                    header.image.height,
                );
                let warning = match crate::lzw::decode_frame(cursor, &mut dict, &mut writer) {
                    Ok(warning) => warning,
                    Err(e) => {
                        warn!("stopping extraction: {e}");
                        return;
                    }
                };
                if let Some(w) = warning {
                    warn!("frame {frame_index} decoded with a warning: {w:?}");
                }

                if frame_index >= skip {
                    // spec.md §4.5: a set user-input bit forces disposal to
                    // NONE regardless of the GCE's own disposal bits.
                    let disposal = if gce.user_input { Disposal::None } else { gce.disposal };
                    let descriptor = FrameDescriptor {
                        screen_width: global.width,
                        screen_height: global.height,
                        palette,
                        background_color_index: global.background_color_index,
                        transparent_index: gce.transparent_index,
                        disposal,
                        interlace: header.image.interlace,
                        left: header.image.left,
                        top: header.image.top,
                        width: header.image.width,
                        height: header.image.height,
                        delay: gce.delay,
                        frame_index: frame_index as usize,
                        raster: raster.as_bytes(),
                        warning,
                        total_frames,
                    };
                    debug!("delivering frame {frame_index} of {total_frames}");
                    frame_sink.frame(&descriptor);
                }
                frame_index += 1;
            }
            _ => return,
        }
    }
}

/// Decodes `data` as a GIF87a/GIF89a stream, delivering frames at or past
/// `skip` to `frame_sink` and, if present, Application Extensions to
/// `metadata_sink`.
///
/// `allocator` supplies the combined raster-plus-dictionary buffer used by
/// the extraction pass; pass `None` to use the global allocator. Per
/// `spec.md` §8 property 10, a caller-supplied allocator is invoked exactly
/// twice per call: once via `allocate` to obtain the buffer, once via
/// `free` to release it. The counting pass's throwaway scratch buffer
/// always uses the global allocator, never the caller's, since it's
/// discarded before `decode` returns.
///
/// `spec.md` §6: returns `0` if `data` isn't a recognizable GIF signature
/// or `skip` is negative. Otherwise returns the number of frames the
/// stream contains, as a positive count for a clean stream or the negation
/// of that count if the stream was truncated partway through.
pub fn decode(
    data: &[u8],
    skip: i64,
    frame_sink: &mut dyn FrameSink,
    metadata_sink: Option<&mut dyn MetadataSink>,
    allocator: Option<&dyn Allocator>,
) -> i64 {
    if skip < 0 {
        return 0;
    }

    let mut cursor = Cursor::new(data);
    if parse_signature(&mut cursor).is_err() {
        return 0;
    }
    let global = match parse_global_descriptor(&mut cursor) {
        Ok(g) => g,
        Err(_) => return 0,
    };
    let global_palette = if global.global_palette_present {
        match read_palette(&mut cursor, global.global_palette_color_count()) {
            Ok(p) => Some(p),
            Err(_) => return 0,
        }
    } else {
        None
    };

    let mut counting_cursor = cursor;
    let count_result = count_frames(&mut counting_cursor, &global, global_palette);
    let total_frames: i64 = if count_result.truncated {
        -(count_result.total as i64)
    } else {
        count_result.total as i64
    };
    debug!(
        "counting pass: {} frame(s), truncated = {}",
        count_result.total, count_result.truncated
    );

    let default_allocator = DefaultAllocator;
    let allocator = allocator.unwrap_or(&default_allocator);

    let mut raster = RasterBuffer::with_allocator(global.width, global.height, allocator);
    extract_frames(
        &mut cursor,
        &global,
        global_palette,
        skip as u64,
        total_frames,
        &mut raster,
        frame_sink,
        metadata_sink,
    );
    allocator.free(raster.into_storage());

    total_frames
}
