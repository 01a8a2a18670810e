//! Top-level container, block dispatcher and header/palette parsing.

use log::trace;

use crate::color_table::ColorTable;
use crate::cursor::Cursor;
use crate::error::{bad_data, Result};
use crate::frame::{DisposalMethod, GraphicControl};
use crate::image::Image;
use crate::{interlace, lzw};

const IMAGE_SEPARATOR: u8 = 0x2C;
const EXTENSION_INTRODUCER: u8 = 0x21;
const TRAILER: u8 = 0x3B;

const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;

/// GIF file version, from the header signature.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Version {
    Gif87a,
    Gif89a,
}

/// A fully decoded GIF: logical screen, optional global palette, and the
/// ordered sequence of frames.
#[derive(Clone, PartialEq, Debug)]
pub struct Gif {
    pub version: Version,
    pub width: u16,
    pub height: u16,
    /// Only meaningful when `global_color_table` is `Some`.
    pub bg_index: u8,
    pub global_color_table: Option<ColorTable>,
    pub images: Vec<Image>,
}

impl Default for Gif {
    fn default() -> Self {
        Gif {
            version: Version::Gif89a,
            width: 0,
            height: 0,
            bg_index: 0,
            global_color_table: None,
            images: Vec::new(),
        }
    }
}

impl Gif {
    /// Parses a complete GIF87a/GIF89a byte buffer.
    ///
    /// On any error, nothing is returned but `Err`; there is no partial
    /// `Gif` for the caller to observe.
    pub fn parse(data: &[u8]) -> Result<Gif> {
        let mut cursor = Cursor::new(data);
        let mut gif = Gif::default();
        parse_header(&mut cursor, &mut gif)?;
        parse_blocks(&mut cursor, &mut gif)?;
        Ok(gif)
    }

    /// Releases this container's images and color tables, returning it to
    /// the empty state. Idempotent on an already-empty container; an
    /// ordinary scope exit achieves the same effect via `Drop`.
    pub fn clear(&mut self) {
        *self = Gif::default();
    }
}

fn parse_header(cursor: &mut Cursor, gif: &mut Gif) -> Result<()> {
    cursor.require(13)?;

    let signature_ok = cursor.u8_at(0) == b'G'
        && cursor.u8_at(1) == b'I'
        && cursor.u8_at(2) == b'F'
        && cursor.u8_at(3) == b'8'
        && cursor.u8_at(5) == b'a';
    let version = match (signature_ok, cursor.u8_at(4)) {
        (true, b'7') => Version::Gif87a,
        (true, b'9') => Version::Gif89a,
        _ => return Err(bad_data!("not a GIF87a/GIF89a signature")),
    };

    let width = cursor.u16_le_at(6);
    let height = cursor.u16_le_at(8);
    let packed = cursor.u8_at(10);
    let bg_index = cursor.u8_at(11);
    // Byte 12, pixel aspect ratio, carries no normative effect on decoding.
    cursor.advance(13)?;

    gif.version = version;
    gif.width = width;
    gif.height = height;
    gif.bg_index = bg_index;

    if packed & 0x80 != 0 {
        let num_colors = 1usize << ((packed & 0x07) + 1);
        if bg_index as usize >= num_colors {
            return Err(bad_data!(
                "background color index {} out of range for a {}-color global table",
                bg_index,
                num_colors
            ));
        }
        gif.global_color_table = Some(read_color_table(cursor, num_colors)?);
    }

    Ok(())
}

fn read_color_table(cursor: &mut Cursor, num_colors: usize) -> Result<ColorTable> {
    let n = num_colors * 3;
    cursor.require(n)?;
    let table = ColorTable::from_bytes(cursor.slice_at(0, n));
    cursor.advance(n)?;
    Ok(table)
}

fn parse_blocks(cursor: &mut Cursor, gif: &mut Gif) -> Result<()> {
    let mut pending: Option<GraphicControl> = None;

    loop {
        cursor.require(1)?;
        let separator = cursor.u8_at(0);
        cursor.advance(1)?;

        match separator {
            IMAGE_SEPARATOR => {
                trace!("image descriptor at offset {}", cursor.pos() - 1);
                let image = parse_image(cursor, gif, pending.take())?;
                gif.images.push(image);
            }
            EXTENSION_INTRODUCER => {
                trace!("extension introducer at offset {}", cursor.pos() - 1);
                parse_extension(cursor, &mut pending)?;
            }
            TRAILER => {
                trace!("trailer, {} image(s) decoded", gif.images.len());
                return Ok(());
            }
            other => return Err(bad_data!("unknown block separator 0x{:02X}", other)),
        }
    }
}

fn parse_image(
    cursor: &mut Cursor,
    gif: &Gif,
    graphic_control: Option<GraphicControl>,
) -> Result<Image> {
    cursor.require(9)?;
    let x = cursor.u16_le_at(0);
    let y = cursor.u16_le_at(2);
    let width = cursor.u16_le_at(4);
    let height = cursor.u16_le_at(6);
    let packed = cursor.u8_at(8);
    cursor.advance(9)?;

    if width == 0 || height == 0 {
        return Err(bad_data!("image descriptor has zero width or height"));
    }
    if x as u32 + width as u32 > gif.width as u32 || y as u32 + height as u32 > gif.height as u32 {
        return Err(bad_data!(
            "image at ({}, {}) sized {}x{} exceeds the {}x{} logical screen",
            x,
            y,
            width,
            height,
            gif.width,
            gif.height
        ));
    }

    let has_local_table = packed & 0x80 != 0;
    let interlaced = packed & 0x40 != 0;

    let local_color_table = if has_local_table {
        let num_colors = 1usize << ((packed & 0x07) + 1);
        Some(read_color_table(cursor, num_colors)?)
    } else {
        None
    };

    let num_colors = match (&local_color_table, &gif.global_color_table) {
        (Some(t), _) => t.num_colors(),
        (None, Some(t)) => t.num_colors(),
        (None, None) => {
            return Err(bad_data!(
                "image has neither a local color table nor a global one"
            ))
        }
    };

    let mut indices = lzw::decode(cursor, num_colors, width, height)?;
    if interlaced {
        interlace::deinterlace(&mut indices, width, height);
    }

    Ok(Image {
        x,
        y,
        width,
        height,
        local_color_table,
        graphic_control,
        indices,
    })
}

fn parse_extension(cursor: &mut Cursor, pending: &mut Option<GraphicControl>) -> Result<()> {
    cursor.require(1)?;
    let label = cursor.u8_at(0);
    cursor.advance(1)?;

    cursor.require(1)?;
    let size = cursor.u8_at(0) as usize;

    if label == GRAPHIC_CONTROL_LABEL && size == 4 {
        cursor.advance(1)?;
        cursor.require(4)?;
        let packed = cursor.u8_at(0);
        let delay_time = cursor.u16_le_at(1);
        let transparent_index = cursor.u8_at(3);
        cursor.advance(4)?;

        cursor.require(1)?;
        if cursor.u8_at(0) != 0 {
            return Err(bad_data!(
                "graphic control extension missing its terminating zero-length sub-block"
            ));
        }
        cursor.advance(1)?;

        *pending = Some(GraphicControl {
            disposal_method: DisposalMethod::from_raw((packed >> 2) & 0x07),
            user_input: packed & 0x02 != 0,
            delay_time,
            transparent_index: if packed & 0x01 != 0 {
                Some(transparent_index)
            } else {
                None
            },
        });
        return Ok(());
    }

    lzw::skip_blocks(cursor)
}
