use super::{font_error, FontError, GlyphTable};
use crate::{
    encode::{ConvertedImage, Palette},
    format::ColorFormat,
};
use core::iter;
use image::{imageops, RgbImage};
use snafu::ensure;

/// One glyph recovered from an atlas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub codepoint: char,
    /// Width of the glyph's atlas column.
    pub pixel_width: u32,
    /// Position of `image_bytes` within [`ParsedFont::data`].
    pub byte_offset: usize,
    /// The glyph column, packed on its own so it starts on a byte boundary.
    pub image_bytes: Vec<u8>,
}

/// Packed glyphs of an atlas, sharing one palette.
#[derive(Debug, Clone)]
pub struct ParsedFont {
    pub format: ColorFormat,
    /// Height of every glyph; the atlas height without the marker row.
    pub glyph_height: u32,
    pub palette: Palette,
    pub glyphs: Vec<Glyph>,
    /// Every glyph's `image_bytes`, concatenated in order.
    pub data: Vec<u8>,
}

impl ParsedFont {
    pub fn glyph_table(&self) -> GlyphTable {
        GlyphTable::build(&self.glyphs)
    }
}

/// Splits an atlas at its markers and packs each glyph column in `format`.
///
/// `expected` names the glyphs from left to right and must hold exactly one entry per
/// marker. The glyph rows are converted as a single image before splitting, so for palette
/// formats every glyph indexes the same palette.
pub fn parse_atlas(
    atlas: &RgbImage,
    expected: &[char],
    format: ColorFormat,
) -> Result<ParsedFont, FontError> {
    let (width, height) = atlas.dimensions();
    ensure!(
        width > 0 && height > 1,
        font_error::AtlasTooSmallSnafu { width, height }
    );

    let marker = *atlas.get_pixel(0, 0);
    let starts: Vec<u32> = iter::once(0)
        .chain((1..width).filter(|&x| *atlas.get_pixel(x, 0) == marker))
        .collect();
    ensure!(
        starts.len() == expected.len(),
        font_error::GlyphCountMismatchSnafu {
            expected: expected.len(),
            found: starts.len(),
        }
    );

    let glyph_height = height - 1;
    let glyph_rows = imageops::crop_imm(atlas, 0, 1, width, glyph_height).to_image();
    let converted = ConvertedImage::convert(&glyph_rows, format);

    let ends = starts.iter().skip(1).copied().chain(iter::once(width));
    let mut glyphs = Vec::with_capacity(expected.len());
    let mut data = Vec::new();
    for ((&codepoint, &start), end) in expected.iter().zip(&starts).zip(ends) {
        let pixel_width = end - start;
        let image_bytes = converted.pack_region(start, 0, pixel_width, glyph_height);

        glyphs.push(Glyph {
            codepoint,
            pixel_width,
            byte_offset: data.len(),
            image_bytes: image_bytes.clone(),
        });
        data.extend_from_slice(&image_bytes);
    }

    tracing::debug!(
        glyphs = glyphs.len(),
        glyph_height,
        %format,
        bytes = data.len(),
        "parsed font atlas"
    );

    Ok(ParsedFont {
        format,
        glyph_height,
        palette: converted.palette().clone(),
        glyphs,
        data,
    })
}
