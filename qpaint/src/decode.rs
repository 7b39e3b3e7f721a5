//! Turning packed pixel streams back into pixels, the inverse of [`crate::encode`].
//!
//! Devices do this on the fly; here it backs asset previews and round-trip checks.

use crate::{
    asset::{AssetError, FontAsset, ImageAsset},
    encode::Palette,
    format::{ColorFormat, FormatKind},
    utils::{expand_to_byte, rgb565_to_rgb888},
};
use byteorder::{BigEndian, ByteOrder};
use image::{Rgb, RgbImage};

/// Extracts up to `pixel_count` samples from a packed stream.
///
/// Fewer samples are returned if `bytes` runs out first; padding bits past `pixel_count` are
/// ignored.
pub fn unpack(format: ColorFormat, bytes: &[u8], pixel_count: usize) -> Vec<u16> {
    if format.kind() == FormatKind::Rgb565 {
        return bytes
            .chunks_exact(2)
            .take(pixel_count)
            .map(BigEndian::read_u16)
            .collect();
    }

    let bpp = usize::from(format.bits_per_pixel());
    let mask = (format.num_colors() - 1) as u16;
    let per_byte = format.pixels_per_byte();

    bytes
        .iter()
        .flat_map(|&byte| (0..per_byte).map(move |n| u16::from(byte >> (n * bpp)) & mask))
        .take(pixel_count)
        .collect()
}

/// The color a sample stands for. Palette indices without an entry come out black.
pub fn sample_to_rgb(format: ColorFormat, palette: &Palette, sample: u16) -> [u8; 3] {
    match format.kind() {
        FormatKind::Rgb565 => rgb565_to_rgb888(sample),
        FormatKind::Grayscale => {
            let level = expand_to_byte(u32::from(sample), format.num_colors() - 1);
            [level; 3]
        }
        FormatKind::Palette => palette
            .get(usize::from(sample))
            .copied()
            .unwrap_or([0; 3]),
    }
}

/// Renders an image asset back to RGB.
pub fn decode_image(asset: &ImageAsset) -> Result<RgbImage, AssetError> {
    let (width, height) = (u32::from(asset.width), u32::from(asset.height));
    let pixel_count = width as usize * height as usize;

    let samples = unpack(asset.format, &asset.pixels()?, pixel_count);
    if samples.len() != pixel_count {
        return Err(AssetError::ByteCount {
            expected: asset.format.packed_len(pixel_count),
            actual: asset.byte_count as usize,
        });
    }

    tracing::debug!(format = %asset.format, width, height, "decoded image asset");

    Ok(RgbImage::from_fn(width, height, |x, y| {
        let sample = samples[(y * width + x) as usize];
        Rgb(sample_to_rgb(asset.format, &asset.palette, sample))
    }))
}

/// Renders one glyph of a font asset, or `None` if the font doesn't have it.
pub fn decode_glyph(font: &FontAsset, glyph: char) -> Option<RgbImage> {
    let (width, bytes) = font.glyph(glyph)?;
    let height = u32::from(font.glyph_height);
    let samples = unpack(font.format, bytes, (width * height) as usize);

    Some(RgbImage::from_fn(width, height, |x, y| {
        let sample = samples[(y * width + x) as usize];
        Rgb(sample_to_rgb(font.format, &font.palette, sample))
    }))
}
