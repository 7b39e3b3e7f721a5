//! Pixel-format conversion and bit-packing.
//!
//! Conversion is split in two steps: [`ConvertedImage::convert`] maps every pixel of an image
//! to a sample of the target [`ColorFormat`] (an RGB565 value, a grayscale level or a palette
//! index), and [`ConvertedImage::pack`] / [`ConvertedImage::pack_region`] bit-pack those
//! samples. Keeping the samples around lets a font atlas share one palette across all of its
//! glyphs while still packing each glyph on its own.

use crate::{
    format::{ColorFormat, FormatKind},
    utils::{rescale_byte, rgb888_to_luma, rgb888_to_rgb565},
};
use image::{DynamicImage, RgbImage};
use itertools::Itertools;

mod quantize;

/// Ordered RGB triplets; the position of a color is the index stored in packed pixels.
pub type Palette = Vec<[u8; 3]>;

/// An image whose pixels have been mapped to samples of a [`ColorFormat`], but not packed yet.
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    format: ColorFormat,
    width: u32,
    height: u32,
    palette: Palette,
    samples: Vec<u16>,
}

impl ConvertedImage {
    pub fn convert(image: &RgbImage, format: ColorFormat) -> Self {
        let (width, height) = image.dimensions();

        let (palette, samples) = match format.kind() {
            FormatKind::Rgb565 => {
                let samples = image.pixels().map(|p| rgb888_to_rgb565(p.0)).collect();
                (Palette::new(), samples)
            }
            FormatKind::Grayscale => {
                let max = format.num_colors() - 1;
                let samples = image
                    .pixels()
                    .map(|p| rescale_byte(rgb888_to_luma(p.0), max) as u16)
                    .collect();
                (Palette::new(), samples)
            }
            FormatKind::Palette => quantize::quantize(image, format.num_colors() as usize),
        };

        tracing::trace!(%format, width, height, palette_len = palette.len(), "converted image");

        Self {
            format,
            width,
            height,
            palette,
            samples,
        }
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The palette shared by every region packed from this image. Empty unless the format
    /// has one.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// One sample per pixel, in raster order.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Packs the whole image.
    pub fn pack(&self) -> Vec<u8> {
        pack_samples(self.format, self.samples.iter().copied())
    }

    /// Packs the `width` x `height` rectangle whose top-left corner is at `(x, y)`, as if it
    /// were an image of its own.
    ///
    /// # Panics
    ///
    /// Panics if the rectangle is not contained in the image.
    pub fn pack_region(&self, x: u32, y: u32, width: u32, height: u32) -> Vec<u8> {
        assert!(
            x + width <= self.width && y + height <= self.height,
            "region {width}x{height}+{x}+{y} exceeds {}x{} image",
            self.width,
            self.height
        );

        let stride = self.width as usize;
        let (x, width) = (x as usize, width as usize);
        let rows = (y..y + height).flat_map(|row| {
            let start = row as usize * stride + x;
            self.samples[start..start + width].iter().copied()
        });

        pack_samples(self.format, rows)
    }

    pub fn into_parts(self) -> (Palette, Vec<u8>) {
        let bytes = self.pack();
        (self.palette, bytes)
    }
}

/// Converts `image` to `format`, returning its palette (empty if the format has none) and the
/// packed pixel stream.
pub fn encode(image: &DynamicImage, format: ColorFormat) -> (Palette, Vec<u8>) {
    ConvertedImage::convert(&image.to_rgb8(), format).into_parts()
}

/// Packs samples into a byte stream.
///
/// RGB565 samples become two big-endian bytes each. All other formats place
/// `8 / bits_per_pixel` samples in each byte, first sample in the lowest bits, with the final
/// byte zero-padded.
pub fn pack_samples(format: ColorFormat, samples: impl IntoIterator<Item = u16>) -> Vec<u8> {
    if format.kind() == FormatKind::Rgb565 {
        return samples.into_iter().flat_map(u16::to_be_bytes).collect();
    }

    let bpp = usize::from(format.bits_per_pixel());
    let mask = (format.num_colors() - 1) as u16;

    let chunks = samples.into_iter().chunks(format.pixels_per_byte());
    let packed = chunks
        .into_iter()
        .map(|chunk| {
            chunk.enumerate().fold(0u8, |byte, (n, sample)| {
                byte | (((sample & mask) as u8) << (n * bpp))
            })
        })
        .collect();
    packed
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    #[test]
    fn white_mono2_2x2_packs_low_nibble() {
        let image = DynamicImage::ImageRgb8(solid(2, 2, [255, 255, 255]));
        let (palette, bytes) = encode(&image, ColorFormat::Mono2);
        assert!(palette.is_empty());
        assert_eq!(bytes, vec![0x0F]);
    }

    #[test]
    fn rgb565_is_big_endian() {
        let mut image = solid(2, 1, [255, 0, 0]);
        image.put_pixel(1, 0, Rgb([0, 0, 255]));
        let (palette, bytes) = encode(&DynamicImage::ImageRgb8(image), ColorFormat::Rgb565);
        assert!(palette.is_empty());
        assert_eq!(bytes, vec![0xF8, 0x00, 0x00, 0x1F]);
    }

    #[test]
    fn packs_low_order_first() {
        assert_eq!(pack_samples(ColorFormat::Mono4, [1, 2, 3, 0]), vec![0b00_11_10_01]);
        assert_eq!(pack_samples(ColorFormat::Mono16, [0xA, 0x5, 0xF]), vec![0x5A, 0x0F]);
        assert_eq!(pack_samples(ColorFormat::Pal2, [1, 0, 1]), vec![0b101]);
        assert_eq!(pack_samples(ColorFormat::Mono256, [7, 200]), vec![7, 200]);
    }

    #[test]
    fn packed_len_matches_format() {
        for format in ColorFormat::ALL {
            for pixels in [1u32, 3, 7, 8, 9, 17] {
                let image = DynamicImage::ImageRgb8(solid(pixels, 1, [10, 200, 30]));
                let (_, bytes) = encode(&image, format);
                assert_eq!(bytes.len(), format.packed_len(pixels as usize), "{format}");
            }
        }
    }

    #[test]
    fn grayscale_levels_cover_range() {
        let mut image = solid(3, 1, [0, 0, 0]);
        image.put_pixel(1, 0, Rgb([128, 128, 128]));
        image.put_pixel(2, 0, Rgb([255, 255, 255]));
        let converted = ConvertedImage::convert(&image, ColorFormat::Mono16);
        assert_eq!(converted.samples(), &[0, 8, 15]);
        assert_eq!(converted.pack(), vec![0x80, 0x0F]);
    }

    #[test]
    fn palette_has_exactly_num_colors_entries() {
        let mut image = solid(4, 4, [255, 0, 0]);
        image.put_pixel(0, 0, Rgb([0, 0, 255]));
        image.put_pixel(3, 3, Rgb([0, 255, 0]));

        for num_colors in [2, 4, 16, 256] {
            let format = ColorFormat::palette(num_colors).unwrap();
            let converted = ConvertedImage::convert(&image, format);
            assert_eq!(converted.palette().len(), num_colors as usize);
            assert!(converted
                .samples()
                .iter()
                .all(|&index| u32::from(index) < num_colors));
        }
    }

    #[test]
    fn region_packs_like_a_cropped_image() {
        let mut image = solid(5, 3, [0, 0, 0]);
        for (x, y) in [(1, 1), (2, 1), (2, 2), (4, 0)] {
            image.put_pixel(x, y, Rgb([255, 255, 255]));
        }
        let converted = ConvertedImage::convert(&image, ColorFormat::Mono2);

        let cropped = image::imageops::crop_imm(&image, 1, 1, 2, 2).to_image();
        let expected = ConvertedImage::convert(&cropped, ColorFormat::Mono2).pack();
        assert_eq!(converted.pack_region(1, 1, 2, 2), expected);
        assert_eq!(expected, vec![0b1011]);
    }
}
