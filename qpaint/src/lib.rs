//! Asset conversion for low-resolution embedded displays.
//!
//! Images and fonts are converted offline into compact pixel streams that a microcontroller
//! can draw without decoding anything heavier than a bit shift.
//!
//! # Pipeline
//!
//! ```plain
//!   image ----> ConvertedImage ----> packed bytes ----> compression ----> ImageAsset
//!               (samples+palette)                       (none/rle/chunked)
//!
//!   font file --> build_atlas --> atlas strip --> parse_atlas --> ParsedFont --> FontAsset
//!                                 (PNG, editable)                 (one palette,
//!                                                                  glyph tables)
//! ```
//!
//! # Pixel formats
//!
//! See [`ColorFormat`]. Every format but RGB565 packs several samples into a byte, first
//! sample in the lowest bits:
//!
//! ```plain
//! .- mono4 / pal4 byte -----.
//! |  7  6  5  4  3  2  1  0 |
//! |-----+-----+-----+-------|
//! | px3 | px2 | px1 |  px0  |
//! `-------------------------`
//! ```
//!
//! RGB565 samples are stored as two bytes, high byte first.
//!
//! # Compression
//!
//! See [`compress`]. Chunked assets keep a table of where each fixed-size chunk starts, so
//! a device only ever needs a `chunk_size` buffer to draw part of an image.
//!
//! # Containers
//!
//! See [`asset`] for the binary layout of image and font blobs.

use image::{DynamicImage, RgbImage};
use snafu::Snafu;

pub mod asset;
pub mod compress;
pub mod decode;
pub mod encode;
pub mod font;
pub mod format;
pub mod utils;

pub use asset::{AssetError, FontAsset, ImageAsset};
pub use compress::{CompressError, DEFAULT_CHUNK_SIZE};
pub use encode::{ConvertedImage, Palette};
pub use font::FontError;
pub use format::{ColorFormat, Compression, FormatError};

pub mod consts {
    /// Direct color: every pixel is a 16-bit RGB565 value.
    ///
    /// ```plain
    /// .- RGB565 pixel -------------------------------------.
    /// |         Byte[0]         |         Byte[1]         |
    /// |  7  6  5  4  3  2  1  0 |  7  6  5  4  3  2  1  0 |
    /// |----------------+--------+---------+---------------|
    /// |       r        | g[5:3] |  g[2:0] |       b       |
    /// `---------------------------------------------------`
    /// ```
    pub const QP_IMAGE_FORMAT_RGB565: u8 = 1;

    /// Every pixel is an intensity level; `0` is black, the highest level white.
    pub const QP_IMAGE_FORMAT_GRAYSCALE: u8 = 2;

    /// Every pixel is an index into a palette of RGB888 colors stored with the asset.
    pub const QP_IMAGE_FORMAT_PALETTE: u8 = 3;

    /// The packed pixel stream is stored as is.
    pub const QP_COMPRESSION_NONE: u8 = 0;

    /// The packed pixel stream is split into chunks, each LZ4-compressed on its own.
    pub const QP_COMPRESSION_CHUNKED: u8 = 1;

    /// The packed pixel stream is a single marker-byte run-length stream.
    pub const QP_COMPRESSION_RLE: u8 = 2;
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(context(false), display("invalid format"))]
    Format { source: FormatError },
    #[snafu(context(false), display("font conversion failed"))]
    Font { source: FontError },
    #[snafu(context(false), display("asset could not be built"))]
    Asset { source: AssetError },
}

/// Converts `image` into an asset of the given format and compression.
///
/// `chunk_size` only matters for [`Compression::Chunked`].
pub fn convert_image(
    image: &DynamicImage,
    format: ColorFormat,
    compression: Compression,
    chunk_size: u32,
) -> Result<ImageAsset, Error> {
    asset::check_dimensions(image.width(), image.height())?;
    if compression == Compression::Chunked && chunk_size == 0 {
        let source = CompressError::ZeroChunkSize;
        return Err(AssetError::Compress { source }.into());
    }

    let converted = ConvertedImage::convert(&image.to_rgb8(), format);
    Ok(ImageAsset::new(&converted, compression, chunk_size)?)
}

/// Converts an atlas built for `glyphs` into a font asset.
///
/// `glyphs` must be the sorted set the atlas was built from, see [`font::charset`].
pub fn convert_font_atlas(
    atlas: &DynamicImage,
    glyphs: &[char],
    format: ColorFormat,
) -> Result<FontAsset, Error> {
    let parsed = font::parse_atlas(&atlas.to_rgb8(), glyphs, format)?;
    Ok(FontAsset::new(&parsed)?)
}

/// Renders `glyphs` from a TrueType or OpenType font into an atlas strip.
#[cfg(feature = "render")]
pub fn build_font_atlas(font_data: &[u8], size: f32, glyphs: &[char]) -> Result<RgbImage, Error> {
    let renderer = font::FontdueRenderer::new(font_data, size)?;
    Ok(font::build_atlas(glyphs, &renderer)?)
}

/// Renders an image asset back to RGB, for previewing.
pub fn preview_image(asset: &ImageAsset) -> Result<RgbImage, Error> {
    Ok(decode::decode_image(asset)?)
}
