use crate::consts::*;
use core::{fmt, str::FromStr};
use snafu::{ensure, Snafu};

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(module)]
pub enum FormatError {
    #[snafu(display(
        "unknown format `{name}`, valid formats: {}",
        ColorFormat::NAMES.join(", ")
    ))]
    UnknownName { name: String },
    #[snafu(display("number of colors must be 2, 4, 16, or 256, got {num_colors}"))]
    InvalidColorCount { num_colors: u32 },
    #[snafu(display("unknown image format tag {tag:#04x}"))]
    UnknownTag { tag: u8 },
    #[snafu(display("format tag {tag:#04x} has no {bpp}-bit variant"))]
    InvalidBpp { tag: u8, bpp: u8 },
    #[snafu(display("unknown compression tag {tag:#04x}"))]
    UnknownCompression { tag: u8 },
}

/// The firmware-side family of a [`ColorFormat`], as stored in asset descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FormatKind {
    Rgb565 = QP_IMAGE_FORMAT_RGB565,
    Grayscale = QP_IMAGE_FORMAT_GRAYSCALE,
    Palette = QP_IMAGE_FORMAT_PALETTE,
}

/// Every pixel encoding a display asset can be packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    Rgb565,
    Pal256,
    Pal16,
    Pal4,
    Pal2,
    Mono256,
    Mono16,
    Mono4,
    Mono2,
}

impl ColorFormat {
    pub const ALL: [ColorFormat; 9] = [
        ColorFormat::Rgb565,
        ColorFormat::Pal256,
        ColorFormat::Pal16,
        ColorFormat::Pal4,
        ColorFormat::Pal2,
        ColorFormat::Mono256,
        ColorFormat::Mono16,
        ColorFormat::Mono4,
        ColorFormat::Mono2,
    ];

    pub const NAMES: [&'static str; 9] = [
        "rgb565", "pal256", "pal16", "pal4", "pal2", "mono256", "mono16", "mono4", "mono2",
    ];

    /// Palette format holding `num_colors` entries.
    pub fn palette(num_colors: u32) -> Result<Self, FormatError> {
        Ok(match checked_bpp(num_colors)? {
            1 => ColorFormat::Pal2,
            2 => ColorFormat::Pal4,
            4 => ColorFormat::Pal16,
            _ => ColorFormat::Pal256,
        })
    }

    /// Grayscale format with `num_colors` intensity levels.
    pub fn grayscale(num_colors: u32) -> Result<Self, FormatError> {
        Ok(match checked_bpp(num_colors)? {
            1 => ColorFormat::Mono2,
            2 => ColorFormat::Mono4,
            4 => ColorFormat::Mono16,
            _ => ColorFormat::Mono256,
        })
    }

    /// Recovers a format from the tag/bpp pair stored in a descriptor.
    pub fn from_descriptor(tag: u8, bpp: u8) -> Result<Self, FormatError> {
        let format = match tag {
            QP_IMAGE_FORMAT_RGB565 => (bpp == 16).then_some(ColorFormat::Rgb565),
            QP_IMAGE_FORMAT_GRAYSCALE => Self::grayscale(colors_for_bpp(bpp)).ok(),
            QP_IMAGE_FORMAT_PALETTE => Self::palette(colors_for_bpp(bpp)).ok(),
            _ => return Err(FormatError::UnknownTag { tag }),
        };
        format.ok_or(FormatError::InvalidBpp { tag, bpp })
    }

    pub const fn name(self) -> &'static str {
        match self {
            ColorFormat::Rgb565 => "rgb565",
            ColorFormat::Pal256 => "pal256",
            ColorFormat::Pal16 => "pal16",
            ColorFormat::Pal4 => "pal4",
            ColorFormat::Pal2 => "pal2",
            ColorFormat::Mono256 => "mono256",
            ColorFormat::Mono16 => "mono16",
            ColorFormat::Mono4 => "mono4",
            ColorFormat::Mono2 => "mono2",
        }
    }

    pub const fn kind(self) -> FormatKind {
        match self {
            ColorFormat::Rgb565 => FormatKind::Rgb565,
            ColorFormat::Pal256 | ColorFormat::Pal16 | ColorFormat::Pal4 | ColorFormat::Pal2 => {
                FormatKind::Palette
            }
            _ => FormatKind::Grayscale,
        }
    }

    pub const fn bits_per_pixel(self) -> u8 {
        match self {
            ColorFormat::Rgb565 => 16,
            ColorFormat::Pal256 | ColorFormat::Mono256 => 8,
            ColorFormat::Pal16 | ColorFormat::Mono16 => 4,
            ColorFormat::Pal4 | ColorFormat::Mono4 => 2,
            ColorFormat::Pal2 | ColorFormat::Mono2 => 1,
        }
    }

    /// Number of distinct values one pixel can take. RGB565 is direct color, so this is
    /// `2^16` and never a palette size.
    pub const fn num_colors(self) -> u32 {
        1 << self.bits_per_pixel()
    }

    pub const fn has_palette(self) -> bool {
        matches!(self.kind(), FormatKind::Palette)
    }

    /// Pixels sharing one output byte. Zero for RGB565, which spans two bytes per pixel.
    pub const fn pixels_per_byte(self) -> usize {
        8 / self.bits_per_pixel() as usize
    }

    /// Size of the packed stream for `pixel_count` pixels, including the zero-padded tail.
    pub const fn packed_len(self, pixel_count: usize) -> usize {
        (pixel_count * self.bits_per_pixel() as usize + 7) / 8
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ColorFormat::ALL
            .into_iter()
            .find(|format| s.eq_ignore_ascii_case(format.name()))
            .ok_or_else(|| FormatError::UnknownName { name: s.to_owned() })
    }
}

fn checked_bpp(num_colors: u32) -> Result<u8, FormatError> {
    ensure!(
        matches!(num_colors, 2 | 4 | 16 | 256),
        format_error::InvalidColorCountSnafu { num_colors }
    );
    Ok(num_colors.trailing_zeros() as u8)
}

fn colors_for_bpp(bpp: u8) -> u32 {
    1u32.checked_shl(u32::from(bpp)).unwrap_or(0)
}

/// How the pixel stream of an asset is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Compression {
    #[default]
    None = QP_COMPRESSION_NONE,
    /// Independently LZ4-compressed chunks behind a chunk table.
    Chunked = QP_COMPRESSION_CHUNKED,
    /// A single marker-byte run-length stream.
    Rle = QP_COMPRESSION_RLE,
}

impl Compression {
    pub fn from_tag(tag: u8) -> Result<Self, FormatError> {
        match tag {
            QP_COMPRESSION_NONE => Ok(Compression::None),
            QP_COMPRESSION_CHUNKED => Ok(Compression::Chunked),
            QP_COMPRESSION_RLE => Ok(Compression::Rle),
            _ => Err(FormatError::UnknownCompression { tag }),
        }
    }
}

impl FromStr for Compression {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(compression) = s.eq_ignore_ascii_case("none").then_some(Compression::None)
               .or_else(|| s.eq_ignore_ascii_case("chunked").then_some(Compression::Chunked))
               .or_else(|| s.eq_ignore_ascii_case("rle").then_some(Compression::Rle))
        else { return Err("expected one of: none, chunked, rle"); };

        Ok(compression)
    }
}
