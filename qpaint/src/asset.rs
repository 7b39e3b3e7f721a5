//! Binary containers for converted images and fonts.
//!
//! Every integer is little-endian and every offset is relative to the start of the blob, with
//! `0` standing for "absent".
//!
//! # Image blob
//!
//! ```plain
//! .- header (24 bytes) ----------------------------------------------------------.
//! | "QPI\x01" | format u8 | bpp u8 | compression u8 | reserved u8 |              |
//! | width u16 | height u16 | byte_count u32 | palette_offset u32 | data_offset u32 |
//! `------------------------------------------------------------------------------`
//! | palette: num_colors * [r, g, b]   (palette formats only)                     |
//! | data                                                                         |
//! ```
//!
//! `byte_count` is the size of the packed pixel stream before compression. The data is
//! stored as follows, depending on `compression`:
//!
//! - none: the packed stream itself
//! - rle: `encoded_len u32`, then the run-length stream
//! - chunked: `chunk_count u32 | chunk_size u32 | chunk_count * offset u32 | buffer_len u32`,
//!   then the concatenated chunks. Offsets are relative to the start of that buffer.
//!
//! # Font blob
//!
//! ```plain
//! .- header (32 bytes) ----------------------------------------------------------.
//! | "QPF\x01" | format u8 | bpp u8 | compression u8 | glyph_height u8 |          |
//! | palette_offset u32 | data_offset u32 | byte_count u32 |                      |
//! | ascii_offset u32 | ascii_count u16 | unicode_offset u32 | unicode_count u16  |
//! `------------------------------------------------------------------------------`
//! | palette | ascii table | unicode table | glyph data                           |
//! ```
//!
//! ```plain
//! .- ascii entry -------------------.   .- unicode entry -----------------------------.
//! | offset u24 | width u8           |   | codepoint i32 | offset u24 | width u8      |
//! `---------------------------------`   `---------------------------------------------`
//! ```
//!
//! Glyph offsets are relative to the start of the glyph data. Fonts are always stored
//! uncompressed.

use crate::{
    compress::{compress_chunked, CompressError, CompressedAsset, MarkerRle, RleError, StreamCodec},
    encode::{ConvertedImage, Palette},
    font::{AsciiGlyphEntry, GlyphTable, ParsedFont, UnicodeGlyphEntry},
    format::{ColorFormat, Compression, FormatError},
};
use byteorder::{ByteOrder, LittleEndian};
use snafu::{ensure, OptionExt, ResultExt, Snafu};

pub const IMAGE_MAGIC: [u8; 4] = *b"QPI\x01";
pub const FONT_MAGIC: [u8; 4] = *b"QPF\x01";

const IMAGE_HEADER_LEN: usize = 24;
const FONT_HEADER_LEN: usize = 32;
const ASCII_ENTRY_LEN: usize = 4;
const UNICODE_ENTRY_LEN: usize = 8;
/// Glyph offsets are stored in 24 bits.
const MAX_GLYPH_OFFSET: usize = (1 << 24) - 1;

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum AssetError {
    #[snafu(display("{width}x{height} exceeds the 65535x65535 limit of an image descriptor"))]
    DimensionsTooLarge { width: u32, height: u32 },
    #[snafu(display("{len} bytes of pixel data exceed the 32-bit range of the descriptor"))]
    DataTooLarge { len: usize },
    #[snafu(display("glyphs must be 1 to 255 pixels tall, got {height}"))]
    GlyphHeight { height: u32 },
    #[snafu(display("glyph {glyph:?} is {width} pixels wide, at most 255 fit a table entry"))]
    GlyphTooWide { glyph: char, width: u32 },
    #[snafu(display("glyph {glyph:?} starts at byte {offset}, beyond the 24-bit table range"))]
    GlyphOffsetTooLarge { glyph: char, offset: usize },
    #[snafu(display("{count} glyphs do not fit a 16-bit table count"))]
    TooManyGlyphs { count: usize },
    #[snafu(display("not a qpaint asset, magic is {found:02x?}"))]
    BadMagic { found: [u8; 4] },
    #[snafu(display("asset ends at {len} bytes, {needed} bytes needed at offset {offset}"))]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },
    #[snafu(display("palette format without a palette"))]
    MissingPalette,
    #[snafu(display("{value:#x} is not a valid codepoint"))]
    InvalidCodepoint { value: i32 },
    #[snafu(display("fonts are stored uncompressed, found {compression:?}"))]
    CompressedFont { compression: Compression },
    #[snafu(display("pixel data holds {actual} bytes, the descriptor says {expected}"))]
    ByteCount { expected: usize, actual: usize },
    #[snafu(display("invalid descriptor"))]
    Format { source: FormatError },
    #[snafu(display("invalid chunked data"))]
    Compress { source: CompressError },
    #[snafu(display("invalid run-length data"))]
    Rle { source: RleError },
}

/// Pixel data of an image asset as it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageData {
    Raw(Vec<u8>),
    Rle(Vec<u8>),
    Chunked(CompressedAsset),
}

impl ImageData {
    pub fn compression(&self) -> Compression {
        match self {
            ImageData::Raw(_) => Compression::None,
            ImageData::Rle(_) => Compression::Rle,
            ImageData::Chunked(_) => Compression::Chunked,
        }
    }

    /// Size of the data as stored, chunk table included.
    pub fn stored_len(&self) -> usize {
        match self {
            ImageData::Raw(bytes) => bytes.len(),
            ImageData::Rle(bytes) => 4 + bytes.len(),
            ImageData::Chunked(asset) => 12 + 4 * asset.chunks().len() + asset.data().len(),
        }
    }
}

/// Checks that a stored byte length fits the container's 32-bit length fields.
fn length_field(len: usize) -> Result<u32, AssetError> {
    u32::try_from(len)
        .ok()
        .context(asset_error::DataTooLargeSnafu { len })
}

/// A converted image with its descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub format: ColorFormat,
    pub width: u16,
    pub height: u16,
    pub palette: Palette,
    /// Size of the packed pixel stream before compression.
    pub byte_count: u32,
    pub data: ImageData,
}

impl ImageAsset {
    /// Packs `image` and compresses the result. `chunk_size` only matters for
    /// [`Compression::Chunked`].
    pub fn new(
        image: &ConvertedImage,
        compression: Compression,
        chunk_size: u32,
    ) -> Result<Self, AssetError> {
        let (width, height) = check_dimensions(image.width(), image.height())?;
        let packed = image.pack();
        let byte_count = length_field(packed.len())?;

        let data = match compression {
            Compression::None => ImageData::Raw(packed),
            Compression::Rle => {
                let encoded = MarkerRle.encode(&packed);
                length_field(encoded.len())?;
                ImageData::Rle(encoded)
            }
            Compression::Chunked => ImageData::Chunked(
                compress_chunked(&packed, chunk_size).context(asset_error::CompressSnafu)?,
            ),
        };

        tracing::debug!(
            format = %image.format(),
            ?compression,
            width,
            height,
            raw = byte_count,
            stored = data.stored_len(),
            "built image asset"
        );

        Ok(Self {
            format: image.format(),
            width,
            height,
            palette: image.palette().clone(),
            byte_count,
            data,
        })
    }

    /// The packed pixel stream, decompressed.
    pub fn pixels(&self) -> Result<Vec<u8>, AssetError> {
        let pixels = match &self.data {
            ImageData::Raw(bytes) => bytes.clone(),
            ImageData::Rle(bytes) => MarkerRle.decode(bytes).context(asset_error::RleSnafu)?,
            ImageData::Chunked(asset) => asset.decompress_all().context(asset_error::CompressSnafu)?,
        };

        ensure!(
            pixels.len() == self.byte_count as usize,
            asset_error::ByteCountSnafu {
                expected: self.byte_count as usize,
                actual: pixels.len()
            }
        );
        Ok(pixels)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let palette_len = self.palette.len() * 3;
        let palette_offset = if self.palette.is_empty() {
            0
        } else {
            IMAGE_HEADER_LEN
        };
        let data_offset = IMAGE_HEADER_LEN + palette_len;

        let mut out = Vec::with_capacity(data_offset + self.data.stored_len());
        out.extend_from_slice(&IMAGE_MAGIC);
        out.extend_from_slice(&[
            self.format.kind() as u8,
            self.format.bits_per_pixel(),
            self.data.compression() as u8,
            0,
        ]);
        put_u16(&mut out, self.width);
        put_u16(&mut out, self.height);
        put_u32(&mut out, self.byte_count);
        put_u32(&mut out, palette_offset as u32);
        put_u32(&mut out, data_offset as u32);

        out.extend(self.palette.iter().flatten());

        match &self.data {
            ImageData::Raw(bytes) => out.extend_from_slice(bytes),
            ImageData::Rle(bytes) => {
                put_u32(&mut out, bytes.len() as u32);
                out.extend_from_slice(bytes);
            }
            ImageData::Chunked(asset) => {
                put_u32(&mut out, asset.chunks().len() as u32);
                put_u32(&mut out, asset.chunk_size());
                for chunk in asset.chunks() {
                    put_u32(&mut out, chunk.offset);
                }
                put_u32(&mut out, asset.data().len() as u32);
                out.extend_from_slice(asset.data());
            }
        }

        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let mut header = Reader::new(bytes);
        check_magic(&mut header, IMAGE_MAGIC)?;
        let format = read_format(&mut header)?;
        let compression =
            Compression::from_tag(header.u8()?).context(asset_error::FormatSnafu)?;
        header.u8()?;
        let width = header.u16()?;
        let height = header.u16()?;
        let byte_count = header.u32()?;
        let palette_offset = header.u32()? as usize;
        let data_offset = header.u32()? as usize;

        let palette = read_palette(bytes, format, palette_offset)?;

        let mut data = Reader::at(bytes, data_offset);
        let data = match compression {
            Compression::None => ImageData::Raw(data.bytes(byte_count as usize)?.to_vec()),
            Compression::Rle => {
                let len = data.u32()? as usize;
                ImageData::Rle(data.bytes(len)?.to_vec())
            }
            Compression::Chunked => {
                let count = data.u32()? as usize;
                let chunk_size = data.u32()?;
                let offsets = (0..count)
                    .map(|_| data.u32())
                    .collect::<Result<Vec<_>, _>>()?;
                let len = data.u32()? as usize;
                let buffer = data.bytes(len)?.to_vec();

                ImageData::Chunked(
                    CompressedAsset::from_offsets(chunk_size, byte_count as usize, &offsets, buffer)
                        .context(asset_error::CompressSnafu)?,
                )
            }
        };

        Ok(Self {
            format,
            width,
            height,
            palette,
            byte_count,
            data,
        })
    }
}

/// A converted font with its glyph tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    pub format: ColorFormat,
    pub glyph_height: u8,
    pub palette: Palette,
    pub table: GlyphTable,
    /// Packed glyphs, addressed by the table offsets.
    pub data: Vec<u8>,
}

impl FontAsset {
    /// Checks that every glyph of `font` fits the fixed-width table fields.
    pub fn new(font: &ParsedFont) -> Result<Self, AssetError> {
        let glyph_height = u8::try_from(font.glyph_height)
            .ok()
            .filter(|&h| h > 0)
            .context(asset_error::GlyphHeightSnafu {
                height: font.glyph_height,
            })?;

        for glyph in &font.glyphs {
            ensure!(
                glyph.pixel_width <= u32::from(u8::MAX),
                asset_error::GlyphTooWideSnafu {
                    glyph: glyph.codepoint,
                    width: glyph.pixel_width
                }
            );
            ensure!(
                glyph.byte_offset <= MAX_GLYPH_OFFSET,
                asset_error::GlyphOffsetTooLargeSnafu {
                    glyph: glyph.codepoint,
                    offset: glyph.byte_offset
                }
            );
        }

        let table = font.glyph_table();
        for count in [table.ascii_count(), table.unicode_count()] {
            ensure!(
                u16::try_from(count).is_ok(),
                asset_error::TooManyGlyphsSnafu { count }
            );
        }
        length_field(font.data.len())?;

        tracing::debug!(
            format = %font.format,
            glyph_height,
            ascii = table.ascii_count(),
            unicode = table.unicode_count(),
            bytes = font.data.len(),
            "built font asset"
        );

        Ok(Self {
            format: font.format,
            glyph_height,
            palette: font.palette.clone(),
            table,
            data: font.data.clone(),
        })
    }

    /// Width and packed bytes of `glyph`, if the font has it.
    ///
    /// ASCII entries don't carry their codepoint; like the firmware, the ASCII table is
    /// indexed from the space character. A font built without the printable ASCII block
    /// therefore cannot look up ASCII glyphs it was given as extras: they are stored in a
    /// short ASCII table whose entries no longer line up with their codepoints, and only the
    /// first of them answers, under the space character.
    pub fn glyph(&self, glyph: char) -> Option<(u32, &[u8])> {
        let (offset, width) = match u32::from(glyph) {
            c @ 0x20..=0x7E => {
                let entry = self.table.ascii.as_ref()?.get((c - 0x20) as usize)?;
                (entry.offset, entry.width)
            }
            c if c < 0x20 => return None,
            _ => {
                let entry = self
                    .table
                    .unicode
                    .iter()
                    .flatten()
                    .find(|e| e.codepoint == glyph)?;
                (entry.offset, entry.width)
            }
        };

        let len = self
            .format
            .packed_len(width as usize * usize::from(self.glyph_height));
        self.data.get(offset..offset + len).map(|bytes| (width, bytes))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let palette_len = self.palette.len() * 3;
        let ascii_len = self.table.ascii_count() * ASCII_ENTRY_LEN;
        let unicode_len = self.table.unicode_count() * UNICODE_ENTRY_LEN;

        let palette_offset = FONT_HEADER_LEN;
        let ascii_offset = palette_offset + palette_len;
        let unicode_offset = ascii_offset + ascii_len;
        let data_offset = unicode_offset + unicode_len;
        let non_null = |offset: usize, len: usize| if len == 0 { 0 } else { offset as u32 };

        let mut out = Vec::with_capacity(data_offset + self.data.len());
        out.extend_from_slice(&FONT_MAGIC);
        out.extend_from_slice(&[
            self.format.kind() as u8,
            self.format.bits_per_pixel(),
            Compression::None as u8,
            self.glyph_height,
        ]);
        put_u32(&mut out, non_null(palette_offset, palette_len));
        put_u32(&mut out, data_offset as u32);
        put_u32(&mut out, self.data.len() as u32);
        put_u32(&mut out, non_null(ascii_offset, ascii_len));
        put_u16(&mut out, self.table.ascii_count() as u16);
        put_u32(&mut out, non_null(unicode_offset, unicode_len));
        put_u16(&mut out, self.table.unicode_count() as u16);

        out.extend(self.palette.iter().flatten());
        for entry in self.table.ascii.iter().flatten() {
            put_glyph_location(&mut out, entry.offset, entry.width);
        }
        for entry in self.table.unicode.iter().flatten() {
            let mut codepoint = [0; 4];
            LittleEndian::write_i32(&mut codepoint, u32::from(entry.codepoint) as i32);
            out.extend_from_slice(&codepoint);
            put_glyph_location(&mut out, entry.offset, entry.width);
        }
        out.extend_from_slice(&self.data);

        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let mut header = Reader::new(bytes);
        check_magic(&mut header, FONT_MAGIC)?;
        let format = read_format(&mut header)?;
        let compression =
            Compression::from_tag(header.u8()?).context(asset_error::FormatSnafu)?;
        ensure!(
            compression == Compression::None,
            asset_error::CompressedFontSnafu { compression }
        );
        let glyph_height = header.u8()?;
        let palette_offset = header.u32()? as usize;
        let data_offset = header.u32()? as usize;
        let byte_count = header.u32()? as usize;
        let ascii_offset = header.u32()? as usize;
        let ascii_count = usize::from(header.u16()?);
        let unicode_offset = header.u32()? as usize;
        let unicode_count = usize::from(header.u16()?);

        let palette = read_palette(bytes, format, palette_offset)?;

        let mut ascii = Vec::with_capacity(ascii_count);
        let mut entries = Reader::at(bytes, ascii_offset);
        for _ in 0..ascii_count {
            let (offset, width) = entries.glyph_location()?;
            ascii.push(AsciiGlyphEntry { offset, width });
        }

        let mut unicode = Vec::with_capacity(unicode_count);
        let mut entries = Reader::at(bytes, unicode_offset);
        for _ in 0..unicode_count {
            let value = entries.i32()?;
            let codepoint = u32::try_from(value)
                .ok()
                .and_then(char::from_u32)
                .context(asset_error::InvalidCodepointSnafu { value })?;
            let (offset, width) = entries.glyph_location()?;
            unicode.push(UnicodeGlyphEntry {
                codepoint,
                offset,
                width,
            });
        }

        let data = Reader::at(bytes, data_offset).bytes(byte_count)?.to_vec();

        Ok(Self {
            format,
            glyph_height,
            palette,
            table: GlyphTable {
                ascii: (!ascii.is_empty()).then_some(ascii),
                unicode: (!unicode.is_empty()).then_some(unicode),
            },
            data,
        })
    }
}

/// Checks that an image fits the 16-bit dimensions of a descriptor.
pub fn check_dimensions(width: u32, height: u32) -> Result<(u16, u16), AssetError> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => asset_error::DimensionsTooLargeSnafu { width, height }.fail(),
    }
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    let mut buf = [0; 2];
    LittleEndian::write_u16(&mut buf, value);
    out.extend_from_slice(&buf);
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    let mut buf = [0; 4];
    LittleEndian::write_u32(&mut buf, value);
    out.extend_from_slice(&buf);
}

fn put_glyph_location(out: &mut Vec<u8>, offset: usize, width: u32) {
    let mut buf = [0; 4];
    LittleEndian::write_u24(&mut buf[..3], offset as u32);
    buf[3] = width as u8;
    out.extend_from_slice(&buf);
}

fn check_magic(reader: &mut Reader<'_>, expected: [u8; 4]) -> Result<(), AssetError> {
    let mut found = [0; 4];
    found.copy_from_slice(reader.bytes(4)?);
    ensure!(found == expected, asset_error::BadMagicSnafu { found });
    Ok(())
}

fn read_format(reader: &mut Reader<'_>) -> Result<ColorFormat, AssetError> {
    let tag = reader.u8()?;
    let bpp = reader.u8()?;
    ColorFormat::from_descriptor(tag, bpp).context(asset_error::FormatSnafu)
}

fn read_palette(bytes: &[u8], format: ColorFormat, offset: usize) -> Result<Palette, AssetError> {
    if !format.has_palette() {
        return Ok(Palette::new());
    }
    ensure!(offset != 0, asset_error::MissingPaletteSnafu);

    let len = format.num_colors() as usize * 3;
    let palette = Reader::at(bytes, offset)
        .bytes(len)?
        .chunks_exact(3)
        .map(|rgb| [rgb[0], rgb[1], rgb[2]])
        .collect();
    Ok(palette)
}

/// Bounds-checked little-endian cursor over a blob.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self::at(bytes, 0)
    }

    fn at(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    fn bytes(&mut self, needed: usize) -> Result<&'a [u8], AssetError> {
        let slice = self
            .offset
            .checked_add(needed)
            .and_then(|end| self.bytes.get(self.offset..end))
            .context(asset_error::TruncatedSnafu {
                offset: self.offset,
                needed,
                len: self.bytes.len(),
            })?;
        self.offset += needed;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, AssetError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, AssetError> {
        Ok(LittleEndian::read_u16(self.bytes(2)?))
    }

    fn u32(&mut self) -> Result<u32, AssetError> {
        Ok(LittleEndian::read_u32(self.bytes(4)?))
    }

    fn i32(&mut self) -> Result<i32, AssetError> {
        Ok(LittleEndian::read_i32(self.bytes(4)?))
    }

    fn glyph_location(&mut self) -> Result<(usize, u32), AssetError> {
        let entry = self.bytes(4)?;
        Ok((
            LittleEndian::read_u24(&entry[..3]) as usize,
            u32::from(entry[3]),
        ))
    }
}
