use super::Glyph;

/// Codepoints below this are looked up in the ASCII table, everything else in the unicode
/// table.
const UNICODE_START: u32 = 0x7F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiGlyphEntry {
    pub offset: usize,
    pub width: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnicodeGlyphEntry {
    pub codepoint: char,
    pub offset: usize,
    pub width: u32,
}

/// Offset tables the firmware uses to find a glyph's bytes.
///
/// A table with no glyphs is absent rather than empty, so the firmware sees a null pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphTable {
    pub ascii: Option<Vec<AsciiGlyphEntry>>,
    pub unicode: Option<Vec<UnicodeGlyphEntry>>,
}

impl GlyphTable {
    /// Splits `glyphs` into the two tables, keeping their order.
    pub fn build(glyphs: &[Glyph]) -> Self {
        let (ascii, unicode): (Vec<&Glyph>, Vec<&Glyph>) = glyphs
            .iter()
            .partition(|g| u32::from(g.codepoint) < UNICODE_START);

        let ascii: Vec<_> = ascii
            .into_iter()
            .map(|g| AsciiGlyphEntry {
                offset: g.byte_offset,
                width: g.pixel_width,
            })
            .collect();
        let unicode: Vec<_> = unicode
            .into_iter()
            .map(|g| UnicodeGlyphEntry {
                codepoint: g.codepoint,
                offset: g.byte_offset,
                width: g.pixel_width,
            })
            .collect();

        Self {
            ascii: (!ascii.is_empty()).then_some(ascii),
            unicode: (!unicode.is_empty()).then_some(unicode),
        }
    }

    pub fn ascii_count(&self) -> usize {
        self.ascii.as_ref().map_or(0, Vec::len)
    }

    pub fn unicode_count(&self) -> usize {
        self.unicode.as_ref().map_or(0, Vec::len)
    }
}
