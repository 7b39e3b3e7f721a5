//! Font atlases: building a marker-delimited glyph strip, and turning one back into packed
//! glyph data plus offset tables.
//!
//! # Atlas layout
//!
//! An atlas is a single strip image. Glyphs are laid side by side, each in a column as wide
//! as its ink bounding box. Row 0 is reserved for markers: the column where each glyph starts
//! holds one pixel of the marker color (magenta), every other row-0 pixel stays background.
//! The glyph pixels live in rows `1..height`.
//!
//! ```plain
//!   x: 0     4   6      11
//!      M . . . M . M . . . . M ...   <- row 0, M = marker
//!      ###   # ### #   # # ###       <- glyph rows
//!      # #   # # # ##  # # #
//! ```
//!
//! The parser takes the color of pixel `(0, 0)` as the marker color, so a glyph-row pixel is
//! never inspected, but a row-0 pixel that happens to match the marker color would be taken
//! for a boundary. Renderers must keep row 0 free of ink.
//!
//! Columns are as wide as the glyph's ink, not its advance width. Spacing recovered from an
//! atlas therefore differs from the font's own metrics wherever the two disagree.

use snafu::Snafu;

mod atlas;
mod charset;
mod parse;
#[cfg(feature = "render")]
mod render;
mod table;
#[cfg(test)]
pub(crate) mod testing;

pub use atlas::{build_atlas, GlyphRenderer, InkBounds, BACKGROUND_COLOR, INK_COLOR, MARKER_COLOR};
pub use charset::{charset, ASCII_RANGE, EXTENDED_ASCII_RANGE};
pub use parse::{parse_atlas, Glyph, ParsedFont};
#[cfg(feature = "render")]
pub use render::FontdueRenderer;
pub use table::{AsciiGlyphEntry, GlyphTable, UnicodeGlyphEntry};

#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(module)]
pub enum FontError {
    #[snafu(display(
        "the atlas has {found} glyph markers but {expected} glyphs were requested"
    ))]
    GlyphCountMismatch { expected: usize, found: usize },
    #[snafu(display("an atlas needs a marker row and at least one glyph row, got {width}x{height}"))]
    AtlasTooSmall { width: u32, height: u32 },
    #[snafu(display("no glyphs were requested"))]
    EmptyCharset,
    #[snafu(display("glyph {glyph:?} has no width and would share its marker with the next glyph"))]
    ZeroWidthGlyph { glyph: char },
    #[snafu(display("the font could not be loaded: {reason}"))]
    InvalidFont { reason: String },
    #[snafu(display("font size must be positive, got {size}"))]
    InvalidSize { size: f32 },
}
