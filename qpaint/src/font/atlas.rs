use super::{font_error, FontError};
use image::{imageops, Rgb, RgbImage};
use itertools::Itertools;
use snafu::ensure;

/// Row-0 color marking the first column of every glyph.
pub const MARKER_COLOR: Rgb<u8> = Rgb([0xFF, 0x00, 0xFF]);
pub const BACKGROUND_COLOR: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);
/// Full-coverage glyph color; partial coverage is drawn as a darker gray.
pub const INK_COLOR: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);

/// Extent of drawn pixels relative to a left-baseline origin.
///
/// `y` grows downwards, so `top` is negative for anything rising above the baseline and
/// `bottom` is positive for descenders. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InkBounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl InkBounds {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Smallest bounds enclosing both `self` and `other`.
    pub fn union(self, other: InkBounds) -> InkBounds {
        InkBounds {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Source of glyph shapes for an atlas.
pub trait GlyphRenderer {
    /// Ink bounds of `text` laid out left to right from a left-baseline origin at `(0, 0)`.
    fn text_bounds(&self, text: &[char]) -> InkBounds;

    /// Ink bounds of a single glyph drawn from a left-baseline origin at `(0, 0)`.
    ///
    /// Glyphs without ink (such as a space) should report a box as wide as their advance, or
    /// they cannot get a column of their own.
    fn glyph_bounds(&self, glyph: char) -> InkBounds;

    /// Draws `glyph` with its left-baseline origin at `origin`, clipping anything outside of
    /// `canvas`.
    fn draw_glyph(&self, glyph: char, origin: (i32, i32), canvas: &mut RgbImage);
}

/// Renders `glyphs` into a marker-delimited strip image. See the [module docs](super) for
/// the layout.
///
/// Glyphs are drawn in ascending order with duplicates removed, each starting where the
/// previous glyph's ink box ended.
pub fn build_atlas<R>(glyphs: &[char], renderer: &R) -> Result<RgbImage, FontError>
where
    R: GlyphRenderer + ?Sized,
{
    let glyphs: Vec<char> = glyphs.iter().copied().sorted_unstable().dedup().collect();
    ensure!(!glyphs.is_empty(), font_error::EmptyCharsetSnafu);

    let text = renderer.text_bounds(&glyphs);
    // a charset without any ink still gets one glyph row
    let height = text.height().max(1) as u32 + 1;
    // shifts the topmost ink of the string onto row 1, right below the markers
    let baseline = 1 - text.top;

    let mut columns = Vec::with_capacity(glyphs.len());
    let mut width = 0u32;
    let mut overhang = 0u32;
    for &glyph in &glyphs {
        let bounds = renderer.glyph_bounds(glyph);
        ensure!(bounds.width() > 0, font_error::ZeroWidthGlyphSnafu { glyph });

        columns.push(width);
        width += bounds.width() as u32;
        overhang = overhang.max(bounds.left.max(0) as u32);
    }

    // glyphs are drawn from their origin, so ink may run past the last column until cropped
    let mut canvas = RgbImage::from_pixel(width + overhang, height, BACKGROUND_COLOR);
    for (&glyph, &x) in glyphs.iter().zip(&columns) {
        renderer.draw_glyph(glyph, (x as i32, baseline), &mut canvas);
    }

    let mut atlas = imageops::crop_imm(&canvas, 0, 0, width, height).to_image();
    for &x in &columns {
        atlas.put_pixel(x, 0, MARKER_COLOR);
    }

    tracing::debug!(
        glyphs = glyphs.len(),
        width,
        height,
        "built font atlas"
    );

    Ok(atlas)
}
