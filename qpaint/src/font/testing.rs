use super::{GlyphRenderer, InkBounds, INK_COLOR};
use image::RgbImage;

/// Draws every glyph as a solid block, so atlas geometry can be checked without a font file.
///
/// Capitals rise 5 pixels, everything else 3. `gjpqy` descend 2. A space is a blank box of
/// width 2 and `'\0'` has no extent at all.
pub(crate) struct BlockRenderer;

impl BlockRenderer {
    fn extent(glyph: char) -> InkBounds {
        match glyph {
            '\0' => InkBounds::default(),
            ' ' => InkBounds {
                right: 2,
                ..InkBounds::default()
            },
            _ => InkBounds {
                left: 0,
                top: if glyph.is_uppercase() { -5 } else { -3 },
                right: 1 + (glyph as i32 % 3),
                bottom: if "gjpqy".contains(glyph) { 2 } else { 0 },
            },
        }
    }
}

impl GlyphRenderer for BlockRenderer {
    fn text_bounds(&self, text: &[char]) -> InkBounds {
        let mut pen = 0;
        let mut bounds: Option<InkBounds> = None;
        for &glyph in text {
            let extent = Self::extent(glyph);
            if extent.height() > 0 {
                let placed = InkBounds {
                    left: extent.left + pen,
                    right: extent.right + pen,
                    ..extent
                };
                bounds = Some(bounds.map_or(placed, |b| b.union(placed)));
            }
            pen += extent.width();
        }
        bounds.unwrap_or_default()
    }

    fn glyph_bounds(&self, glyph: char) -> InkBounds {
        Self::extent(glyph)
    }

    fn draw_glyph(&self, glyph: char, (x, y): (i32, i32), canvas: &mut RgbImage) {
        let extent = Self::extent(glyph);
        for py in y + extent.top..y + extent.bottom {
            for px in x + extent.left..x + extent.right {
                if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height()
                {
                    canvas.put_pixel(px as u32, py as u32, INK_COLOR);
                }
            }
        }
    }
}
