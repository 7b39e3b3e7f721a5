use super::{font_error, FontError, GlyphRenderer, InkBounds, INK_COLOR};
use fontdue::{Font, FontSettings, Metrics};
use image::RgbImage;
use snafu::ensure;

/// Rasterizes glyphs from a TrueType or OpenType font.
pub struct FontdueRenderer {
    font: Font,
    px: f32,
}

impl FontdueRenderer {
    /// Loads a font from `data`, to be rendered at `size` pixels per em.
    pub fn new(data: &[u8], size: f32) -> Result<Self, FontError> {
        ensure!(
            size.is_finite() && size > 0.0,
            font_error::InvalidSizeSnafu { size }
        );

        let settings = FontSettings {
            scale: size,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(data, settings).map_err(|reason| FontError::InvalidFont {
            reason: reason.to_owned(),
        })?;

        tracing::debug!(
            size,
            glyphs = font.glyph_count(),
            name = font.name().unwrap_or("<unnamed>"),
            "loaded font"
        );

        Ok(Self { font, px: size })
    }

    fn ink(metrics: &Metrics, pen_x: i32) -> Option<InkBounds> {
        (metrics.width > 0 && metrics.height > 0).then(|| InkBounds {
            left: pen_x + metrics.xmin,
            top: -(metrics.ymin + metrics.height as i32),
            right: pen_x + metrics.xmin + metrics.width as i32,
            bottom: -metrics.ymin,
        })
    }
}

impl GlyphRenderer for FontdueRenderer {
    fn text_bounds(&self, text: &[char]) -> InkBounds {
        let mut pen = 0.0f32;
        let mut bounds: Option<InkBounds> = None;

        for &glyph in text {
            let metrics = self.font.metrics(glyph, self.px);
            if let Some(ink) = Self::ink(&metrics, pen.round() as i32) {
                bounds = Some(bounds.map_or(ink, |b| b.union(ink)));
            }
            pen += metrics.advance_width;
        }

        bounds.unwrap_or_default()
    }

    fn glyph_bounds(&self, glyph: char) -> InkBounds {
        let metrics = self.font.metrics(glyph, self.px);
        Self::ink(&metrics, 0).unwrap_or(InkBounds {
            right: metrics.advance_width.round() as i32,
            ..InkBounds::default()
        })
    }

    fn draw_glyph(&self, glyph: char, (x, baseline): (i32, i32), canvas: &mut RgbImage) {
        let (metrics, coverage) = self.font.rasterize(glyph, self.px);
        if metrics.width == 0 {
            return;
        }

        let left = x + metrics.xmin;
        let top = baseline - (metrics.ymin + metrics.height as i32);
        let (width, height) = (canvas.width() as i32, canvas.height() as i32);

        for (row, line) in coverage.chunks_exact(metrics.width).enumerate() {
            let py = top + row as i32;
            if !(0..height).contains(&py) {
                continue;
            }
            for (col, &alpha) in line.iter().enumerate() {
                let px = left + col as i32;
                if alpha == 0 || !(0..width).contains(&px) {
                    continue;
                }

                let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                for (channel, ink) in pixel.0.iter_mut().zip(INK_COLOR.0) {
                    let shade = (u16::from(ink) * u16::from(alpha) / 255) as u8;
                    *channel = (*channel).max(shade);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{build_atlas, charset, parse_atlas, BACKGROUND_COLOR, MARKER_COLOR};
    use crate::ColorFormat;

    const DEJAVU_MONO: &[u8] = include_bytes!("../../tests/fonts/DejaVuSansMono.ttf");

    fn has_ink(atlas: &RgbImage, y: u32) -> bool {
        (0..atlas.width()).any(|x| *atlas.get_pixel(x, y) != BACKGROUND_COLOR)
    }

    #[test]
    fn space_gets_its_advance() {
        let renderer = FontdueRenderer::new(DEJAVU_MONO, 16.0).unwrap();
        let space = renderer.glyph_bounds(' ');
        assert!(space.width() > 0);
        assert_eq!(space.height(), 0);

        // monospaced: the space column is as wide as a full advance
        let advance = renderer.font.metrics('M', 16.0).advance_width.round() as i32;
        assert_eq!(space.width(), advance);
    }

    #[test]
    fn bounds_follow_the_baseline() {
        let renderer = FontdueRenderer::new(DEJAVU_MONO, 16.0).unwrap();
        let capital = renderer.glyph_bounds('H');
        assert!(capital.top < 0);
        assert!(capital.bottom <= 0);

        let descender = renderer.glyph_bounds('g');
        assert!(descender.bottom > 0);

        let text = renderer.text_bounds(&['H', 'g']);
        assert_eq!(text.top, capital.top.min(descender.top));
        assert_eq!(text.bottom, descender.bottom);
    }

    #[test]
    fn ascii_atlas_keeps_ink_below_the_marker_row() {
        let renderer = FontdueRenderer::new(DEJAVU_MONO, 16.0).unwrap();
        let glyphs = charset(true, false, "");
        let atlas = build_atlas(&glyphs, &renderer).unwrap();

        let text = renderer.text_bounds(&glyphs);
        assert_eq!(atlas.height() as i32, text.height() + 1);

        // row 0 holds markers and nothing else
        let mut markers = 0;
        for x in 0..atlas.width() {
            match *atlas.get_pixel(x, 0) {
                MARKER_COLOR => markers += 1,
                pixel => assert_eq!(pixel, BACKGROUND_COLOR, "ink at ({x}, 0)"),
            }
        }
        assert_eq!(markers, glyphs.len());

        // the tallest glyph touches row 1, the deepest descender the last row
        assert!(has_ink(&atlas, 1));
        assert!(has_ink(&atlas, atlas.height() - 1));

        let font = parse_atlas(&atlas, &glyphs, ColorFormat::Mono16).unwrap();
        assert_eq!(font.glyph_height, atlas.height() - 1);
        assert_eq!(font.glyphs[0].codepoint, ' ');
        assert!(font.glyphs[0].pixel_width > 0);
        assert!(font.glyphs.iter().all(|g| g.pixel_width > 0));
    }

    #[test]
    fn drawing_clips_to_the_canvas() {
        let renderer = FontdueRenderer::new(DEJAVU_MONO, 16.0).unwrap();
        let mut canvas = RgbImage::from_pixel(4, 4, BACKGROUND_COLOR);
        renderer.draw_glyph('W', (-3, 2), &mut canvas);
        renderer.draw_glyph('W', (2, 20), &mut canvas);

        // drawing twice blends to the same result
        let once = canvas.clone();
        renderer.draw_glyph('W', (-3, 2), &mut canvas);
        assert_eq!(canvas, once);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            FontdueRenderer::new(&[], 12.0),
            Err(FontError::InvalidFont { .. })
        ));
        assert!(matches!(
            FontdueRenderer::new(b"definitely not a font", 12.0),
            Err(FontError::InvalidFont { .. })
        ));
        assert!(matches!(
            FontdueRenderer::new(&[], 0.0),
            Err(FontError::InvalidSize { .. })
        ));
        assert!(matches!(
            FontdueRenderer::new(&[], f32::NAN),
            Err(FontError::InvalidSize { .. })
        ));
    }
}
