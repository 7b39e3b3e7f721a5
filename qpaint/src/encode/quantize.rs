use super::Palette;
use color_quant::NeuQuant;
use image::RgbImage;

/// Sampling factor handed to NeuQuant: 1 learns from every pixel. Display assets are small,
/// so the slowest, most accurate setting is affordable.
const SAMPLE_FACTOR: i32 = 1;

/// Reduces `image` to `num_colors` representative colors.
///
/// Returns the palette (always exactly `num_colors` entries) and one palette index per pixel.
pub(super) fn quantize(image: &RgbImage, num_colors: usize) -> (Palette, Vec<u16>) {
    let rgba: Vec<u8> = image
        .pixels()
        .flat_map(|p| [p[0], p[1], p[2], u8::MAX])
        .collect();

    // The network still needs something to learn from for an empty image.
    let training: &[u8] = if rgba.is_empty() {
        &[0, 0, 0, u8::MAX]
    } else {
        &rgba
    };
    let quantizer = NeuQuant::new(SAMPLE_FACTOR, num_colors, training);

    let palette: Palette = quantizer
        .color_map_rgb()
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    debug_assert_eq!(palette.len(), num_colors);

    let indices = rgba
        .chunks_exact(4)
        .map(|pixel| quantizer.index_of(pixel) as u16)
        .collect();

    (palette, indices)
}
