/// Rescales an 8-bit channel to `[0, max]`, rounding to the nearest integer.
///
/// `value * max / 255` never lands exactly on `.5` for an odd divisor, so adding half the
/// divisor before truncating is exact rounding.
#[inline]
pub const fn rescale_byte(value: u8, max: u32) -> u32 {
    (value as u32 * max + 127) / 255
}

/// Expands a `[0, max]` sample back to the full 8-bit range.
#[inline]
pub const fn expand_to_byte(value: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    ((value * 255 + max / 2) / max) as u8
}

/// Compose the 5-bit R, 6-bit G, and 5-bit B values into a RGB565 u16 pixel. Does not mask off
/// higher bits if they are set.
#[inline]
pub const fn encode_rgb565_unchecked([r, g, b]: [u8; 3]) -> u16 {
    ((r as u16) << 11) | ((g as u16) << 5) | (b as u16)
}

/// Splits a RGB565 pixel into its components.
#[inline]
pub const fn decode_565(pixel: u16) -> [u8; 3] {
    let r = (pixel & 0b1111_1000_0000_0000) >> 11;
    let g = (pixel & 0b0000_0111_1110_0000) >> 5;
    let b = pixel & 0b0000_0000_0001_1111;

    [r as u8, g as u8, b as u8]
}

/// Converts an RGB888 pixel into an RGB565 pixel.
#[inline]
pub const fn rgb888_to_rgb565([r, g, b]: [u8; 3]) -> u16 {
    encode_rgb565_unchecked([
        rescale_byte(r, 31) as u8,
        rescale_byte(g, 63) as u8,
        rescale_byte(b, 31) as u8,
    ])
}

/// Converts an RGB565 pixel into an RGB888 pixel.
#[inline]
pub const fn rgb565_to_rgb888(pixel: u16) -> [u8; 3] {
    let [r, g, b] = decode_565(pixel);
    [
        expand_to_byte(r as u32, 31),
        expand_to_byte(g as u32, 63),
        expand_to_byte(b as u32, 31),
    ]
}

/// ITU-R 601-2 luma, in the fixed-point form common image libraries use for `L` conversion.
#[inline]
pub const fn rgb888_to_luma([r, g, b]: [u8; 3]) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}
