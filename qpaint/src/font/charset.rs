use core::ops::RangeInclusive;
use itertools::Itertools;

/// Printable ASCII; 0x7F (DEL) is not a glyph.
pub const ASCII_RANGE: RangeInclusive<char> = ' '..='~';

/// The Latin-1 block above ASCII, without 0xFF.
pub const EXTENDED_ASCII_RANGE: RangeInclusive<char> = '\u{80}'..='\u{fe}';

/// The sorted, duplicate-free set of glyphs an atlas holds.
///
/// The same arguments must be used when building an atlas and when converting it, since the
/// atlas itself only records where glyphs start, not which glyphs they are.
pub fn charset(include_ascii: bool, include_extended_ascii: bool, extra: &str) -> Vec<char> {
    let ascii = include_ascii.then_some(ASCII_RANGE).into_iter().flatten();
    let extended = include_extended_ascii
        .then_some(EXTENDED_ASCII_RANGE)
        .into_iter()
        .flatten();

    ascii
        .chain(extended)
        .chain(extra.chars())
        .sorted_unstable()
        .dedup()
        .collect()
}
