use image::{DynamicImage, Rgb, RgbImage};
use qpaint::{
    compress::{compress_chunked, MarkerRle, RleDecodeContext, StreamCodec},
    decode::{decode_glyph, unpack},
    font::{build_atlas, charset, parse_atlas, GlyphRenderer, InkBounds, INK_COLOR},
    ColorFormat, Compression, FontAsset, FontError, ImageAsset,
};

fn test_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v = ((x * 31 + y * 17) % 256) as u8;
        match (x / 4 + y / 4) % 3 {
            0 => Rgb([v, 0, 255 - v]),
            1 => Rgb([0, 0, 0]),
            _ => Rgb([255, v, v]),
        }
    })
}

#[test]
fn images_round_trip_through_containers() {
    let image = DynamicImage::ImageRgb8(test_image(37, 21));

    for format in ColorFormat::ALL {
        let mut reference = None;
        for compression in [Compression::None, Compression::Rle, Compression::Chunked] {
            let asset = qpaint::convert_image(&image, format, compression, 64).unwrap();
            let read = ImageAsset::from_bytes(&asset.to_bytes()).unwrap();
            assert_eq!(read, asset, "{format} {compression:?}");

            let pixels = read.pixels().unwrap();
            assert_eq!(pixels.len(), format.packed_len(37 * 21));
            assert_eq!(unpack(format, &pixels, 37 * 21).len(), 37 * 21);
            if format.has_palette() {
                assert_eq!(read.palette.len(), format.num_colors() as usize);
            } else {
                assert!(read.palette.is_empty());
            }

            // compression never changes what is drawn
            let preview = qpaint::preview_image(&read).unwrap();
            assert_eq!(preview.dimensions(), (37, 21));
            match &reference {
                None => reference = Some(preview),
                Some(reference) => assert_eq!(&preview, reference),
            }
        }
    }
}

#[test]
fn white_square_packs_to_one_byte() {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])));
    let asset = qpaint::convert_image(&image, ColorFormat::Mono2, Compression::None, 128).unwrap();

    assert!(asset.palette.is_empty());
    assert_eq!(asset.pixels().unwrap(), vec![0x0F]);
}

#[test]
fn chunks_decode_with_a_chunk_sized_buffer() {
    let image = DynamicImage::ImageRgb8(test_image(64, 48));
    let asset =
        qpaint::convert_image(&image, ColorFormat::Rgb565, Compression::Chunked, 128).unwrap();
    let expected = qpaint::convert_image(&image, ColorFormat::Rgb565, Compression::None, 128)
        .unwrap()
        .pixels()
        .unwrap();

    let qpaint::asset::ImageData::Chunked(chunked) = &asset.data else {
        panic!("not chunked");
    };
    assert_eq!(chunked.chunks().len(), expected.len().div_ceil(128));

    let mut buf = [0u8; 128];
    let mut decoded = Vec::new();
    for index in 0..chunked.chunks().len() {
        let written = chunked.decompress_chunk(index, &mut buf).unwrap();
        decoded.extend_from_slice(&buf[..written]);
    }
    assert_eq!(decoded, expected);
}

#[test]
fn chunk_compression_round_trips_arbitrary_data() {
    let data: Vec<u8> = (0..5000u32).map(|i| (i * i % 251) as u8).collect();
    for chunk_size in [1, 3, 128, 1000, 10_000] {
        let asset = compress_chunked(&data, chunk_size).unwrap();
        assert_eq!(asset.decompress_all().unwrap(), data);
        assert!(asset.chunks().windows(2).all(|w| w[0].offset < w[1].offset));
    }
}

#[test]
fn rle_streams_decode_in_small_pieces() {
    let image = DynamicImage::ImageRgb8(test_image(50, 50));
    let raw = qpaint::convert_image(&image, ColorFormat::Mono4, Compression::None, 128)
        .unwrap()
        .pixels()
        .unwrap();
    let encoded = MarkerRle.encode(&raw);

    let mut ctx = RleDecodeContext::new();
    let mut decoded = Vec::new();
    let mut input = &encoded[..];
    let mut buf = [0u8; 16];
    loop {
        let (consumed, written) = ctx.decode_to_slice(input, &mut buf).unwrap();
        decoded.extend_from_slice(&buf[..written]);
        input = &input[consumed..];
        if consumed == 0 && written == 0 {
            break;
        }
    }
    assert!(ctx.is_idle());
    assert_eq!(decoded, raw);
}

/// Draws each glyph as a vertical bar pattern: full-height first column, dotted others.
struct BarRenderer;

impl BarRenderer {
    fn width(glyph: char) -> i32 {
        2 + (glyph as i32 % 4)
    }
}

impl GlyphRenderer for BarRenderer {
    fn text_bounds(&self, text: &[char]) -> InkBounds {
        InkBounds {
            left: 0,
            top: -6,
            right: text.iter().map(|&c| Self::width(c)).sum(),
            bottom: 2,
        }
    }

    fn glyph_bounds(&self, glyph: char) -> InkBounds {
        InkBounds {
            left: 0,
            top: -6,
            right: Self::width(glyph),
            bottom: 2,
        }
    }

    fn draw_glyph(&self, glyph: char, (x, y): (i32, i32), canvas: &mut RgbImage) {
        for dy in -6..2 {
            for dx in 0..Self::width(glyph) {
                if dx == 0 || (dy + dx) % 2 == 0 {
                    canvas.put_pixel((x + dx) as u32, (y + dy) as u32, INK_COLOR);
                }
            }
        }
    }
}

#[test]
fn atlas_round_trip_keeps_glyph_order() {
    let glyphs = charset(true, false, "é€→");
    let atlas = build_atlas(&glyphs, &BarRenderer).unwrap();
    assert_eq!(atlas.height(), 6 + 2 + 1);

    let parsed = parse_atlas(&atlas, &glyphs, ColorFormat::Mono2).unwrap();
    let codepoints: Vec<char> = parsed.glyphs.iter().map(|g| g.codepoint).collect();
    assert_eq!(codepoints, glyphs);
    for glyph in &parsed.glyphs {
        assert_eq!(glyph.pixel_width as i32, BarRenderer::width(glyph.codepoint));
    }

    let table = parsed.glyph_table();
    assert_eq!(table.ascii_count(), 95);
    assert_eq!(table.unicode_count(), 3);
}

#[test]
fn fonts_round_trip_through_containers() {
    let glyphs = charset(true, true, "");
    let atlas = DynamicImage::ImageRgb8(build_atlas(&glyphs, &BarRenderer).unwrap());

    for format in [ColorFormat::Mono2, ColorFormat::Mono16, ColorFormat::Pal4] {
        let font = qpaint::convert_font_atlas(&atlas, &glyphs, format).unwrap();
        assert_eq!(font.glyph_height, 8);

        let read = FontAsset::from_bytes(&font.to_bytes()).unwrap();
        assert_eq!(read, font);

        // every column of 'A' starts with a full-height bar
        let a = decode_glyph(&read, 'A').unwrap();
        assert_eq!(a.width() as i32, BarRenderer::width('A'));
        assert!((0..a.height()).all(|y| a.get_pixel(0, y).0 != [0, 0, 0]));
        assert!(decode_glyph(&read, 'ÿ').is_none());
        assert!(decode_glyph(&read, 'þ').is_some());
    }
}

#[test]
fn mismatched_charset_is_rejected() {
    let atlas = build_atlas(&charset(true, false, ""), &BarRenderer).unwrap();
    let wrong = charset(true, false, "é");

    assert_eq!(
        parse_atlas(&atlas, &wrong, ColorFormat::Mono2).unwrap_err(),
        FontError::GlyphCountMismatch {
            expected: 96,
            found: 95
        }
    );
    assert!(matches!(
        qpaint::convert_font_atlas(&DynamicImage::ImageRgb8(atlas), &wrong, ColorFormat::Mono2),
        Err(qpaint::Error::Font {
            source: FontError::GlyphCountMismatch { .. }
        })
    ));
}
