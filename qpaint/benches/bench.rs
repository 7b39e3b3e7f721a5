use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgb, RgbImage};
use qpaint::{
    compress::{compress_chunked, MarkerRle, StreamCodec},
    ColorFormat, ConvertedImage, DEFAULT_CHUNK_SIZE,
};

fn test_image(size: u32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        let v = ((x ^ y) & 0xFF) as u8;
        if (x / 8 + y / 8) % 2 == 0 {
            Rgb([v, v / 2, 255 - v])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

fn convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    let image = test_image(240);
    let pixel_count = u64::from(image.width() * image.height());
    group.throughput(criterion::Throughput::Elements(pixel_count));

    for format in [
        ColorFormat::Rgb565,
        ColorFormat::Mono16,
        ColorFormat::Mono2,
        ColorFormat::Pal16,
    ] {
        group.bench_with_input(BenchmarkId::new("convert", format), &image, |b, image| {
            b.iter(|| ConvertedImage::convert(image, format))
        });

        let converted = ConvertedImage::convert(&image, format);
        group.bench_with_input(BenchmarkId::new("pack", format), &converted, |b, converted| {
            b.iter(|| converted.pack())
        });
    }
}

fn compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    let packed = ConvertedImage::convert(&test_image(240), ColorFormat::Rgb565).pack();
    group.throughput(criterion::Throughput::Bytes(packed.len() as u64));

    for chunk_size in [64, DEFAULT_CHUNK_SIZE, 1024] {
        group.bench_with_input(
            BenchmarkId::new("chunked", chunk_size),
            &packed,
            |b, input| b.iter(|| compress_chunked(input, chunk_size)),
        );

        let asset = compress_chunked(&packed, chunk_size).unwrap();
        group.bench_with_input(
            BenchmarkId::new("chunked decode", chunk_size),
            &asset,
            |b, asset| {
                let mut buf = vec![0; chunk_size as usize];
                b.iter(|| {
                    for index in 0..asset.chunks().len() {
                        asset.decompress_chunk(index, &mut buf).unwrap();
                    }
                })
            },
        );
    }

    group.bench_with_input(BenchmarkId::new("rle", "encode"), &packed, |b, input| {
        b.iter(|| MarkerRle.encode(input))
    });
    let encoded = MarkerRle.encode(&packed);
    group.bench_with_input(BenchmarkId::new("rle", "decode"), &encoded, |b, input| {
        b.iter(|| MarkerRle.decode(input))
    });
}

criterion_group!(benches, convert, compress);
criterion_main!(benches);
