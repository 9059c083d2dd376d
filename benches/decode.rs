use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc = crc32fast::Hasher::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.finalize().to_be_bytes());
}

/// A smooth RGBA gradient with some noise, Paeth filtered on every row.
fn rgba_png(width: u32, height: u32) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let stride = width as usize * 4;
    let mut pixels = Vec::with_capacity(stride * height as usize);
    for y in 0..height {
        for x in 0..width {
            let noise: u8 = rng.gen_range(0..4);
            pixels.extend_from_slice(&[
                (x as u8).wrapping_add(noise),
                y as u8,
                (x ^ y) as u8,
                255,
            ]);
        }
    }

    let mut filtered = Vec::with_capacity((stride + 1) * height as usize);
    for y in 0..height as usize {
        filtered.push(4);
        for i in 0..stride {
            let left = if i >= 4 { pixels[y * stride + i - 4] } else { 0 };
            let up = if y > 0 { pixels[(y - 1) * stride + i] } else { 0 };
            let up_left = if y > 0 && i >= 4 {
                pixels[(y - 1) * stride + i - 4]
            } else {
                0
            };
            let predicted = pngflate::paeth_predict(left, up, up_left);
            filtered.push(pixels[y * stride + i].wrapping_sub(predicted));
        }
    }

    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);

    let zlib = miniz_oxide::deflate::compress_to_vec_zlib(&filtered, 6);
    let mut png = pngflate::SIGNATURE.to_vec();
    chunk(&mut png, b"IHDR", &ihdr);
    for part in zlib.chunks(8192) {
        chunk(&mut png, b"IDAT", part);
    }
    chunk(&mut png, b"IEND", &[]);
    png
}

fn inflate(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let text: Vec<u8> = (0..1 << 20)
        .map(|i| if i % 61 == 0 { b'\n' } else { rng.gen_range(b'a'..=b'h') })
        .collect();

    let mut group = c.benchmark_group("inflate");
    group.throughput(Throughput::Bytes(text.len() as u64));
    for level in [1, 6, 9] {
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&text, level);
        group.bench_with_input(BenchmarkId::new("pngflate", level), &compressed, |b, data| {
            b.iter(|| pngflate::decompress_zlib_to_vec(data).unwrap())
        });
        group.bench_with_input(
            BenchmarkId::new("miniz_oxide", level),
            &compressed,
            |b, data| b.iter(|| miniz_oxide::inflate::decompress_to_vec_zlib(data).unwrap()),
        );
    }
    group.finish();
}

fn png(c: &mut Criterion) {
    let mut group = c.benchmark_group("png");
    for size in [64u32, 512, 2048] {
        let png = rgba_png(size, size);
        group.throughput(Throughput::Bytes(u64::from(size) * u64::from(size) * 4));
        group.bench_with_input(BenchmarkId::new("decode", size), &png, |b, data| {
            b.iter(|| pngflate::decode_png(data).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, inflate, png);
criterion_main!(benches);
