#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};

fuzz_target!(|data: Vec<Vec<u8>>| {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::none());
    for chunk in &data {
        encoder.write_all(chunk).unwrap();
        encoder.flush().unwrap();
    }
    let compressed = encoder.finish().unwrap();

    let decompressed = pngflate::decompress_zlib_to_vec(&compressed).unwrap();
    assert_eq!(decompressed, data.concat());
});
