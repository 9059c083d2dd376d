#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (u8, Vec<u8>)| {
    let compression_level = input.0;
    let data = input.1;
    let compressed = miniz_oxide::deflate::compress_to_vec(&data, compression_level);
    let decompressed = pngflate::decompress_to_vec(&compressed).expect("Decompression failed!");
    assert_eq!(data, decompressed);

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&data, compression_level);
    let decompressed =
        pngflate::decompress_zlib_to_vec(&compressed).expect("Decompression failed!");
    assert_eq!(data, decompressed);
});
