#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &[u8]| {
    let mut decoder = pngflate::Decoder::new();
    decoder.set_max_image_bytes(1 << 24);
    if let Ok(image) = decoder.decode(input) {
        assert_eq!(
            image.pixels.len(),
            image.width as usize * image.height as usize * image.channels as usize
        );
    }
});
