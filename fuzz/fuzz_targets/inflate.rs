#![no_main]
use libfuzzer_sys::fuzz_target;
use miniz_oxide::inflate::TINFLStatus;

fuzz_target!(|input: &[u8]| {
    if input.is_empty() {
        return;
    }

    match pngflate::decompress_zlib_to_vec(input) {
        Ok(decompressed) => {
            let Ok(decompressed2) = miniz_oxide::inflate::decompress_to_vec_zlib(input) else {
                return;
            };
            assert_eq!(decompressed, decompressed2);
        }
        // Stricter than miniz_oxide: trailing bytes, preset dictionaries and unused symbols.
        Err(pngflate::DecodingError::Decompression(
            pngflate::DecompressionError::TrailingData
            | pngflate::DecompressionError::InvalidLiteralLengthCode
            | pngflate::DecompressionError::InvalidDistanceCode,
        )) => {}
        Err(pngflate::DecodingError::PresetDictionary) => {}
        Err(err) => match miniz_oxide::inflate::decompress_to_vec_zlib(input) {
            Err(r)
                if r.status == TINFLStatus::Failed
                    || r.status == TINFLStatus::FailedCannotMakeProgress
                    || r.status == TINFLStatus::Adler32Mismatch => {}
            r => {
                panic!("pngflate: {:?}, miniz_oxide: {:?}", err, r);
            }
        },
    }
});
