//! The zlib wrapper around a deflate stream: a two byte header and a trailing Adler-32.

use log::{trace, warn};
use simd_adler32::Adler32;

use crate::{decompress::Decompressor, DecodingError};

/// Compression method 8 (deflate) is the only one zlib defines.
const CM_DEFLATE: u8 = 8;
/// Largest window size exponent: `2^(7 + 8)` = 32 KiB.
const MAX_CINFO: u8 = 7;
const FDICT: u8 = 0x20;

const HEADER_BYTES: usize = 2;
const CHECKSUM_BYTES: usize = 4;

/// A validated zlib stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZlibHeader {
    cmf: u8,
    flg: u8,
}

impl ZlibHeader {
    /// Validate the two header bytes of a zlib stream.
    pub fn parse(header: [u8; 2]) -> Result<Self, DecodingError> {
        let [cmf, flg] = header;
        if cmf & 0x0f != CM_DEFLATE
            || cmf >> 4 > MAX_CINFO
            || u16::from_be_bytes(header) % 31 != 0
        {
            return Err(DecodingError::InvalidZlibHeader { cmf, flg });
        }
        if flg & FDICT != 0 {
            return Err(DecodingError::PresetDictionary);
        }
        Ok(Self { cmf, flg })
    }

    /// Size of the sliding window the compressor used.
    pub fn window_size(&self) -> usize {
        1 << (8 + (self.cmf >> 4))
    }

    /// The compression level hint, from 0 (fastest) to 3 (maximum compression).
    pub fn level(&self) -> u8 {
        self.flg >> 6
    }
}

/// Options for decoding a zlib stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZlibOptions {
    /// Skip comparing the trailing Adler-32 against the decompressed data.
    pub ignore_adler32: bool,
    /// Fail instead of producing more than this many bytes.
    pub max_output: usize,
}

impl Default for ZlibOptions {
    fn default() -> Self {
        Self {
            ignore_adler32: false,
            max_output: usize::MAX,
        }
    }
}

/// Decompress a complete zlib stream with the default options.
pub fn decompress_zlib_to_vec(input: &[u8]) -> Result<Vec<u8>, DecodingError> {
    decompress_zlib_with_options(input, ZlibOptions::default())
}

/// Decompress a complete zlib stream.
///
/// The deflate data between the header and the checksum must be consumed exactly.
pub fn decompress_zlib_with_options(
    input: &[u8],
    options: ZlibOptions,
) -> Result<Vec<u8>, DecodingError> {
    if input.len() < HEADER_BYTES + CHECKSUM_BYTES {
        return Err(DecodingError::TruncatedZlibStream);
    }
    let header = ZlibHeader::parse([input[0], input[1]])?;
    trace!(
        "zlib header: window {} bytes, level {}",
        header.window_size(),
        header.level()
    );

    let (deflate, trailer) =
        input[HEADER_BYTES..].split_at(input.len() - HEADER_BYTES - CHECKSUM_BYTES);
    let output = Decompressor::new()
        .with_max_output(options.max_output)
        .decompress(deflate)?;

    let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let mut hasher = Adler32::new();
    hasher.write(&output);
    let actual = hasher.finish();
    if actual != expected {
        if options.ignore_adler32 {
            warn!(
                "ignoring adler-32 mismatch: stored {:#010x}, computed {:#010x}",
                expected, actual
            );
        } else {
            return Err(DecodingError::Adler32Mismatch { expected, actual });
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use rand::Rng;

    #[test]
    fn roundtrip() {
        let mut rng = rand::thread_rng();
        let mut data = vec![0u8; 50_000];
        for byte in &mut data {
            *byte = rng.gen_range(0..8);
        }
        for level in 0..=9 {
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&data, level);
            assert_eq!(decompress_zlib_to_vec(&compressed).unwrap(), data);
        }
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(b"", 6);
        assert_eq!(decompress_zlib_to_vec(&compressed).unwrap(), b"");
    }

    #[test]
    fn header_validation() {
        assert!(ZlibHeader::parse([0x78, 0x9c]).is_ok());
        assert!(ZlibHeader::parse([0x78, 0x01]).is_ok());
        assert!(ZlibHeader::parse([0x08, 0x1d]).is_ok());
        assert_eq!(ZlibHeader::parse([0x78, 0xda]).unwrap().level(), 3);
        assert_eq!(ZlibHeader::parse([0x78, 0x9c]).unwrap().window_size(), 32768);

        // Not a multiple of 31.
        assert!(matches!(
            ZlibHeader::parse([0x78, 0x9d]),
            Err(DecodingError::InvalidZlibHeader { .. })
        ));
        // Compression method 7.
        assert!(matches!(
            ZlibHeader::parse([0x77, 0x85]),
            Err(DecodingError::InvalidZlibHeader { .. })
        ));
        // 64 KiB window.
        assert!(matches!(
            ZlibHeader::parse([0x88, 0x98]),
            Err(DecodingError::InvalidZlibHeader { .. })
        ));
        // Preset dictionary.
        assert!(matches!(
            ZlibHeader::parse([0x78, 0xbb]),
            Err(DecodingError::PresetDictionary)
        ));
    }

    #[test]
    fn checksum_mismatch() {
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(b"Hello world!", 6);
        for bit in 0..32 {
            let mut corrupted = compressed.clone();
            let index = corrupted.len() - 4 + bit / 8;
            corrupted[index] ^= 1 << (bit % 8);
            let err = decompress_zlib_to_vec(&corrupted).unwrap_err();
            assert!(matches!(err, DecodingError::Adler32Mismatch { .. }));
            assert_eq!(err.kind(), ErrorKind::CorruptedFile);

            let options = ZlibOptions {
                ignore_adler32: true,
                ..ZlibOptions::default()
            };
            assert_eq!(
                decompress_zlib_with_options(&corrupted, options).unwrap(),
                b"Hello world!"
            );
        }
    }

    #[test]
    fn too_short() {
        assert!(matches!(
            decompress_zlib_to_vec(&[0x78, 0x9c, 0x03, 0x00, 0x00]),
            Err(DecodingError::TruncatedZlibStream)
        ));
    }

    #[test]
    fn output_limit() {
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&[1; 1000], 6);
        let options = ZlibOptions {
            max_output: 999,
            ..ZlibOptions::default()
        };
        assert!(matches!(
            decompress_zlib_with_options(&compressed, options),
            Err(DecodingError::Decompression(
                crate::DecompressionError::OutputLimitExceeded
            ))
        ));
    }
}
