//! PNG decoding built on a from-scratch deflate implementation.
//!
//! This crate contains a decompressor for raw deflate streams (RFC 1951), the zlib wrapper
//! around them (RFC 1950), and a decoder for the PNG container and its scanline filters. Only
//! what is needed to get pixels out of common PNG files is implemented:
//!
//! - 8-bit grayscale, grayscale with alpha, RGB and RGBA images.
//! - No Adam7 interlacing, palettes, or ancillary chunks.
//! - Decoding only, from a complete in-memory buffer.
//!
//! ```
//! let compressed = [0x78, 0x9c, 0x4b, 0x4c, 0x4a, 0x06, 0x00, 0x02, 0x4d, 0x01, 0x27];
//! assert_eq!(pngflate::decompress_zlib_to_vec(&compressed).unwrap(), b"abc");
//! ```
#![forbid(unsafe_code)]

mod bitreader;
mod decompress;
mod error;
mod huffman;
mod png;
mod tables;
mod zlib;

pub use decompress::{decompress_to_vec, DecompressionError, Decompressor};
pub use error::{DecodingError, ErrorKind};
pub use png::{
    decode_file, decode_png, paeth_predict, unfilter, ColorType, Decoder, FilterType, Image,
    ImageHeader, SIGNATURE,
};
pub use zlib::{decompress_zlib_to_vec, decompress_zlib_with_options, ZlibHeader, ZlibOptions};
