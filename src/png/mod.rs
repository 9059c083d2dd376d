//! PNG container decoding for non-interlaced 8-bit images.
//!
//! ```no_run
//! let image = pngflate::decode_file("image.png")?;
//! assert_eq!(
//!     image.pixels.len(),
//!     image.width as usize * image.height as usize * image.channels as usize
//! );
//! # Ok::<(), pngflate::DecodingError>(())
//! ```

mod chunk;
mod filter;

use std::path::Path;

use log::{debug, trace, warn};

pub use chunk::SIGNATURE;
pub use filter::{paeth_predict, unfilter, FilterType};

use crate::zlib::{decompress_zlib_with_options, ZlibOptions};
use crate::DecodingError;
use chunk::{Chunk, ChunkReader, IDAT, IEND, IHDR};

/// Default limit on the size of the decompressed image data: 1 GiB.
const DEFAULT_MAX_IMAGE_BYTES: usize = 1 << 30;

/// Width and height are limited to `2^31 - 1`.
const MAX_DIMENSION: u32 = 0x7fff_ffff;

/// The color type stored in IHDR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorType {
    Grayscale = 0,
    Rgb = 2,
    Indexed = 3,
    GrayscaleAlpha = 4,
    Rgba = 6,
}

impl ColorType {
    /// Returns `None` for color types PNG does not define.
    pub fn from_u8(n: u8) -> Option<ColorType> {
        match n {
            0 => Some(ColorType::Grayscale),
            2 => Some(ColorType::Rgb),
            3 => Some(ColorType::Indexed),
            4 => Some(ColorType::GrayscaleAlpha),
            6 => Some(ColorType::Rgba),
            _ => None,
        }
    }

    /// Samples per pixel. Indexed images count as three channels, the width of a palette
    /// entry.
    pub fn channels(self) -> u8 {
        match self {
            ColorType::Grayscale => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::Rgb | ColorType::Indexed => 3,
            ColorType::Rgba => 4,
        }
    }

    fn is_allowed_bit_depth(self, depth: u8) -> bool {
        match self {
            ColorType::Grayscale => matches!(depth, 1 | 2 | 4 | 8 | 16),
            ColorType::Indexed => matches!(depth, 1 | 2 | 4 | 8),
            ColorType::Rgb | ColorType::GrayscaleAlpha | ColorType::Rgba => {
                matches!(depth, 8 | 16)
            }
        }
    }
}

/// The contents of the IHDR chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub interlaced: bool,
}

impl ImageHeader {
    fn parse(data: &[u8]) -> Result<Self, DecodingError> {
        if data.len() != 13 {
            return Err(DecodingError::InvalidIhdr);
        }
        let width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let bit_depth = data[8];
        let color_type =
            ColorType::from_u8(data[9]).ok_or(DecodingError::InvalidColorType(data[9]))?;
        let (compression, filter, interlace) = (data[10], data[11], data[12]);

        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(DecodingError::InvalidIhdr);
        }
        if !color_type.is_allowed_bit_depth(bit_depth) || compression != 0 || filter != 0 {
            return Err(DecodingError::InvalidIhdr);
        }
        let interlaced = match interlace {
            0 => false,
            1 => true,
            _ => return Err(DecodingError::InvalidIhdr),
        };

        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
            interlaced,
        })
    }

    /// Rejects the valid headers this crate cannot decode.
    fn check_supported(&self) -> Result<(), DecodingError> {
        if self.bit_depth != 8 {
            return Err(DecodingError::UnsupportedBitDepth(self.bit_depth));
        }
        if self.color_type == ColorType::Indexed {
            return Err(DecodingError::UnsupportedColorType(self.color_type as u8));
        }
        if self.interlaced {
            return Err(DecodingError::UnsupportedInterlace(1));
        }
        Ok(())
    }

    /// Size of the filtered image data: every row plus its filter type byte.
    fn filtered_size(&self) -> u64 {
        let stride = u64::from(self.width) * u64::from(self.color_type.channels());
        (stride + 1) * u64::from(self.height)
    }
}

/// A decoded image. Rows are stored top to bottom without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

/// PNG decoder configuration.
#[derive(Debug, Clone)]
pub struct Decoder {
    ignore_crc: bool,
    ignore_adler32: bool,
    max_image_bytes: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            ignore_crc: false,
            ignore_adler32: false,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl Decoder {
    /// Create a decoder that verifies every checksum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept chunks whose CRC-32 does not match.
    pub fn set_ignore_crc(&mut self, ignore_crc: bool) -> &mut Self {
        self.ignore_crc = ignore_crc;
        self
    }

    /// Accept image data whose zlib Adler-32 does not match.
    pub fn set_ignore_adler32(&mut self, ignore_adler32: bool) -> &mut Self {
        self.ignore_adler32 = ignore_adler32;
        self
    }

    /// Reject images whose filtered data would be larger than `limit` bytes.
    pub fn set_max_image_bytes(&mut self, limit: usize) -> &mut Self {
        self.max_image_bytes = limit;
        self
    }

    /// Parse the signature and IHDR chunk only.
    pub fn read_header(&self, bytes: &[u8]) -> Result<ImageHeader, DecodingError> {
        let mut chunks = self.chunks(bytes)?;
        self.header(&mut chunks)
    }

    /// Read and decode the file at `path`.
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<Image, DecodingError> {
        let bytes = std::fs::read(path)?;
        self.decode(&bytes)
    }

    /// Decode a complete PNG file held in memory.
    pub fn decode(&self, bytes: &[u8]) -> Result<Image, DecodingError> {
        let mut chunks = self.chunks(bytes)?;
        let header = self.header(&mut chunks)?;
        header.check_supported()?;

        let filtered_size = header.filtered_size();
        if filtered_size > self.max_image_bytes as u64 {
            return Err(DecodingError::LimitsExceeded {
                needed: usize::try_from(filtered_size).unwrap_or(usize::MAX),
                limit: self.max_image_bytes,
            });
        }
        let filtered_size = filtered_size as usize;

        let mut compressed = Vec::new();
        let mut idat_chunks = 0;
        loop {
            let chunk = chunks.next_chunk()?.ok_or(DecodingError::MissingIend)?;
            self.verify_crc(&chunk)?;
            trace!(
                "{} chunk at offset {}, {} bytes",
                chunk.name(),
                chunk.offset,
                chunk.data.len()
            );
            match chunk.kind {
                IDAT => {
                    compressed.try_reserve(chunk.data.len())?;
                    compressed.extend_from_slice(chunk.data);
                    idat_chunks += 1;
                }
                IHDR => return Err(DecodingError::DuplicateIhdr),
                IEND => {
                    if !chunk.data.is_empty() {
                        return Err(DecodingError::InvalidIend);
                    }
                    if chunks.remaining() != 0 {
                        return Err(DecodingError::TrailingBytes(chunks.remaining()));
                    }
                    break;
                }
                _ => trace!("skipping {} chunk", chunk.name()),
            }
        }
        if idat_chunks == 0 {
            return Err(DecodingError::MissingIdat);
        }

        let options = ZlibOptions {
            ignore_adler32: self.ignore_adler32,
            max_output: filtered_size,
        };
        let filtered = decompress_zlib_with_options(&compressed, options)?;
        if filtered.len() != filtered_size {
            return Err(DecodingError::UnexpectedDataSize {
                expected: filtered_size,
                actual: filtered.len(),
            });
        }
        debug!(
            "inflated {} bytes from {} IDAT chunks ({} compressed bytes)",
            filtered.len(),
            idat_chunks,
            compressed.len()
        );

        let channels = header.color_type.channels();
        let pixels = unfilter(&filtered, header.width, header.height, channels)?;
        Ok(Image {
            width: header.width,
            height: header.height,
            channels,
            pixels,
        })
    }

    fn chunks<'a>(&self, bytes: &'a [u8]) -> Result<ChunkReader<'a>, DecodingError> {
        if bytes.is_empty() {
            return Err(DecodingError::InvalidArgument);
        }
        if !bytes.starts_with(&SIGNATURE) {
            return Err(DecodingError::InvalidSignature);
        }
        Ok(ChunkReader::new(bytes))
    }

    fn header(&self, chunks: &mut ChunkReader) -> Result<ImageHeader, DecodingError> {
        let chunk = chunks
            .next_chunk()?
            .ok_or(DecodingError::FirstChunkNotIhdr)?;
        self.verify_crc(&chunk)?;
        if chunk.kind != IHDR {
            return Err(DecodingError::FirstChunkNotIhdr);
        }
        let header = ImageHeader::parse(chunk.data)?;
        debug!(
            "IHDR: {}x{}, {:?}, bit depth {}, interlaced {}",
            header.width, header.height, header.color_type, header.bit_depth, header.interlaced
        );
        Ok(header)
    }

    fn verify_crc(&self, chunk: &Chunk) -> Result<(), DecodingError> {
        let actual = chunk.computed_crc();
        if actual == chunk.crc {
            return Ok(());
        }
        if self.ignore_crc {
            warn!(
                "ignoring CRC mismatch in {} chunk: stored {:#010x}, computed {:#010x}",
                chunk.name(),
                chunk.crc,
                actual
            );
            return Ok(());
        }
        Err(DecodingError::CrcMismatch {
            chunk: chunk.name(),
            expected: chunk.crc,
            actual,
        })
    }
}

/// Decode a PNG file held in memory with the default options.
pub fn decode_png(bytes: &[u8]) -> Result<Image, DecodingError> {
    Decoder::new().decode(bytes)
}

/// Read and decode the PNG file at `path` with the default options.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Image, DecodingError> {
    Decoder::new().decode_file(path)
}
