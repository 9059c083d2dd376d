use std::io;

use crate::DecompressionError;

/// Broad category of a [`DecodingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The source could not be read.
    FileNotFound,
    /// The data violates the PNG, zlib or deflate format.
    CorruptedFile,
    /// A buffer could not be allocated.
    OutOfMemory,
    /// The caller passed an unusable argument, such as empty input.
    InvalidArgument,
    /// The data is well formed but uses a feature this crate does not decode.
    Unsupported,
}

/// An error encountered while decoding a PNG image or a zlib stream.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodingError {
    /// Reading the source failed.
    #[error("failed to read image: {0}")]
    Io(#[from] io::Error),
    /// No input bytes were supplied.
    #[error("input is empty")]
    InvalidArgument,
    /// The data does not start with the PNG signature.
    #[error("missing PNG signature")]
    InvalidSignature,
    /// A chunk's header or body extends past the end of the data.
    #[error("chunk truncated at offset {offset}")]
    TruncatedChunk {
        /// Offset of the chunk in the file.
        offset: usize,
    },
    /// A chunk's stored CRC-32 does not match its contents.
    #[error("CRC mismatch in {chunk} chunk: stored {expected:#010x}, computed {actual:#010x}")]
    CrcMismatch {
        /// The chunk type as text.
        chunk: String,
        /// CRC stored in the file.
        expected: u32,
        /// CRC computed over the chunk type and data.
        actual: u32,
    },
    /// The first chunk is not IHDR.
    #[error("first chunk is not IHDR")]
    FirstChunkNotIhdr,
    /// IHDR has the wrong length or describes an empty or oversized image.
    #[error("invalid IHDR chunk")]
    InvalidIhdr,
    /// More than one IHDR chunk.
    #[error("duplicate IHDR chunk")]
    DuplicateIhdr,
    /// IHDR names a color type PNG does not define.
    #[error("invalid color type {0}")]
    InvalidColorType(u8),
    /// Only 8-bit samples are decoded.
    #[error("unsupported bit depth {0}")]
    UnsupportedBitDepth(u8),
    /// Indexed color needs palette application, which is not performed.
    #[error("unsupported color type {0}")]
    UnsupportedColorType(u8),
    /// Only non-interlaced images are decoded.
    #[error("unsupported interlace method {0}")]
    UnsupportedInterlace(u8),
    /// The data ended without an IEND chunk.
    #[error("missing IEND chunk")]
    MissingIend,
    /// IEND carries data.
    #[error("IEND chunk is not empty")]
    InvalidIend,
    /// No IDAT chunk precedes IEND.
    #[error("missing IDAT chunk")]
    MissingIdat,
    /// Bytes follow the IEND chunk.
    #[error("{0} bytes after IEND chunk")]
    TrailingBytes(usize),
    /// The zlib header is malformed.
    #[error("invalid zlib header {cmf:#04x} {flg:#04x}")]
    InvalidZlibHeader {
        /// Compression method and flags byte.
        cmf: u8,
        /// Flags byte.
        flg: u8,
    },
    /// The zlib stream requests a preset dictionary.
    #[error("zlib preset dictionaries are not allowed")]
    PresetDictionary,
    /// The zlib stream is too short to hold a header and checksum.
    #[error("zlib stream is truncated")]
    TruncatedZlibStream,
    /// The zlib Adler-32 does not match the decompressed data.
    #[error("Adler-32 mismatch: stored {expected:#010x}, computed {actual:#010x}")]
    Adler32Mismatch {
        /// Checksum stored in the stream.
        expected: u32,
        /// Checksum of the decompressed data.
        actual: u32,
    },
    /// The deflate stream is malformed.
    #[error("decompression failed: {0}")]
    Decompression(#[from] DecompressionError),
    /// The decompressed image data does not have the size the header implies.
    #[error("expected {expected} bytes of image data, found {actual}")]
    UnexpectedDataSize {
        /// Size implied by the header.
        expected: usize,
        /// Size produced by decompression.
        actual: usize,
    },
    /// A scanline starts with an unknown filter type.
    #[error("invalid filter type {filter} on row {row}")]
    InvalidFilterType {
        /// The filter type byte.
        filter: u8,
        /// Row index, from the top.
        row: usize,
    },
    /// The image is larger than the decoder's limit.
    #[error("image needs {needed} bytes, limit is {limit}")]
    LimitsExceeded {
        /// Bytes needed for the decompressed data.
        needed: usize,
        /// The configured limit.
        limit: usize,
    },
    /// A buffer could not be allocated.
    #[error("out of memory")]
    OutOfMemory,
}

impl DecodingError {
    /// The broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        use DecodingError::*;
        match self {
            Io(_) => ErrorKind::FileNotFound,
            InvalidArgument => ErrorKind::InvalidArgument,
            UnsupportedBitDepth(_) | UnsupportedColorType(_) | UnsupportedInterlace(_) => {
                ErrorKind::Unsupported
            }
            OutOfMemory | LimitsExceeded { .. } => ErrorKind::OutOfMemory,
            Decompression(DecompressionError::OutOfMemory) => ErrorKind::OutOfMemory,
            _ => ErrorKind::CorruptedFile,
        }
    }
}

impl From<std::collections::TryReserveError> for DecodingError {
    fn from(_: std::collections::TryReserveError) -> Self {
        DecodingError::OutOfMemory
    }
}
