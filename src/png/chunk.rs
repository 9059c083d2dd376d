use crc32fast::Hasher as Crc32;

use crate::DecodingError;

/// The eight bytes every PNG file starts with.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub(crate) const IHDR: [u8; 4] = *b"IHDR";
pub(crate) const IDAT: [u8; 4] = *b"IDAT";
pub(crate) const IEND: [u8; 4] = *b"IEND";

/// Chunk lengths are limited to `2^31 - 1` bytes.
const MAX_CHUNK_LENGTH: u32 = 0x7fff_ffff;

/// Length, type and CRC fields around the chunk data.
const CHUNK_OVERHEAD: usize = 12;

/// A chunk borrowed from the file bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Chunk<'a> {
    pub kind: [u8; 4],
    pub data: &'a [u8],
    /// CRC-32 stored after the data.
    pub crc: u32,
    /// Offset of the chunk's length field in the file.
    pub offset: usize,
}

impl Chunk<'_> {
    /// CRC-32 over the chunk type and data.
    pub fn computed_crc(&self) -> u32 {
        let mut crc = Crc32::new();
        crc.update(&self.kind);
        crc.update(self.data);
        crc.finalize()
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }
}

/// Splits the bytes after the signature into chunks.
pub(crate) struct ChunkReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ChunkReader<'a> {
    /// `data` is the whole file, signature included.
    pub fn new(data: &'a [u8]) -> Self {
        debug_assert!(data.len() >= SIGNATURE.len());
        Self {
            data,
            offset: SIGNATURE.len(),
        }
    }

    /// Bytes that have not been read as part of a chunk yet.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Reads the next chunk, or `None` if the data ends exactly here.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk<'a>>, DecodingError> {
        let rest = &self.data[self.offset..];
        if rest.is_empty() {
            return Ok(None);
        }
        let truncated = DecodingError::TruncatedChunk {
            offset: self.offset,
        };
        if rest.len() < CHUNK_OVERHEAD {
            return Err(truncated);
        }

        let length = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
        if length > MAX_CHUNK_LENGTH || rest.len() - CHUNK_OVERHEAD < length as usize {
            return Err(truncated);
        }
        let length = length as usize;

        let kind = [rest[4], rest[5], rest[6], rest[7]];
        let data = &rest[8..8 + length];
        let crc_bytes = &rest[8 + length..CHUNK_OVERHEAD + length];
        let crc = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);

        let chunk = Chunk {
            kind,
            data,
            crc,
            offset: self.offset,
        };
        self.offset += CHUNK_OVERHEAD + length;
        Ok(Some(chunk))
    }
}
