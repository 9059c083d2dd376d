use log::{debug, trace};

use crate::{
    bitreader::BitReader,
    huffman::HuffmanTable,
    tables::{
        CLCL_ORDER, DIST_BASE, DIST_EXTRA, FIXED_DIST_LENGTHS, FIXED_LITLEN_LENGTHS, LEN_BASE,
        LEN_EXTRA,
    },
};

/// Width of the primary lookup table for literal/length codes.
const LITLEN_TABLE_BITS: u8 = 9;
/// Width of the primary lookup table for distance codes.
const DIST_TABLE_BITS: u8 = 6;
/// Code length codes are at most 7 bits, so their table never needs a second level.
const CODE_LENGTH_TABLE_BITS: u8 = 7;

const MAX_CODE_LENGTH: u8 = 15;
const MAX_CODE_LENGTH_CODE_LENGTH: u8 = 7;

const END_OF_BLOCK: u16 = 256;

/// An error encountered while decompressing a deflate stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum DecompressionError {
    /// The stream ended before the final block was complete.
    #[error("deflate stream ended unexpectedly")]
    InsufficientInput,
    /// Block type 3 is reserved.
    #[error("reserved deflate block type")]
    InvalidBlockType,
    /// A stored block's length does not match the one's complement that follows it.
    #[error("stored block length does not match its complement")]
    InvalidUncompressedBlockLength,
    /// A dynamic block declares more than 286 literal/length codes.
    #[error("too many literal/length codes")]
    InvalidHlit,
    /// A dynamic block declares more than 30 distance codes.
    #[error("too many distance codes")]
    InvalidHdist,
    /// The code length code lengths do not form a valid prefix code.
    #[error("invalid code length huffman tree")]
    BadCodeLengthHuffmanTree,
    /// The literal/length code lengths do not form a valid prefix code.
    #[error("invalid literal/length huffman tree")]
    BadLiteralLengthHuffmanTree,
    /// The distance code lengths do not form a valid prefix code.
    #[error("invalid distance huffman tree")]
    BadDistanceHuffmanTree,
    /// A code length repeat has no previous length or runs past the end of the code lengths.
    #[error("invalid code length repeat")]
    InvalidCodeLengthRepeat,
    /// The stream contains a Huffman code that no symbol was assigned to.
    #[error("invalid huffman code")]
    InvalidHuffmanCode,
    /// Literal/length symbols 286 and 287 never occur in valid data.
    #[error("invalid literal/length code")]
    InvalidLiteralLengthCode,
    /// Distance symbols 30 and 31 never occur in valid data.
    #[error("invalid distance code")]
    InvalidDistanceCode,
    /// A match refers to data before the start of the output.
    #[error("match distance goes past the start of the output")]
    DistanceTooFarBack,
    /// Input bytes remain after the final block.
    #[error("unexpected data after the final deflate block")]
    TrailingData,
    /// The output grew past the configured limit.
    #[error("decompressed data exceeds the output limit")]
    OutputLimitExceeded,
    /// The output buffer could not be grown.
    #[error("out of memory while growing the output buffer")]
    OutOfMemory,
}

/// Decompressor for raw deflate streams.
///
/// A decompressor owns the output of exactly one stream. Each block's Huffman tables live only
/// as long as the block being decoded.
#[derive(Debug)]
pub struct Decompressor {
    output: Vec<u8>,
    max_output: usize,
    last_block: bool,
    blocks: usize,
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor {
    /// Create a new decompressor with no output limit.
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            max_output: usize::MAX,
            last_block: false,
            blocks: 0,
        }
    }

    /// Fail with [`DecompressionError::OutputLimitExceeded`] instead of producing more than
    /// `limit` bytes.
    pub fn with_max_output(mut self, limit: usize) -> Self {
        self.max_output = limit;
        self
    }

    /// Decompress a complete raw deflate stream.
    ///
    /// The input must end with the final block: after it, at most the padding bits of its last
    /// byte may remain.
    pub fn decompress(mut self, input: &[u8]) -> Result<Vec<u8>, DecompressionError> {
        let mut reader = BitReader::new(input);
        while !self.last_block {
            self.decode_block(&mut reader)?;
        }

        reader.align_to_byte();
        if reader.is_overrun() {
            return Err(DecompressionError::InsufficientInput);
        }
        if reader.bytes_remaining() != 0 {
            return Err(DecompressionError::TrailingData);
        }

        debug!(
            "inflated {} bytes into {} bytes over {} blocks",
            input.len(),
            self.output.len(),
            self.blocks
        );
        Ok(self.output)
    }

    fn decode_block(&mut self, reader: &mut BitReader) -> Result<(), DecompressionError> {
        self.last_block = reader.bits_lsb(1)? == 1;
        let block_type = reader.bits_lsb(2)?;
        self.blocks += 1;
        trace!(
            "block {}: type {}, final {}, output so far {}",
            self.blocks,
            block_type,
            self.last_block,
            self.output.len()
        );

        match block_type {
            0 => self.stored_block(reader),
            1 => {
                let litlen =
                    HuffmanTable::build(LITLEN_TABLE_BITS, &FIXED_LITLEN_LENGTHS, MAX_CODE_LENGTH)
                        .ok_or(DecompressionError::BadLiteralLengthHuffmanTree)?;
                let dist =
                    HuffmanTable::build(DIST_TABLE_BITS, &FIXED_DIST_LENGTHS, MAX_CODE_LENGTH)
                        .ok_or(DecompressionError::BadDistanceHuffmanTree)?;
                self.compressed_block(reader, &litlen, &dist)
            }
            2 => {
                let (litlen, dist) = read_dynamic_tables(reader)?;
                self.compressed_block(reader, &litlen, &dist)
            }
            _ => Err(DecompressionError::InvalidBlockType),
        }
    }

    fn stored_block(&mut self, reader: &mut BitReader) -> Result<(), DecompressionError> {
        reader.align_to_byte();
        let header = reader.read_aligned_bytes(4)?;
        let len = u16::from_le_bytes([header[0], header[1]]);
        let nlen = u16::from_le_bytes([header[2], header[3]]);
        if nlen != !len {
            return Err(DecompressionError::InvalidUncompressedBlockLength);
        }

        let data = reader.read_aligned_bytes(len as usize)?;
        self.reserve(data.len())?;
        self.output.extend_from_slice(data);
        Ok(())
    }

    fn compressed_block(
        &mut self,
        reader: &mut BitReader,
        litlen: &HuffmanTable,
        dist: &HuffmanTable,
    ) -> Result<(), DecompressionError> {
        loop {
            let symbol = litlen.decode(reader)?;
            match symbol {
                0..=255 => {
                    self.reserve(1)?;
                    self.output.push(symbol as u8);
                }
                END_OF_BLOCK => return Ok(()),
                257..=285 => {
                    let index = usize::from(symbol - 257);
                    let length =
                        usize::from(LEN_BASE[index]) + reader.bits_lsb(LEN_EXTRA[index])? as usize;

                    let dist_symbol = usize::from(dist.decode(reader)?);
                    if dist_symbol >= DIST_BASE.len() {
                        return Err(DecompressionError::InvalidDistanceCode);
                    }
                    let distance = usize::from(DIST_BASE[dist_symbol])
                        + reader.bits_lsb(DIST_EXTRA[dist_symbol])? as usize;

                    self.reserve(length)?;
                    copy_match(&mut self.output, distance, length)?;
                }
                _ => return Err(DecompressionError::InvalidLiteralLengthCode),
            }
        }
    }

    /// Make room for `additional` more output bytes, enforcing the output limit.
    fn reserve(&mut self, additional: usize) -> Result<(), DecompressionError> {
        if additional > self.max_output.saturating_sub(self.output.len()) {
            return Err(DecompressionError::OutputLimitExceeded);
        }
        self.output
            .try_reserve(additional)
            .map_err(|_| DecompressionError::OutOfMemory)
    }
}

/// Read the code lengths of a dynamic block and build its literal/length and distance tables.
fn read_dynamic_tables(
    reader: &mut BitReader,
) -> Result<(HuffmanTable, HuffmanTable), DecompressionError> {
    let hlit = reader.bits_lsb(5)? as usize + 257;
    let hdist = reader.bits_lsb(5)? as usize + 1;
    let hclen = reader.bits_lsb(4)? as usize + 4;
    if hlit > 286 {
        return Err(DecompressionError::InvalidHlit);
    }
    if hdist > 30 {
        return Err(DecompressionError::InvalidHdist);
    }
    trace!("dynamic block: hlit {}, hdist {}, hclen {}", hlit, hdist, hclen);

    let mut code_length_lengths = [0u8; 19];
    for &symbol in &CLCL_ORDER[..hclen] {
        code_length_lengths[symbol] = reader.bits_lsb(3)? as u8;
    }
    let code_length_table = HuffmanTable::build(
        CODE_LENGTH_TABLE_BITS,
        &code_length_lengths,
        MAX_CODE_LENGTH_CODE_LENGTH,
    )
    .ok_or(DecompressionError::BadCodeLengthHuffmanTree)?;

    // Literal/length and distance code lengths are sent as one sequence, and repeats may cross
    // from one alphabet into the other.
    let total = hlit + hdist;
    let mut lengths = [0u8; 286 + 30];
    let mut i = 0;
    while i < total {
        let symbol = code_length_table.decode(reader)?;
        let (value, repeat) = match symbol {
            0..=15 => {
                lengths[i] = symbol as u8;
                i += 1;
                continue;
            }
            16 => {
                if i == 0 {
                    return Err(DecompressionError::InvalidCodeLengthRepeat);
                }
                (lengths[i - 1], 3 + reader.bits_lsb(2)?)
            }
            17 => (0, 3 + reader.bits_lsb(3)?),
            _ => (0, 11 + reader.bits_lsb(7)?),
        };

        let repeat = repeat as usize;
        if i + repeat > total {
            return Err(DecompressionError::InvalidCodeLengthRepeat);
        }
        lengths[i..i + repeat].fill(value);
        i += repeat;
    }

    let (litlen_lengths, dist_lengths) = lengths[..total].split_at(hlit);
    if litlen_lengths[END_OF_BLOCK as usize] == 0 {
        return Err(DecompressionError::BadLiteralLengthHuffmanTree);
    }

    let litlen = HuffmanTable::build(LITLEN_TABLE_BITS, litlen_lengths, MAX_CODE_LENGTH)
        .ok_or(DecompressionError::BadLiteralLengthHuffmanTree)?;
    let dist = HuffmanTable::build(DIST_TABLE_BITS, dist_lengths, MAX_CODE_LENGTH)
        .ok_or(DecompressionError::BadDistanceHuffmanTree)?;
    Ok((litlen, dist))
}

/// Append `length` bytes starting `distance` bytes back from the end of `output`.
///
/// When `length > distance` the source overlaps the bytes being written, so the copy proceeds one
/// distance-sized chunk at a time and repeats the pattern.
pub(crate) fn copy_match(
    output: &mut Vec<u8>,
    distance: usize,
    length: usize,
) -> Result<(), DecompressionError> {
    if distance == 0 || distance > output.len() {
        return Err(DecompressionError::DistanceTooFarBack);
    }

    let start = output.len() - distance;
    let mut remaining = length;
    while remaining > 0 {
        let n = remaining.min(distance);
        output.extend_from_within(start..start + n);
        remaining -= n;
    }
    Ok(())
}

/// Decompress a raw deflate stream into a new vector.
pub fn decompress_to_vec(input: &[u8]) -> Result<Vec<u8>, DecompressionError> {
    Decompressor::new().decompress(input)
}
