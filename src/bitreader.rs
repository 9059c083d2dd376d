use crate::DecompressionError;

/// Reads a deflate stream one bit at a time.
///
/// The reader is a cursor over a borrowed slice. The cursor counts consumed bits and is allowed
/// to move past the end of the input, in which case every bit read there is zero. Whether such an
/// overrun is acceptable is decided by the caller once the stream has ended.
pub(crate) struct BitReader<'a> {
    input: &'a [u8],
    cursor: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, cursor: 0 }
    }

    fn total_bits(&self) -> u64 {
        self.input.len() as u64 * 8
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.total_bits()
    }

    /// Returns the next bit, low-order bit of each byte first. Zero once the input is exhausted.
    pub fn next_bit(&mut self) -> u32 {
        let byte = (self.cursor / 8) as usize;
        let bit = (self.cursor % 8) as u32;
        self.cursor += 1;
        match self.input.get(byte) {
            Some(&b) => u32::from(b >> bit) & 1,
            None => 0,
        }
    }

    /// Reads `count` bits, with the first bit read ending up in the least significant position.
    /// This is how deflate stores every field except Huffman codes.
    pub fn bits_lsb(&mut self, count: u8) -> Result<u32, DecompressionError> {
        debug_assert!(count <= 16);
        if self.is_exhausted() {
            return Err(DecompressionError::InsufficientInput);
        }
        let mut value = 0;
        for i in 0..count {
            value |= self.next_bit() << i;
        }
        Ok(value)
    }

    /// Reads `count` bits, with the first bit read ending up in the most significant position.
    /// Huffman codes are packed this way.
    pub fn bits_msb(&mut self, count: u8) -> Result<u32, DecompressionError> {
        debug_assert!(count <= 16);
        if self.is_exhausted() {
            return Err(DecompressionError::InsufficientInput);
        }
        let mut value = 0;
        for _ in 0..count {
            value = (value << 1) | self.next_bit();
        }
        Ok(value)
    }

    /// Gives back `count` bits that were read but not used.
    pub fn return_bits(&mut self, count: u8) {
        debug_assert!(u64::from(count) <= self.cursor);
        self.cursor -= u64::from(count);
    }

    /// Skips the rest of a partially consumed byte.
    pub fn align_to_byte(&mut self) {
        self.cursor = (self.cursor + 7) & !7;
    }

    /// Borrows `len` whole bytes. The reader must be byte aligned.
    pub fn read_aligned_bytes(&mut self, len: usize) -> Result<&'a [u8], DecompressionError> {
        debug_assert_eq!(self.cursor % 8, 0);
        if self.bytes_remaining() < len {
            return Err(DecompressionError::InsufficientInput);
        }
        let start = (self.cursor / 8) as usize;
        self.cursor += len as u64 * 8;
        Ok(&self.input[start..start + len])
    }

    /// Number of whole bytes that have not been touched yet.
    pub fn bytes_remaining(&self) -> usize {
        let consumed = ((self.cursor + 7) / 8).min(self.input.len() as u64);
        self.input.len() - consumed as usize
    }

    /// Whether bits past the end of the input were consumed and kept.
    pub fn is_overrun(&self) -> bool {
        self.cursor > self.total_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_order() {
        let mut reader = BitReader::new(&[0b1011_0001, 0b0000_0011]);
        assert_eq!(reader.next_bit(), 1);
        assert_eq!(reader.next_bit(), 0);
        assert_eq!(reader.bits_lsb(3).unwrap(), 0b100);
        assert_eq!(reader.bits_msb(3).unwrap(), 0b101);
        // Crosses into the second byte.
        assert_eq!(reader.bits_lsb(2).unwrap(), 0b11);
        assert_eq!(reader.bytes_remaining(), 0);
    }

    #[test]
    fn lsb_and_msb_differ() {
        let mut lsb = BitReader::new(&[0b0000_0110]);
        let mut msb = BitReader::new(&[0b0000_0110]);
        assert_eq!(lsb.bits_lsb(3).unwrap(), 0b110);
        assert_eq!(msb.bits_msb(3).unwrap(), 0b011);
    }

    #[test]
    fn return_bits_across_bytes() {
        let mut reader = BitReader::new(&[0xff, 0x00, 0xaa]);
        assert_eq!(reader.bits_lsb(12).unwrap(), 0x0ff);
        reader.return_bits(6);
        assert_eq!(reader.bits_lsb(6).unwrap(), 0b00_0011);
        assert_eq!(reader.bits_lsb(12).unwrap(), 0xaa0);
    }

    #[test]
    fn align_and_copy() {
        let mut reader = BitReader::new(&[0x01, 0x02, 0x03, 0x04]);
        reader.bits_lsb(3).unwrap();
        reader.align_to_byte();
        assert_eq!(reader.bytes_remaining(), 3);
        assert_eq!(reader.read_aligned_bytes(2).unwrap(), &[0x02, 0x03]);
        assert!(reader.read_aligned_bytes(2).is_err());
        assert_eq!(reader.read_aligned_bytes(1).unwrap(), &[0x04]);

        // Aligning an aligned reader is a no-op.
        reader.align_to_byte();
        assert_eq!(reader.bytes_remaining(), 0);
        assert!(!reader.is_overrun());
    }

    #[test]
    fn exhausted_input() {
        let mut reader = BitReader::new(&[0x80]);
        assert_eq!(reader.bits_lsb(7).unwrap(), 0);
        // The read starts inside the buffer, so it pads with zeros instead of failing.
        assert_eq!(reader.bits_msb(4).unwrap(), 0b1000);
        assert!(reader.is_overrun());
        assert!(matches!(
            reader.bits_lsb(1),
            Err(DecompressionError::InsufficientInput)
        ));
        assert!(matches!(
            reader.bits_msb(1),
            Err(DecompressionError::InsufficientInput)
        ));
        assert_eq!(reader.next_bit(), 0);

        reader.return_bits(4);
        assert!(!reader.is_overrun());
    }
}
