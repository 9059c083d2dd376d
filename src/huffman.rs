use crate::{bitreader::BitReader, DecompressionError};

/// A decoded symbol together with the length of the code that produced it.
///
/// A length of zero marks a code that no symbol was assigned to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Leaf {
    symbol: u16,
    length: u8,
}

#[derive(Debug)]
enum Entry {
    /// Codes no longer than the primary table width resolve directly.
    Direct(Leaf),
    /// Longer codes continue in a secondary table indexed by the remaining bits.
    Indirect(Box<[Leaf]>),
}

/// Two level decoding table for a canonical Huffman code.
///
/// The primary table is indexed by the next `primary_bits` bits of the stream (read most
/// significant bit first). Every code of length `L <= primary_bits` is replicated into all the
/// `2^(primary_bits - L)` slots sharing its prefix. Longer codes share a secondary table per
/// `primary_bits` prefix, indexed by the following `max_length - primary_bits` bits.
#[derive(Debug)]
pub(crate) struct HuffmanTable {
    primary: Vec<Entry>,
    primary_bits: u8,
    max_length: u8,
}

impl HuffmanTable {
    /// Builds a table from per-symbol code lengths, where symbol `i` has length `lengths[i]` and
    /// zero means the symbol is unused.
    ///
    /// Returns `None` if a length exceeds `max_length` or if the lengths over-subscribe the code
    /// space. Incomplete codes are accepted; reading one of their unassigned codes fails at
    /// decode time.
    pub fn build(primary_bits: u8, lengths: &[u8], max_length: u8) -> Option<Self> {
        debug_assert!(max_length <= 15);

        // Count the number of symbols with each code length.
        let mut histogram = [0u16; 16];
        for &length in lengths {
            if length > max_length {
                return None;
            }
            histogram[length as usize] += 1;
        }
        histogram[0] = 0;

        // Check that no more codes are used than there is room for.
        let mut available = 1i32;
        for &count in &histogram[1..] {
            available = (available << 1) - i32::from(count);
            if available < 0 {
                return None;
            }
        }

        let longest = (1..16).rev().find(|&l| histogram[l] != 0).unwrap_or(1) as u8;
        let primary_bits = primary_bits.min(longest);

        // First code of each length. Codes of equal length are consecutive in symbol order.
        let mut next_code = [0u16; 16];
        let mut code = 0u16;
        for length in 1..=longest as usize {
            code = (code + histogram[length - 1]) << 1;
            next_code[length] = code;
        }

        let mut primary: Vec<Entry> = (0..1usize << primary_bits)
            .map(|_| Entry::Direct(Leaf::default()))
            .collect();
        let secondary_size = 1usize << (longest - primary_bits);

        for (symbol, &length) in lengths.iter().enumerate() {
            if length == 0 {
                continue;
            }
            let code = next_code[length as usize] as usize;
            next_code[length as usize] += 1;

            let leaf = Leaf {
                symbol: symbol as u16,
                length,
            };

            if length <= primary_bits {
                let shift = primary_bits - length;
                let start = code << shift;
                for entry in &mut primary[start..start + (1 << shift)] {
                    debug_assert!(matches!(entry, Entry::Direct(Leaf { length: 0, .. })));
                    *entry = Entry::Direct(leaf);
                }
            } else {
                let suffix_bits = length - primary_bits;
                let prefix = code >> suffix_bits;
                let suffix = code & ((1 << suffix_bits) - 1);

                let secondary = secondary_mut(&mut primary[prefix], secondary_size);
                let shift = longest - length;
                let start = suffix << shift;
                for slot in &mut secondary[start..start + (1 << shift)] {
                    debug_assert_eq!(slot.length, 0);
                    *slot = leaf;
                }
            }
        }

        Some(Self {
            primary,
            primary_bits,
            max_length: longest,
        })
    }

    /// Decodes one symbol. Bits read beyond the end of the matched code are given back to the
    /// reader.
    pub fn decode(&self, reader: &mut BitReader) -> Result<u16, DecompressionError> {
        let index = reader.bits_msb(self.primary_bits)? as usize;
        match &self.primary[index] {
            Entry::Direct(leaf) => {
                if leaf.length == 0 {
                    return Err(DecompressionError::InvalidHuffmanCode);
                }
                reader.return_bits(self.primary_bits - leaf.length);
                Ok(leaf.symbol)
            }
            Entry::Indirect(secondary) => {
                let secondary_bits = self.max_length - self.primary_bits;
                let leaf = secondary[reader.bits_msb(secondary_bits)? as usize];
                if leaf.length == 0 {
                    return Err(DecompressionError::InvalidHuffmanCode);
                }
                reader.return_bits(self.max_length - leaf.length);
                Ok(leaf.symbol)
            }
        }
    }
}

/// Returns the secondary table behind `entry`, allocating it on first use.
fn secondary_mut(entry: &mut Entry, size: usize) -> &mut [Leaf] {
    if let Entry::Direct(leaf) = entry {
        debug_assert_eq!(leaf.length, 0, "long code shares a prefix with a short code");
        *entry = Entry::Indirect(vec![Leaf::default(); size].into_boxed_slice());
    }
    match entry {
        Entry::Indirect(secondary) => &mut secondary[..],
        Entry::Direct(_) => unreachable!(),
    }
}
