/// Order in which the code length code lengths are transmitted in a dynamic block header.
pub(crate) const CLCL_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Number of extra bits for each length symbol (257..=285).
#[rustfmt::skip]
pub(crate) const LEN_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2,
    3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base match length for each length symbol (257..=285).
#[rustfmt::skip]
pub(crate) const LEN_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31,
    35, 43, 51, 59, 67, 83, 99, 115, 131, 163, 195, 227, 258,
];

/// Number of extra bits for each distance symbol (0..=29).
#[rustfmt::skip]
pub(crate) const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6,
    7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13,
];

/// Base match distance for each distance symbol (0..=29).
#[rustfmt::skip]
pub(crate) const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193,
    257, 385, 513, 769, 1025, 1537, 2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Code lengths of the fixed literal/length alphabet (block type 1).
pub(crate) const FIXED_LITLEN_LENGTHS: [u8; 288] = fixed_litlen_lengths();

/// Code lengths of the fixed distance alphabet (block type 1).
pub(crate) const FIXED_DIST_LENGTHS: [u8; 32] = [5; 32];

const fn fixed_litlen_lengths() -> [u8; 288] {
    let mut lengths = [8u8; 288];
    let mut i = 144;
    while i < 256 {
        lengths[i] = 9;
        i += 1;
    }
    while i < 280 {
        lengths[i] = 7;
        i += 1;
    }
    lengths
}
