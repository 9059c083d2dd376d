use crate::DecodingError;

/// The per-scanline filter types of PNG filter method 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FilterType {
    NoFilter = 0,
    Sub = 1,
    Up = 2,
    Avg = 3,
    Paeth = 4,
}

impl FilterType {
    /// Returns `None` for bytes outside `0..=4`.
    pub fn from_u8(n: u8) -> Option<FilterType> {
        match n {
            0 => Some(FilterType::NoFilter),
            1 => Some(FilterType::Sub),
            2 => Some(FilterType::Up),
            3 => Some(FilterType::Avg),
            4 => Some(FilterType::Paeth),
            _ => None,
        }
    }
}

/// The Paeth predictor: whichever of left (`a`), up (`b`) or up-left (`c`) is closest to
/// `a + b - c`.
///
/// Ties go to `a`, then `b`. The order of the comparisons matters.
#[inline]
pub fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Reverses the scanline filters of a non-interlaced 8-bit image.
///
/// `filtered` holds `height` rows of one filter type byte followed by `width * channels`
/// filtered bytes. The result holds the reconstructed rows without the filter bytes.
pub fn unfilter(
    filtered: &[u8],
    width: u32,
    height: u32,
    channels: u8,
) -> Result<Vec<u8>, DecodingError> {
    if width == 0 || height == 0 || !(1..=4).contains(&channels) {
        return Err(DecodingError::InvalidArgument);
    }
    let bpp = usize::from(channels);
    let stride = width as usize * bpp;
    let expected = (stride + 1) * height as usize;
    if filtered.len() != expected {
        return Err(DecodingError::UnexpectedDataSize {
            expected,
            actual: filtered.len(),
        });
    }

    let mut pixels = Vec::new();
    pixels.try_reserve_exact(stride * height as usize)?;

    for (row, line) in filtered.chunks_exact(stride + 1).enumerate() {
        let filter = FilterType::from_u8(line[0]).ok_or(DecodingError::InvalidFilterType {
            filter: line[0],
            row,
        })?;

        let start = pixels.len();
        pixels.extend_from_slice(&line[1..]);
        let (done, current) = pixels.split_at_mut(start);
        let previous = if row == 0 {
            None
        } else {
            Some(&done[start - stride..])
        };
        unfilter_row(filter, bpp, previous, current);
    }

    Ok(pixels)
}

/// Reconstructs one row in place. Without a previous row, up and up-left read as zero.
fn unfilter_row(filter: FilterType, bpp: usize, previous: Option<&[u8]>, current: &mut [u8]) {
    match filter {
        FilterType::NoFilter => {}
        FilterType::Sub => {
            for i in bpp..current.len() {
                current[i] = current[i].wrapping_add(current[i - bpp]);
            }
        }
        FilterType::Up => {
            if let Some(previous) = previous {
                for (byte, &up) in current.iter_mut().zip(previous) {
                    *byte = byte.wrapping_add(up);
                }
            }
        }
        FilterType::Avg => {
            for i in 0..current.len() {
                let left = if i >= bpp { current[i - bpp] } else { 0 };
                let up = previous.map_or(0, |p| p[i]);
                let average = (u16::from(left) + u16::from(up)) / 2;
                current[i] = current[i].wrapping_add(average as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..current.len() {
                let left = if i >= bpp { current[i - bpp] } else { 0 };
                let (up, up_left) = match previous {
                    Some(p) => (p[i], if i >= bpp { p[i - bpp] } else { 0 }),
                    None => (0, 0),
                };
                current[i] = current[i].wrapping_add(paeth_predict(left, up, up_left));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Applies `filter` to every row of `pixels`, prefixing each with its filter type byte.
    fn filter(pixels: &[u8], stride: usize, bpp: usize, filter: FilterType) -> Vec<u8> {
        let mut out = Vec::new();
        let zeros = vec![0u8; stride];
        for (row, line) in pixels.chunks_exact(stride).enumerate() {
            let up_row = if row == 0 {
                &zeros[..]
            } else {
                &pixels[(row - 1) * stride..row * stride]
            };
            out.push(filter as u8);
            for i in 0..stride {
                let left = if i >= bpp { line[i - bpp] } else { 0 };
                let up = up_row[i];
                let up_left = if i >= bpp { up_row[i - bpp] } else { 0 };
                let predicted = match filter {
                    FilterType::NoFilter => 0,
                    FilterType::Sub => left,
                    FilterType::Up => up,
                    FilterType::Avg => ((u16::from(left) + u16::from(up)) / 2) as u8,
                    FilterType::Paeth => paeth_predict(left, up, up_left),
                };
                out.push(line[i].wrapping_sub(predicted));
            }
        }
        out
    }

    #[test]
    fn paeth() {
        assert_eq!(paeth_predict(10, 10, 10), 10);
        // p = 10: pa = 10, pb = 10, pc = 0.
        assert_eq!(paeth_predict(0, 20, 10), 10);
        // p = 20: pa = 20, pb = 10, pc = 10, so up wins the tie with up-left.
        assert_eq!(paeth_predict(0, 30, 10), 30);
        // p = 0: pa = 5, pb = 0, pc = 5.
        assert_eq!(paeth_predict(5, 0, 5), 0);
        assert_eq!(paeth_predict(255, 255, 0), 255);
        assert_eq!(paeth_predict(0, 0, 255), 0);
    }

    #[test]
    fn filter_types() {
        for n in 0..=4 {
            assert_eq!(FilterType::from_u8(n).unwrap() as u8, n);
        }
        assert_eq!(FilterType::from_u8(5), None);
        assert_eq!(FilterType::from_u8(255), None);
    }

    #[test]
    fn unfilter_each_type() {
        let mut rng = rand::thread_rng();
        for channels in 1..=4u8 {
            let (width, height) = (7u32, 5u32);
            let stride = width as usize * channels as usize;
            let pixels: Vec<u8> = (0..stride * height as usize).map(|_| rng.gen()).collect();
            for filter_type in [
                FilterType::NoFilter,
                FilterType::Sub,
                FilterType::Up,
                FilterType::Avg,
                FilterType::Paeth,
            ] {
                let filtered = filter(&pixels, stride, channels as usize, filter_type);
                assert_eq!(
                    unfilter(&filtered, width, height, channels).unwrap(),
                    pixels,
                    "{:?} with {} channels",
                    filter_type,
                    channels
                );
            }
        }
    }

    #[test]
    fn unfilter_mixed_rows() {
        // One row per filter type, 2x5 RGB.
        let pixels: Vec<u8> = (0..30u8).map(|i| i.wrapping_mul(37)).collect();
        let stride = 6;
        let mut filtered = Vec::new();
        for (row, filter_type) in [
            FilterType::Paeth,
            FilterType::Avg,
            FilterType::Up,
            FilterType::Sub,
            FilterType::NoFilter,
        ]
        .iter()
        .enumerate()
        {
            let all = filter(&pixels, stride, 3, *filter_type);
            filtered.extend_from_slice(&all[row * (stride + 1)..(row + 1) * (stride + 1)]);
        }
        assert_eq!(unfilter(&filtered, 2, 5, 3).unwrap(), pixels);
    }

    #[test]
    fn first_row_reads_zero_above() {
        // Up on the first row is a no-op, and Avg only sees the left neighbor.
        assert_eq!(unfilter(&[2, 1, 2, 3], 3, 1, 1).unwrap(), vec![1, 2, 3]);
        assert_eq!(unfilter(&[3, 10, 10, 10], 3, 1, 1).unwrap(), vec![10, 15, 17]);
        assert_eq!(unfilter(&[4, 10, 10, 10], 3, 1, 1).unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn sub_wraps() {
        assert_eq!(unfilter(&[1, 200, 100], 2, 1, 1).unwrap(), vec![200, 44]);
    }

    #[test]
    fn invalid_filter_type() {
        let filtered = [0, 1, 2, 5, 3, 4];
        assert!(matches!(
            unfilter(&filtered, 2, 2, 1),
            Err(DecodingError::InvalidFilterType { filter: 5, row: 1 })
        ));
    }

    #[test]
    fn wrong_size() {
        assert!(matches!(
            unfilter(&[0, 1, 2], 3, 1, 1),
            Err(DecodingError::UnexpectedDataSize {
                expected: 4,
                actual: 3
            })
        ));
        assert!(matches!(
            unfilter(&[0, 1], 1, 1, 5),
            Err(DecodingError::InvalidArgument)
        ));
    }
}
