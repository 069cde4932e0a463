//! Bit-mask helpers for the 16 pixel ring of the segment test.

use std::sync::OnceLock;

/// Number of contiguous ring pixels a corner needs.
pub const ARC_LENGTH: usize = 12;

/// Packs 16 ring predicates into a mask, bit `i` for ring pixel `i`.
#[inline]
pub fn ring_mask(predicates: &[bool; 16]) -> u16 {
    predicates
        .iter()
        .enumerate()
        .fold(0u16, |mask, (i, &set)| mask | (u16::from(set) << i))
}

/// Check if there are at least `min_count` consecutive set bits in the circular 16 bit mask
/// using a branch-free rotation approach
pub fn has_consecutive_bits(mask: u16, min_count: usize) -> bool {
    if min_count > 16 || min_count == 0 {
        return false;
    }

    // a run of length n survives mask & rotl(mask, 1) & ... & rotl(mask, n - 1)
    let mut test_mask = mask;
    for i in 1..min_count {
        test_mask &= mask.rotate_left(i as u32);
        if test_mask == 0 {
            return false;
        }
    }

    test_mask != 0
}

/// Scans the mask twice around the circle for a run of `min_count` set bits.
pub fn has_consecutive_bits_scan(mask: u16, min_count: usize) -> bool {
    if min_count > 16 || min_count == 0 {
        return false;
    }

    let mut current = 0;
    for i in 0..32 {
        if mask & (1 << (i % 16)) != 0 {
            current += 1;
            if current >= min_count {
                return true;
            }
        } else {
            current = 0;
        }
    }

    false
}

fn arc_table() -> &'static [bool] {
    static TABLE: OnceLock<Box<[bool]>> = OnceLock::new();
    TABLE.get_or_init(|| {
        log::trace!("building {}-arc lookup table", ARC_LENGTH);
        (0..=u16::MAX)
            .map(|mask| has_consecutive_bits(mask, ARC_LENGTH))
            .collect()
    })
}

/// Whether `mask` holds an arc of at least [`ARC_LENGTH`] contiguous ring pixels.
#[inline]
pub fn has_arc(mask: u16) -> bool {
    arc_table()[usize::from(mask)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consecutive_bits_simple() {
        let mask = 0b0000_0001_1111_1111u16;
        assert!(has_consecutive_bits(mask, 9));
        assert!(!has_consecutive_bits(mask, 10));
    }

    #[test]
    fn test_consecutive_bits_wrap_around() {
        let mut predicates = [false; 16];
        for i in (10..16).chain(0..6) {
            predicates[i] = true;
        }
        let mask = ring_mask(&predicates);
        assert!(has_arc(mask));
        assert!(!has_consecutive_bits(mask, 13));
    }

    #[test]
    fn test_alternating_bits() {
        assert!(!has_consecutive_bits(0b0101_0101_0101_0101, 2));
        assert!(has_consecutive_bits(0b0101_0101_0101_0101, 1));
    }

    #[test]
    fn test_table_matches_scan_for_all_masks() {
        for mask in 0..=u16::MAX {
            assert_eq!(has_arc(mask), has_consecutive_bits_scan(mask, ARC_LENGTH), "mask {mask:#06x}");
        }
    }

    #[test]
    fn test_ring_mask_bit_order() {
        let mut predicates = [false; 16];
        predicates[0] = true;
        predicates[15] = true;
        assert_eq!(ring_mask(&predicates), 0b1000_0000_0000_0001);
    }
}
