use orb_core::{FrameView, Worker, for_each_chunk_mut};

use crate::nms::{CandidateRow, add_to_row};
use crate::types::CornerType;
use crate::utils::{has_arc, ring_mask};

/// Ring indices of the four cardinal pixels (top, right, bottom, left).
const CARDINAL_INDICES: [usize; 4] = [0, 4, 8, 12];

/// Reads the 16 ring pixels around a center with precomputed element offsets.
///
/// ```text
///        15 00 01
///     14          02
///  13                03
///  12       XX       04
///  11                05
///     10          06
///        09 08 07
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RingAccessor {
    offsets: [isize; 16],
}

impl RingAccessor {
    pub fn new(stride_elements: usize) -> Self {
        let stride = stride_elements as isize;
        let mut offsets = [0isize; 16];
        for (offset, &(dx, dy)) in offsets.iter_mut().zip(CornerDetector::FAST_OFFSETS.iter()) {
            *offset = dy as isize * stride + dx as isize;
        }
        Self { offsets }
    }

    /// Ring pixels around the element at `center`, which must be at least 3 pixels from each frame border.
    #[inline]
    pub fn ring(&self, data: &[u8], center: usize) -> [u8; 16] {
        let mut ring = [0u8; 16];
        for (value, &offset) in ring.iter_mut().zip(self.offsets.iter()) {
            *value = data[center.wrapping_add_signed(offset)];
        }
        ring
    }

    /// Ring pixels around `(x, y)` of a `Y8` frame.
    #[inline]
    pub fn ring_at(&self, frame: &FrameView<'_>, x: usize, y: usize) -> [u8; 16] {
        debug_assert!(x >= 3 && y >= 3 && x + 3 < frame.width() && y + 3 < frame.height());
        self.ring(frame.data(), y * frame.stride_elements() + x)
    }
}

/// Segment test classification on the 16 pixel Bresenham ring
pub struct CornerDetector;

impl CornerDetector {
    /// FAST circle offsets, clockwise from the top pixel
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Whether 12 contiguous ring pixels are all brighter than `center + threshold`
    /// or all darker than `center - threshold`.
    ///
    /// Any arc of 12 pixels covers at least three of the four cardinal pixels,
    /// which rejects most non-corners before the full masks are built.
    #[inline]
    pub fn classify(ring: &[u8; 16], center: u8, threshold: u32) -> CornerType {
        let center_high = i32::from(center) + threshold as i32;
        let center_low = i32::from(center) - threshold as i32;

        let cardinal_higher = CARDINAL_INDICES
            .iter()
            .filter(|&&i| i32::from(ring[i]) > center_high)
            .count();

        if cardinal_higher >= 3 {
            let higher = ring.map(|pixel| i32::from(pixel) > center_high);
            return if has_arc(ring_mask(&higher)) {
                CornerType::Bright
            } else {
                CornerType::None
            };
        }

        let cardinal_lower = CARDINAL_INDICES
            .iter()
            .filter(|&&i| i32::from(ring[i]) < center_low)
            .count();

        if cardinal_lower >= 3 {
            let lower = ring.map(|pixel| i32::from(pixel) < center_low);
            if has_arc(ring_mask(&lower)) {
                return CornerType::Dark;
            }
        }

        CornerType::None
    }

    /// Signed deviation of the ring sum from sixteen times the center, positive for corners.
    #[inline]
    pub fn margin(ring: &[u8; 16], center: u8, corner_type: CornerType) -> i32 {
        let sum: i32 = ring.iter().map(|&pixel| i32::from(pixel)).sum();
        let center_sum = 16 * i32::from(center);
        match corner_type {
            CornerType::Bright => sum - center_sum,
            CornerType::Dark => center_sum - sum,
            CornerType::None => 0,
        }
    }

    /// Offset keeping every coarse strength of a threshold non-negative.
    #[inline]
    pub const fn strength_correction(threshold: u32) -> u32 {
        16 * 255 * threshold
    }

    /// Classifies all pixels of a column and row range and collects corner candidates.
    ///
    /// Candidate rows are `[max(3, first_row), min(first_row + number_rows, height - 3))`,
    /// columns alike. `rows` holds the candidate rows starting at `first_row`; each
    /// worker fills its own rows.
    pub fn detect_candidates(
        frame: &FrameView<'_>,
        threshold: u32,
        first_column: usize,
        number_columns: usize,
        first_row: usize,
        rows: &mut [CandidateRow<u32>],
        worker: Option<&Worker>,
    ) {
        let begin_column = first_column.max(3);
        let end_column = (first_column + number_columns).min(frame.width().saturating_sub(3));
        if begin_column >= end_column {
            return;
        }

        let accessor = RingAccessor::new(frame.stride_elements());
        let correction = Self::strength_correction(threshold);
        let height = frame.height();
        let data = frame.data();
        let stride = frame.stride_elements();

        for_each_chunk_mut(worker, rows, 20, |offset, chunk| {
            for (i, row) in chunk.iter_mut().enumerate() {
                let y = first_row + offset + i;
                if y < 3 || y + 3 >= height {
                    continue;
                }

                let row_start = y * stride;
                for x in begin_column..end_column {
                    let center_index = row_start + x;
                    let center = data[center_index];
                    let ring = accessor.ring(data, center_index);

                    let corner_type = Self::classify(&ring, center, threshold);
                    if corner_type == CornerType::None {
                        continue;
                    }

                    let strength = Self::margin(&ring, center, corner_type) + correction as i32;
                    debug_assert!(strength >= 0);
                    add_to_row(row, x as u32, strength as u32);
                }
            }
        });
    }
}
