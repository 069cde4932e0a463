use orb_core::{DistortionState, FrameView, Point2, PointFeature, Worker, for_each_chunk_mut};

use crate::error::{FastError, FastResult};
use crate::nms::{NonMaximumSuppression, add_to_row};
use crate::types::SubRegion;

/// Harris corner detector on integer Sobel responses.
///
/// Responses are the 3x3 Sobel filters divided by 8; the structure tensor sums
/// them over a 3x3 window and the vote is
/// `(Ixx/8)(Iyy/8) - (Ixy/8)^2 - 3 ((Ixx + Iyy)/8)^2 / 64`.
pub struct HarrisCornerDetector;

impl HarrisCornerDetector {
    pub const MAX_THRESHOLD: u32 = 512;
    pub const MIN_WIDTH: usize = 10;
    pub const MIN_HEIGHT: usize = 7;

    /// Vote threshold corresponding to a user threshold, `(t^2 / 8)^2`.
    pub const fn internal_threshold(threshold: u32) -> i32 {
        let reduced = threshold * threshold / 8;
        (reduced * reduced) as i32
    }

    /// Detects Harris corners inside `sub_region` (the whole frame if `None`).
    ///
    /// Corners keep integer positions and carry their vote as strength, in raster order.
    pub fn detect_corners(
        frame: &FrameView<'_>,
        sub_region: Option<SubRegion>,
        threshold: u32,
        frame_is_undistorted: bool,
        worker: Option<&Worker>,
    ) -> FastResult<Vec<PointFeature>> {
        let frame = frame.require_y8()?;
        if threshold > Self::MAX_THRESHOLD {
            return Err(FastError::InvalidThreshold {
                value: threshold,
                min: 0,
                max: Self::MAX_THRESHOLD,
            });
        }

        let region = sub_region.unwrap_or_else(|| SubRegion::full(&frame));
        region.validate(&frame, Self::MIN_WIDTH, Self::MIN_HEIGHT)?;

        let gradients = Self::sobel_responses(&frame, worker);
        let internal_threshold = Self::internal_threshold(threshold);
        let width = frame.width();

        let mut suppression = NonMaximumSuppression::<i32>::new(frame.width(), frame.height());

        let first_row = region.top + 2;
        let number_rows = region.height - 4;
        let begin_column = region.left + 2;
        let end_column = region.right() - 2;

        for_each_chunk_mut(worker, suppression.rows_mut(first_row, number_rows), 10, |offset, rows| {
            for (i, row) in rows.iter_mut().enumerate() {
                let y = first_row + offset + i;
                for x in begin_column..end_column {
                    let vote = Self::vote_from_responses(&gradients, width, x, y);
                    if vote >= internal_threshold {
                        add_to_row(row, x as u32, vote);
                    }
                }
            }
        });

        let strength_positions = suppression.suppress_non_maximum(
            region.left + 3,
            region.width - 6,
            region.top + 3,
            region.height - 6,
            worker,
        );

        let distortion_state = DistortionState::from_undistorted_flag(frame_is_undistorted);
        let corners: Vec<PointFeature> = strength_positions
            .iter()
            .map(|position| {
                PointFeature::new(
                    Point2::new(position.x as f32, position.y as f32),
                    distortion_state,
                    position.strength as f32,
                )
            })
            .collect();

        log::debug!(
            "Harris threshold {threshold}: {} candidates, {} corners",
            suppression.candidate_count(),
            corners.len()
        );

        Ok(corners)
    }

    /// Harris vote of a single pixel at least 2 pixels away from every border.
    pub fn harris_vote(frame: &FrameView<'_>, x: usize, y: usize) -> i32 {
        debug_assert!(x >= 2 && y >= 2 && x + 2 < frame.width() && y + 2 < frame.height());

        let mut responses = [(0i32, 0i32); 9];
        for (index, response) in responses.iter_mut().enumerate() {
            *response = Self::sobel(frame, x + index % 3 - 1, y + index / 3 - 1);
        }

        Self::vote(&responses)
    }

    /// Horizontal and vertical Sobel responses divided by 8, zero along the frame border.
    fn sobel_responses(frame: &FrameView<'_>, worker: Option<&Worker>) -> Vec<(i32, i32)> {
        let (width, height) = (frame.width(), frame.height());
        let mut responses = vec![(0i32, 0i32); width * height];

        for_each_chunk_mut(worker, &mut responses, 4096, |offset, chunk| {
            for (i, response) in chunk.iter_mut().enumerate() {
                let index = offset + i;
                let (x, y) = (index % width, index / width);
                if x >= 1 && y >= 1 && x + 1 < width && y + 1 < height {
                    *response = Self::sobel(frame, x, y);
                }
            }
        });

        responses
    }

    #[inline]
    fn sobel(frame: &FrameView<'_>, x: usize, y: usize) -> (i32, i32) {
        let p = |dx: usize, dy: usize| i32::from(frame.pixel(x + dx - 1, y + dy - 1));

        let horizontal = p(2, 0) + 2 * p(2, 1) + p(2, 2) - p(0, 0) - 2 * p(0, 1) - p(0, 2);
        let vertical = p(0, 2) + 2 * p(1, 2) + p(2, 2) - p(0, 0) - 2 * p(1, 0) - p(2, 0);

        (horizontal / 8, vertical / 8)
    }

    #[inline]
    fn vote_from_responses(responses: &[(i32, i32)], width: usize, x: usize, y: usize) -> i32 {
        let mut window = [(0i32, 0i32); 9];
        for (index, response) in window.iter_mut().enumerate() {
            *response = responses[(y + index / 3 - 1) * width + x + index % 3 - 1];
        }
        Self::vote(&window)
    }

    #[inline]
    fn vote(window: &[(i32, i32); 9]) -> i32 {
        let (mut ixx, mut iyy, mut ixy) = (0i64, 0i64, 0i64);
        for &(gx, gy) in window {
            let (gx, gy) = (i64::from(gx), i64::from(gy));
            ixx += gx * gx;
            iyy += gy * gy;
            ixy += gx * gy;
        }

        let determinant = (ixx / 8) * (iyy / 8) - (ixy / 8) * (ixy / 8);
        let trace = (ixx + iyy) / 8;

        (determinant - trace * trace * 3 / 64) as i32
    }
}
