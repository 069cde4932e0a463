use orb_core::{DistortionState, FrameView, Point2, PointFeature, Worker};

use crate::corner_detection::CornerDetector;
use crate::error::{FastError, FastResult};
use crate::nms::NonMaximumSuppression;
use crate::refinement::KeypointRefinement;
use crate::types::SubRegion;

/// Smallest sub-region: 7 pixels for the ring test plus 2 for the suppression neighborhood.
pub const MIN_SUB_REGION_SIZE: usize = 9;

/// Margin between the sub-region border and the suppressed area.
const SUPPRESSION_MARGIN: usize = 4;

/// FAST-12 corner detector with non-maximum suppression
pub struct FastFeatureDetector;

impl FastFeatureDetector {
    /// Detects FAST corners inside `sub_region` (the whole frame if `None`) of a `Y8` frame.
    ///
    /// Features are returned in raster order with integer positions. Their strength is
    /// the coarse ring sum strength, or the precise strength if `precise_scoring` is set;
    /// in both cases it is only meaningful to rank features of one call.
    pub fn detect_features(
        frame: &FrameView<'_>,
        sub_region: Option<SubRegion>,
        threshold: u32,
        frame_is_undistorted: bool,
        precise_scoring: bool,
        worker: Option<&Worker>,
    ) -> FastResult<Vec<PointFeature>> {
        let frame = frame.require_y8()?;
        Self::validate_threshold(threshold)?;

        let region = sub_region.unwrap_or_else(|| SubRegion::full(&frame));
        region.validate(&frame, MIN_SUB_REGION_SIZE, MIN_SUB_REGION_SIZE)?;

        let mut suppression = NonMaximumSuppression::<u32>::new(frame.width(), frame.height());

        CornerDetector::detect_candidates(
            &frame,
            threshold,
            region.left,
            region.width,
            region.top,
            suppression.rows_mut(region.top, region.height),
            worker,
        );

        let strength_positions = suppression.suppress_non_maximum(
            region.left + SUPPRESSION_MARGIN,
            region.width - 2 * SUPPRESSION_MARGIN,
            region.top + SUPPRESSION_MARGIN,
            region.height - 2 * SUPPRESSION_MARGIN,
            worker,
        );

        let distortion_state = DistortionState::from_undistorted_flag(frame_is_undistorted);
        let mut features: Vec<PointFeature> = strength_positions
            .iter()
            .map(|position| {
                PointFeature::new(
                    Point2::new(position.x as f32, position.y as f32),
                    distortion_state,
                    position.strength as f32,
                )
            })
            .collect();

        if precise_scoring {
            KeypointRefinement::score_features_precise(&frame, threshold, &mut features, worker);
        }

        log::debug!(
            "FAST threshold {threshold}: {} candidates, {} features in {}x{} region",
            suppression.candidate_count(),
            features.len(),
            region.width,
            region.height
        );

        Ok(features)
    }

    fn validate_threshold(threshold: u32) -> FastResult<()> {
        if !(1..=255).contains(&threshold) {
            return Err(FastError::InvalidThreshold {
                value: threshold,
                min: 1,
                max: 255,
            });
        }
        Ok(())
    }
}

/// Entry points accepting frames of any supported pixel format.
pub struct Comfort;

impl Comfort {
    /// Converts `frame` to `Y8` if necessary and runs [`FastFeatureDetector::detect_features`].
    pub fn detect_features(
        frame: &FrameView<'_>,
        sub_region: Option<SubRegion>,
        threshold: u32,
        frame_is_undistorted: bool,
        precise_scoring: bool,
        worker: Option<&Worker>,
    ) -> FastResult<Vec<PointFeature>> {
        if frame.format() == orb_core::PixelFormat::Y8 {
            return FastFeatureDetector::detect_features(
                frame,
                sub_region,
                threshold,
                frame_is_undistorted,
                precise_scoring,
                worker,
            );
        }

        let y_frame = frame.to_y8()?;
        FastFeatureDetector::detect_features(
            &y_frame.view(),
            sub_region,
            threshold,
            frame_is_undistorted,
            precise_scoring,
            worker,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orb_core::{CoreError, Frame, PixelFormat};
    use proptest::prelude::*;

    /// White disk of `radius` at `(cx, cy)` on black.
    fn disk_frame(size: usize, cx: f32, cy: f32, radius: f32) -> Frame {
        Frame::from_fn(size, size, |x, y| {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= radius * radius { 255 } else { 0 }
        })
        .unwrap()
    }

    /// Plus shaped bright blobs of five pixels each.
    fn blobs_frame(size: usize, centers: &[(usize, usize)]) -> Frame {
        Frame::from_fn(size, size, |x, y| {
            let on_blob = centers.iter().any(|&(cx, cy)| x.abs_diff(cx) + y.abs_diff(cy) <= 1);
            if on_blob { 255 } else { 0 }
        })
        .unwrap()
    }

    fn textured_frame(width: usize, height: usize, seed: u32) -> Frame {
        let mut state = seed;
        let noise: Vec<u8> = (0..width * height)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect();
        // smooth a little so corners form clusters instead of isolated pixels
        Frame::from_fn(width, height, |x, y| {
            let x0 = x.saturating_sub(1);
            let y0 = y.saturating_sub(1);
            let sum = u32::from(noise[y0 * width + x0]) + u32::from(noise[y * width + x]);
            (sum / 2) as u8
        })
        .unwrap()
    }

    #[test]
    fn test_constant_frame_has_no_features() {
        let frame = Frame::filled(100, 100, 128).unwrap();
        for threshold in [1, 20, 255] {
            let features = FastFeatureDetector::detect_features(&frame.view(), None, threshold, true, false, None).unwrap();
            assert!(features.is_empty());
        }
    }

    #[test]
    fn test_blobs_detected() {
        let frame = blobs_frame(64, &[(20, 20), (44, 40)]);
        let features = FastFeatureDetector::detect_features(&frame.view(), None, 20, true, false, None).unwrap();
        assert_eq!(features.len(), 2);
        for center in [(20.0, 20.0), (44.0, 40.0)] {
            let center = Point2::new(center.0, center.1);
            assert!(
                features.iter().any(|f| f.observation().distance(&center) <= 1.0),
                "no feature near {center:?}"
            );
        }
    }

    #[test]
    fn test_small_blob_collapses_to_single_feature() {
        let frame = disk_frame(64, 32.0, 32.0, 1.0);
        let features = FastFeatureDetector::detect_features(&frame.view(), None, 20, true, false, None).unwrap();
        assert_eq!(features.len(), 1);
        assert!(features[0].observation().distance(&Point2::new(32.0, 32.0)) <= 1.0);
    }

    #[test]
    fn test_large_uniform_disk_has_no_features() {
        // every ring around the disk boundary is at most half outside, too short for a 12 pixel arc
        let bright = disk_frame(64, 32.0, 32.0, 8.0);
        let dark = Frame::from_fn(64, 64, |x, y| 255 - bright.view().pixel(x, y)).unwrap();
        for frame in [bright, dark] {
            let features = FastFeatureDetector::detect_features(&frame.view(), None, 20, true, false, None).unwrap();
            assert!(features.is_empty());
        }
    }

    #[test]
    fn test_distortion_state_follows_flag() {
        let frame = blobs_frame(64, &[(30, 30)]);
        let features = FastFeatureDetector::detect_features(&frame.view(), None, 20, false, false, None).unwrap();
        assert!(!features.is_empty());
        assert!(features.iter().all(|f| f.distortion_state() == DistortionState::Distorted));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let frame = Frame::filled(32, 32, 0).unwrap();
        let view = frame.view();
        assert!(matches!(
            FastFeatureDetector::detect_features(&view, None, 0, true, false, None),
            Err(FastError::InvalidThreshold { value: 0, .. })
        ));
        assert!(matches!(
            FastFeatureDetector::detect_features(&view, None, 256, true, false, None),
            Err(FastError::InvalidThreshold { value: 256, .. })
        ));
        assert!(matches!(
            FastFeatureDetector::detect_features(&view, Some(SubRegion::new(0, 0, 8, 32)), 20, true, false, None),
            Err(FastError::InvalidSubRegion { .. })
        ));
        assert!(matches!(
            FastFeatureDetector::detect_features(&view, Some(SubRegion::new(30, 0, 9, 9)), 20, true, false, None),
            Err(FastError::InvalidSubRegion { .. })
        ));
        assert!(matches!(
            FastFeatureDetector::detect_features(&view, Some(SubRegion::new(usize::MAX - 3, 0, 9, 9)), 20, true, false, None),
            Err(FastError::InvalidSubRegion { .. })
        ));
    }

    #[test]
    fn test_color_frame_requires_comfort() {
        let data = vec![0u8; 32 * 32 * 3];
        let view = FrameView::new(&data, 32, 32, 0, PixelFormat::Rgb24).unwrap();
        assert!(matches!(
            FastFeatureDetector::detect_features(&view, None, 20, true, false, None),
            Err(FastError::Core(CoreError::UnsupportedPixelFormat(PixelFormat::Rgb24, PixelFormat::Y8)))
        ));
        assert!(Comfort::detect_features(&view, None, 20, true, false, None).unwrap().is_empty());
    }

    #[test]
    fn test_comfort_matches_gray_detection() {
        let gray = blobs_frame(48, &[(12, 12), (30, 20)]);
        let rgb: Vec<u8> = gray.data().iter().flat_map(|&v| [v, v, v]).collect();
        let color = FrameView::new(&rgb, 48, 48, 0, PixelFormat::Rgb24).unwrap();
        let expected = FastFeatureDetector::detect_features(&gray.view(), None, 20, true, false, None).unwrap();
        let actual = Comfort::detect_features(&color, None, 20, true, false, None).unwrap();
        assert_eq!(expected.len(), 2);
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_sub_region_limits_features() {
        let frame = blobs_frame(64, &[(20, 20), (44, 44)]);
        let region = SubRegion::new(10, 10, 20, 20);
        let features = FastFeatureDetector::detect_features(&frame.view(), Some(region), 20, true, false, None).unwrap();
        assert_eq!(features.len(), 1);
        assert!(features[0].observation().distance(&Point2::new(20.0, 20.0)) <= 1.0);
    }

    #[test]
    fn test_padded_frame_matches_continuous() {
        let frame = textured_frame(40, 30, 7);
        let mut padded = Vec::new();
        for y in 0..30 {
            padded.extend_from_slice(frame.view().row(y));
            padded.extend_from_slice(&[0, 255, 0, 255, 0]);
        }
        let padded_view = FrameView::new(&padded, 40, 30, 5, PixelFormat::Y8).unwrap();
        let expected = FastFeatureDetector::detect_features(&frame.view(), None, 10, true, true, None).unwrap();
        let actual = FastFeatureDetector::detect_features(&padded_view, None, 10, true, true, None).unwrap();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_precise_scoring_keeps_positions() {
        let frame = textured_frame(80, 60, 3);
        let coarse = FastFeatureDetector::detect_features(&frame.view(), None, 15, true, false, None).unwrap();
        let precise = FastFeatureDetector::detect_features(&frame.view(), None, 15, true, true, None).unwrap();
        assert_eq!(coarse.len(), precise.len());
        for (c, p) in coarse.iter().zip(&precise) {
            assert_eq!(c.observation(), p.observation());
            assert!(p.strength() > (16 * 255 * 14) as f32);
        }
    }

    #[test]
    fn test_parallel_detection_equals_sequential() {
        let frame = textured_frame(160, 120, 11);
        let worker = Worker::new(4).unwrap();
        for precise in [false, true] {
            let sequential = FastFeatureDetector::detect_features(&frame.view(), None, 12, true, precise, None).unwrap();
            let parallel =
                FastFeatureDetector::detect_features(&frame.view(), None, 12, true, precise, Some(&worker)).unwrap();
            assert_eq!(sequential, parallel);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_candidate_count_non_increasing_in_threshold(seed in 0u32..10_000, threshold in 1u32..255) {
            let frame = textured_frame(48, 48, seed);
            let view = frame.view();
            let region = SubRegion::full(&view);

            let count = |t: u32| {
                let mut suppression = NonMaximumSuppression::<u32>::new(48, 48);
                CornerDetector::detect_candidates(&view, t, 0, 48, 0, suppression.rows_mut(region.top, region.height), None);
                suppression.candidate_count()
            };

            prop_assert!(count(threshold + 1) <= count(threshold));
        }
    }
}
