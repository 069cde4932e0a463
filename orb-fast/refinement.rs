use orb_core::{FrameView, PointFeature, Worker, for_each_chunk_mut};

use crate::corner_detection::{CornerDetector, RingAccessor};
use crate::types::CornerType;

/// Feature count above which precise scoring is distributed over the worker.
const PARALLEL_SCORING_MIN_FEATURES: usize = 100;

/// Strength refinement of detected corners
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Replaces the coarse strength of every feature by its precise strength.
    pub fn score_features_precise(
        frame: &FrameView<'_>,
        threshold: u32,
        features: &mut [PointFeature],
        worker: Option<&Worker>,
    ) {
        let accessor = RingAccessor::new(frame.stride_elements());

        for_each_chunk_mut(worker, features, PARALLEL_SCORING_MIN_FEATURES, |_, chunk| {
            for feature in chunk {
                let strength = Self::precise_strength(frame, &accessor, threshold, feature);
                feature.set_strength(strength as f32);
            }
        });
    }

    /// Largest threshold in `[threshold, 255]` at which the feature still passes the
    /// segment test, found by binary search.
    ///
    /// Returns `16 * 255 * t + margin` with `t` the last tested threshold and `margin`
    /// the signed ring sum deviation at the last passing test.
    pub fn precise_strength(
        frame: &FrameView<'_>,
        accessor: &RingAccessor,
        threshold: u32,
        feature: &PointFeature,
    ) -> u32 {
        let observation = feature.observation();
        let x = observation.x as usize;
        let y = observation.y as usize;

        let ring = accessor.ring_at(frame, x, y);
        let center = frame.pixel(x, y);

        let mut lower_test = threshold;
        let mut upper_test = 255u32;
        let mut old_test = u32::MAX;
        let mut margin = 0i32;

        loop {
            let test = lower_test + (upper_test - lower_test + 1) / 2;
            if test == old_test {
                break;
            }
            old_test = test;

            let corner_type = CornerDetector::classify(&ring, center, test);
            if corner_type != CornerType::None {
                margin = CornerDetector::margin(&ring, center, corner_type);
                lower_test = test;
                continue;
            }

            upper_test = test;
            if lower_test + 1 == upper_test {
                upper_test -= 1;
            }
        }

        (CornerDetector::strength_correction(old_test) as i32 + margin).max(0) as u32
    }
}
