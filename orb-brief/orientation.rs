use orb_core::{IntegralImage, Point2, Worker, for_each_chunk_mut, normalize_angle};

use crate::error::{BriefError, BriefResult};
use crate::feature::OrbFeature;

/// Radius of the circular patch used for the intensity centroid.
pub const ORIENTATION_RADIUS: usize = 15;

/// Lengths of the strips at offsets 1 to 15 from the center, a discretized disk of radius 15.
const STRIP_LENGTHS: [usize; ORIENTATION_RADIUS] = [29, 29, 29, 29, 29, 27, 27, 25, 25, 23, 21, 19, 15, 11, 1];

const PARALLEL_MIN_FEATURES: usize = 64;

/// Intensity centroid orientation of features.
pub struct FeatureOrientation;

impl FeatureOrientation {
    /// Sets the orientation of every feature to the direction of its intensity centroid.
    ///
    /// Every feature must be at least 15 pixels away from each border of the frame the
    /// integral image was built from; otherwise no feature is modified.
    pub fn determine_feature_orientation(
        integral: &IntegralImage,
        features: &mut [OrbFeature],
        worker: Option<&Worker>,
    ) -> BriefResult<()> {
        if let Some(feature) = features.iter().find(|f| !Self::is_inside_border(integral, f.observation())) {
            let p = feature.observation();
            return Err(BriefError::FeatureOutsideBorder {
                x: p.x,
                y: p.y,
                border: ORIENTATION_RADIUS,
                width: integral.width(),
                height: integral.height(),
            });
        }

        for_each_chunk_mut(worker, features, PARALLEL_MIN_FEATURES, |_, chunk| {
            for feature in chunk {
                let orientation = Self::orientation(integral, feature.observation());
                feature.set_orientation(orientation);
            }
        });

        log::debug!("determined orientation of {} features", features.len());
        Ok(())
    }

    /// Whether the whole circular patch around `p` lies inside the frame.
    pub fn is_inside_border(integral: &IntegralImage, p: Point2) -> bool {
        let size = 2 * ORIENTATION_RADIUS + 1;
        integral.contains_patch(p.x, p.y, size, size)
    }

    /// Angle of the intensity centroid around `p`, range [0, 2π).
    ///
    /// `m10 = Σ k (S(k) - S(-k))` over the vertical strips at horizontal offsets `k`,
    /// `m01` likewise over the horizontal strips.
    pub fn orientation(integral: &IntegralImage, p: Point2) -> f32 {
        let mut m10 = 0.0f32;
        let mut m01 = 0.0f32;

        for (index, &length) in STRIP_LENGTHS.iter().enumerate() {
            let offset = (index + 1) as f32;

            let right = integral.patch_intensity_sum(p.x + offset, p.y, 1, length);
            let left = integral.patch_intensity_sum(p.x - offset, p.y, 1, length);
            m10 += offset * (right - left);

            let bottom = integral.patch_intensity_sum(p.x, p.y + offset, length, 1);
            let top = integral.patch_intensity_sum(p.x, p.y - offset, length, 1);
            m01 += offset * (bottom - top);
        }

        normalize_angle(m01.atan2(m10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orb_core::{DistortionState, Frame, PointFeature};
    use proptest::prelude::*;
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    fn feature_at(x: f32, y: f32) -> OrbFeature {
        OrbFeature::from_point(PointFeature::new(Point2::new(x, y), DistortionState::Undistorted, 0.0))
    }

    fn integral_of(frame: &Frame) -> IntegralImage {
        IntegralImage::new(&frame.view()).unwrap()
    }

    fn angle_difference(a: f32, b: f32) -> f32 {
        let difference = (a - b).rem_euclid(TAU);
        difference.min(TAU - difference)
    }

    #[test]
    fn test_gradient_directions() {
        // brighter to the right, below, to the left and above
        let cases: [(fn(usize, usize) -> u8, f32); 4] = [
            (|x, _| (x * 3) as u8, 0.0),
            (|_, y| (y * 3) as u8, FRAC_PI_2),
            (|x, _| (255 - x * 3) as u8, PI),
            (|_, y| (255 - y * 3) as u8, 3.0 * FRAC_PI_2),
        ];
        for (pixel, expected) in cases {
            let frame = Frame::from_fn(64, 64, pixel).unwrap();
            let orientation = FeatureOrientation::orientation(&integral_of(&frame), Point2::new(32.0, 32.0));
            assert!(angle_difference(orientation, expected) < 1e-3, "{orientation} != {expected}");
        }
    }

    #[test]
    fn test_constant_patch_has_zero_orientation() {
        let frame = Frame::filled(40, 40, 77).unwrap();
        let orientation = FeatureOrientation::orientation(&integral_of(&frame), Point2::new(20.0, 20.0));
        assert_eq!(orientation, 0.0);
    }

    #[test]
    fn test_border_is_checked_before_mutation() {
        let frame = Frame::from_fn(64, 64, |x, y| ((x + 2 * y) % 256) as u8).unwrap();
        let integral = integral_of(&frame);

        let mut features = vec![feature_at(32.0, 32.0), feature_at(15.0, 48.0), feature_at(48.0, 48.0)];
        assert!(FeatureOrientation::determine_feature_orientation(&integral, &mut features, None).is_ok());

        let mut features = vec![feature_at(32.0, 32.0), feature_at(49.0, 20.0)];
        let result = FeatureOrientation::determine_feature_orientation(&integral, &mut features, None);
        assert!(matches!(result, Err(BriefError::FeatureOutsideBorder { border: 15, .. })));
        assert_eq!(features[0].orientation(), 0.0);

        assert!(FeatureOrientation::is_inside_border(&integral, Point2::new(48.0, 15.0)));
        assert!(!FeatureOrientation::is_inside_border(&integral, Point2::new(14.0, 32.0)));
        assert!(!FeatureOrientation::is_inside_border(&integral, Point2::new(48.5, 32.0)));
    }

    #[test]
    fn test_parallel_equals_sequential() {
        let frame = Frame::from_fn(160, 120, |x, y| ((x * x + 3 * y * x + y) % 251) as u8).unwrap();
        let integral = integral_of(&frame);
        let worker = Worker::new(4).unwrap();

        let mut sequential: Vec<OrbFeature> = (0..300)
            .map(|i| feature_at((16 + i % 128) as f32, (16 + (i * 7) % 88) as f32))
            .collect();
        let mut parallel = sequential.clone();

        FeatureOrientation::determine_feature_orientation(&integral, &mut sequential, None).unwrap();
        FeatureOrientation::determine_feature_orientation(&integral, &mut parallel, Some(&worker)).unwrap();
        assert_eq!(sequential, parallel);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_orientation_in_range(seed in any::<u32>(), x in 15.0f32..48.0, y in 15.0f32..48.0) {
            let frame = Frame::from_fn(64, 64, |px, py| {
                let mut state = seed ^ (py as u32 * 64 + px as u32).wrapping_mul(2_654_435_761);
                state ^= state >> 15;
                state = state.wrapping_mul(2_246_822_519);
                (state >> 24) as u8
            })
            .unwrap();
            let orientation = FeatureOrientation::orientation(&integral_of(&frame), Point2::new(x, y));
            prop_assert!((0.0..TAU).contains(&orientation));
        }
    }
}
