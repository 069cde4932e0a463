use std::f32::consts::{FRAC_PI_2, TAU};

use orb_cli::orb_brief::{
    ANGLE_BINS, DescriptorContainer, FeatureOrientation, OrbFeature, calculate_hamming_distance, feature_distance,
};
use orb_cli::orb_core::{DistortionState, Frame, IntegralImage, Point2, PointFeature};
use orb_cli::orb_fast::{FastFeatureDetector, FramePyramid};
use orb_cli::{OrbConfig, OrbExtractor, detect_reference_features_and_determine_descriptors};
use proptest::prelude::*;

fn noise_frame(width: usize, height: usize, seed: u32) -> Frame {
    let mut state = seed;
    let noise: Vec<u8> = (0..width * height)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect();
    Frame::from_fn(width, height, |x, y| {
        let (x0, y0) = (x.saturating_sub(1), y.saturating_sub(1));
        let sum = u32::from(noise[y0 * width + x0]) + u32::from(noise[y * width + x]);
        (sum / 2) as u8
    })
    .unwrap()
}

fn extractor(n_threads: usize) -> OrbExtractor {
    OrbExtractor::new(OrbConfig {
        pyramid_layers: 2,
        match_threshold: 0.15,
        n_threads,
        ..OrbConfig::default()
    })
    .unwrap()
}

fn angle_difference(a: f32, b: f32) -> f32 {
    let difference = (a - b).rem_euclid(TAU);
    difference.min(TAU - difference)
}

#[test]
fn scenario_a_bright_blob_gives_single_feature() {
    let frame = Frame::from_fn(64, 64, |x, y| match x.abs_diff(32) + y.abs_diff(32) {
        0 => 255,
        1 => 200,
        _ => 0,
    })
    .unwrap();

    let features = FastFeatureDetector::detect_features(&frame.view(), None, 20, true, false, None).unwrap();
    assert_eq!(features.len(), 1);
    assert!(features[0].observation().distance(&Point2::new(32.0, 32.0)) <= 1.0);
}

#[test]
fn scenario_b_constant_frame_has_no_features() {
    let frame = Frame::filled(100, 100, 128).unwrap();
    for threshold in [1, 20, 128, 255] {
        let features = FastFeatureDetector::detect_features(&frame.view(), None, threshold, true, false, None).unwrap();
        assert!(features.is_empty(), "threshold {threshold}");
    }
    assert!(extractor(1).detect_and_describe(&frame.view()).unwrap().is_empty());
}

#[test]
fn scenario_c_identical_frames_match_themselves() {
    let extractor = extractor(1);
    let forward = extractor.detect_and_describe(&noise_frame(200, 160, 7).view()).unwrap();
    let backward = extractor.detect_and_describe(&noise_frame(200, 160, 7).view()).unwrap();
    assert!(!forward.is_empty());
    assert_eq!(forward, backward);

    let correspondences = extractor.match_features(&forward, &backward).unwrap();
    assert_eq!(correspondences.len(), forward.len());
    for (index, correspondence) in correspondences.iter().enumerate() {
        assert_eq!((correspondence.forward, correspondence.backward), (index, index));
        assert_eq!(feature_distance(&forward[index], &backward[index]), Some(0));
    }
}

#[test]
fn scenario_d_rotation_shifts_orientation() {
    // smooth blob offset from the feature at `angle`
    let render = |angle: f32| {
        let (sin, cos) = angle.sin_cos();
        let (bx, by) = (50.0 + 9.0 * cos, 50.0 + 9.0 * sin);
        Frame::from_fn(101, 101, |x, y| {
            let (dx, dy) = (x as f32 - bx, y as f32 - by);
            (40.0 + 180.0 * (-(dx * dx + dy * dy) / 72.0).exp()).round() as u8
        })
        .unwrap()
    };
    let orientation_of = |frame: &Frame| {
        let integral = IntegralImage::new(&frame.view()).unwrap();
        let mut features = vec![OrbFeature::from_point(PointFeature::new(
            Point2::new(50.0, 50.0),
            DistortionState::Undistorted,
            0.0,
        ))];
        FeatureOrientation::determine_feature_orientation(&integral, &mut features, None).unwrap();
        features[0].orientation()
    };

    let base = 0.4f32;
    let reference = orientation_of(&render(base));
    let bin_resolution = TAU / ANGLE_BINS as f32;

    for theta in [0.3f32, 1.0, 2.5, 4.0] {
        let rotated = orientation_of(&render(base + theta));
        let shift = (rotated - reference).rem_euclid(TAU);
        assert!(
            angle_difference(shift, theta) < bin_resolution,
            "rotation {theta}: orientation moved from {reference} to {rotated}"
        );
    }

    // a quarter turn permutes pixels, so the orientation moves by exactly π/2
    let original = noise_frame(65, 65, 3);
    let turned = Frame::from_fn(65, 65, |x, y| original.view().pixel(y, 64 - x)).unwrap();
    let feature_at_center = |frame: &Frame| {
        FeatureOrientation::orientation(&IntegralImage::new(&frame.view()).unwrap(), Point2::new(32.0, 32.0))
    };
    let shift = feature_at_center(&turned) - feature_at_center(&original);
    assert!(angle_difference(shift, FRAC_PI_2) < 1e-4, "quarter turn moved orientation by {shift}");
}

#[test]
fn scenario_e_descriptor_container_round_trip() {
    let extractor = OrbExtractor::new(OrbConfig {
        pyramid_layers: 1,
        use_multi_layers: true,
        n_threads: 1,
        ..OrbConfig::default()
    })
    .unwrap();
    let features = extractor.detect_and_describe(&noise_frame(160, 160, 11).view()).unwrap();
    assert!(!features.is_empty());

    for feature in &features {
        let bytes = feature.descriptor_container().to_bytes();
        assert_eq!(bytes.len(), 8 + 3 * 32);

        let restored = DescriptorContainer::from_bytes(&bytes).unwrap();
        assert_eq!(restored.descriptors(), feature.descriptors());
        for (a, b) in restored.descriptors().iter().zip(feature.descriptors()) {
            assert_eq!(calculate_hamming_distance(a, b), 0);
        }

        let mut copy = OrbFeature::from_point(*feature.feature().point());
        copy.set_descriptors_from_container(&bytes).unwrap();
        assert_eq!(copy.descriptors(), feature.descriptors());
    }
}

#[test]
fn reference_features_equal_extractor_features() {
    let frame = noise_frame(180, 140, 5);
    let pyramid = FramePyramid::new(&frame.view(), 2, None).unwrap();
    let reference = detect_reference_features_and_determine_descriptors(&pyramid, false, 20, None).unwrap();

    let extractor = OrbExtractor::new(OrbConfig {
        threshold: 20,
        pyramid_layers: 2,
        n_threads: 1,
        ..OrbConfig::default()
    })
    .unwrap();
    assert_eq!(extractor.detect_and_describe(&frame.view()).unwrap(), reference);
}

#[test]
fn matches_respect_threshold() {
    let extractor = extractor(2);
    let forward = extractor.detect_and_describe(&noise_frame(160, 160, 1).view()).unwrap();
    let backward = extractor.detect_and_describe(&noise_frame(160, 160, 2).view()).unwrap();

    let max_distance = (256.0f32 * 0.15).round() as u32;
    for correspondence in extractor.match_features(&forward, &backward).unwrap() {
        let distance = feature_distance(&forward[correspondence.forward], &backward[correspondence.backward]);
        assert!(distance.is_some_and(|d| d <= max_distance));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn prop_parallel_pipeline_equals_sequential(seed in any::<u32>()) {
        let frame = noise_frame(150, 130, seed);
        let other = noise_frame(150, 130, seed.wrapping_add(1));
        let (sequential, parallel) = (extractor(1), extractor(4));

        let forward = sequential.detect_and_describe(&frame.view()).unwrap();
        prop_assert_eq!(&forward, &parallel.detect_and_describe(&frame.view()).unwrap());

        let backward = sequential.detect_and_describe(&other.view()).unwrap();
        prop_assert_eq!(
            sequential.match_features(&forward, &backward).unwrap(),
            parallel.match_features(&forward, &backward).unwrap()
        );
    }
}
