use orb_core::{Correspondence, Worker, map_ranges};

use crate::descriptor::{DESCRIPTOR_BITS, calculate_hamming_distance};
use crate::error::{BriefError, BriefResult};
use crate::feature::OrbFeature;

const PARALLEL_MIN_FEATURES: usize = 16;

/// Largest Hamming distance accepted for a match threshold in [0, 1].
pub fn max_hamming_distance(threshold: f32) -> u32 {
    (DESCRIPTOR_BITS as f32 * threshold).round() as u32
}

/// Smallest Hamming distance over all descriptor pairs of two features, `None` if one
/// of them has no descriptor.
pub fn feature_distance(a: &OrbFeature, b: &OrbFeature) -> Option<u32> {
    a.descriptors()
        .iter()
        .flat_map(|da| b.descriptors().iter().map(move |db| calculate_hamming_distance(da, db)))
        .min()
}

/// Matches every forward feature to its closest backward feature.
///
/// A correspondence is reported if the smallest distance over all descriptor pairs is at
/// most `round(256 * threshold)`. Of equally distant backward features the first one wins.
/// Several forward features may match the same backward feature. Correspondences are
/// ordered by forward index.
pub fn determine_non_bijective_correspondences(
    forward_features: &[OrbFeature],
    backward_features: &[OrbFeature],
    threshold: f32,
    worker: Option<&Worker>,
) -> BriefResult<Vec<Correspondence>> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(BriefError::InvalidMatchThreshold(threshold));
    }

    let max_distance = max_hamming_distance(threshold);

    let correspondences: Vec<Correspondence> = map_ranges(
        worker,
        0,
        forward_features.len(),
        PARALLEL_MIN_FEATURES,
        |first, count| {
            let mut local = Vec::new();
            for forward_index in first..first + count {
                let forward = &forward_features[forward_index];
                if let Some(backward_index) = best_match(forward, backward_features, max_distance) {
                    local.push(Correspondence::new(forward_index, backward_index));
                }
            }
            local
        },
    )
    .into_iter()
    .flatten()
    .collect();

    log::debug!(
        "{} of {} forward features matched {} backward features within distance {max_distance}",
        correspondences.len(),
        forward_features.len(),
        backward_features.len()
    );

    Ok(correspondences)
}

fn best_match(forward: &OrbFeature, backward_features: &[OrbFeature], max_distance: u32) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;

    for (backward_index, backward) in backward_features.iter().enumerate() {
        let Some(distance) = feature_distance(forward, backward) else {
            continue;
        };
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((backward_index, distance));
        }
    }

    best.filter(|&(_, distance)| distance <= max_distance).map(|(index, _)| index)
}
