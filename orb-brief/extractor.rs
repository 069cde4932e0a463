use std::f32::consts::{FRAC_1_SQRT_2, SQRT_2};

use orb_core::{IntegralImage, Point2, Worker, for_each_chunk_mut};

use crate::descriptor::OrbDescriptor;
use crate::error::{BriefError, BriefResult};
use crate::feature::{DescriptorType, OrbFeature};
use crate::pattern::{SamplingPairs, SamplingPattern};

/// Pattern scale and patch size of one descriptor layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptorLayer {
    pub factor: f32,
    pub patch_size: usize,
}

/// Layers of a multi-layer description; the first one is used alone otherwise.
pub const DESCRIPTOR_LAYERS: [DescriptorLayer; 3] = [
    DescriptorLayer { factor: 1.0, patch_size: 5 },
    DescriptorLayer { factor: FRAC_1_SQRT_2, patch_size: 3 },
    DescriptorLayer { factor: SQRT_2, patch_size: 7 },
];

/// Smallest distance to the left and top border for single layer descriptors.
pub const SINGLE_LAYER_BORDER: usize = 21;

/// Smallest distance to every border for multi-layer descriptors.
pub const MULTI_LAYER_BORDER: usize = 43;

const PARALLEL_MIN_FEATURES: usize = 32;

/// Oriented BRIEF descriptor computation on an integral image.
#[derive(Debug, Clone, Copy)]
pub struct BriefGenerator<'a> {
    pattern: &'a SamplingPattern,
}

impl BriefGenerator<'static> {
    /// Generator using the shared sampling pattern.
    pub fn new() -> Self {
        Self {
            pattern: SamplingPattern::get(),
        }
    }
}

impl Default for BriefGenerator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> BriefGenerator<'a> {
    pub fn with_pattern(pattern: &'a SamplingPattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &'a SamplingPattern {
        self.pattern
    }

    /// Appends one descriptor per layer to every feature and marks it as oriented.
    ///
    /// Single layer description needs features inside `[21, width - 22] x [21, height - 22]`,
    /// multi-layer description inside `[43, width - 43] x [43, height - 43]`. If any feature
    /// violates the border no feature is modified.
    pub fn determine_descriptors(
        &self,
        integral: &IntegralImage,
        features: &mut [OrbFeature],
        use_multi_layers: bool,
        worker: Option<&Worker>,
    ) -> BriefResult<()> {
        if let Some(feature) = features
            .iter()
            .find(|f| !Self::is_inside_border(integral, f.observation(), use_multi_layers))
        {
            let p = feature.observation();
            return Err(BriefError::FeatureOutsideBorder {
                x: p.x,
                y: p.y,
                border: if use_multi_layers { MULTI_LAYER_BORDER } else { SINGLE_LAYER_BORDER },
                width: integral.width(),
                height: integral.height(),
            });
        }

        let layers = if use_multi_layers { &DESCRIPTOR_LAYERS[..] } else { &DESCRIPTOR_LAYERS[..1] };

        for_each_chunk_mut(worker, features, PARALLEL_MIN_FEATURES, |_, chunk| {
            for feature in chunk {
                let pairs = self.pattern.by_angle(feature.orientation());
                for layer in layers {
                    let descriptor = Self::compute_descriptor(integral, feature.observation(), pairs, layer);
                    feature.add_descriptor(descriptor);
                }
                feature.set_descriptor_type(DescriptorType::Oriented);
            }
        });

        log::debug!("described {} features on {} layers", features.len(), layers.len());
        Ok(())
    }

    /// Whether a feature at `p` can be described.
    pub fn is_inside_border(integral: &IntegralImage, p: Point2, use_multi_layers: bool) -> bool {
        let (width, height) = (integral.width() as f32, integral.height() as f32);
        let (min, right, bottom) = if use_multi_layers {
            let border = MULTI_LAYER_BORDER as f32;
            (border, width - border, height - border)
        } else {
            let border = SINGLE_LAYER_BORDER as f32;
            (border, width - border - 1.0, height - border - 1.0)
        };
        p.x >= min && p.y >= min && p.x <= right && p.y <= bottom
    }

    /// Descriptor of one layer, bit `i` is set if the first patch of pair `i` is darker than the second.
    ///
    /// Patches are centered at the rounded feature position plus the scaled pair offsets.
    pub fn compute_descriptor(
        integral: &IntegralImage,
        observation: Point2,
        pairs: &SamplingPairs,
        layer: &DescriptorLayer,
    ) -> OrbDescriptor {
        let (cx, cy) = (observation.x.round(), observation.y.round());
        let (factor, patch) = (layer.factor, layer.patch_size);

        let mut descriptor = OrbDescriptor::default();
        for (index, pair) in pairs.iter().enumerate() {
            let intensity1 = integral.patch_intensity_sum(cx + pair.x1 * factor, cy + pair.y1 * factor, patch, patch);
            let intensity2 = integral.patch_intensity_sum(cx + pair.x2 * factor, cy + pair.y2 * factor, patch, patch);
            if intensity1 < intensity2 {
                descriptor.set_bit(index, true);
            }
        }
        descriptor
    }
}
