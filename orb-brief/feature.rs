use orb_core::{OrientedPointFeature, Point2, PointFeature};

use crate::container::DescriptorContainer;
use crate::descriptor::OrbDescriptor;
use crate::error::BriefResult;

/// How the descriptors of a feature were computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptorType {
    #[default]
    Undescribed,
    /// Steered by the feature orientation.
    Oriented,
}

/// Oriented point feature with its binary descriptors.
///
/// Holds one descriptor, or three when computed on multiple layers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrbFeature {
    feature: OrientedPointFeature,
    descriptors: Vec<OrbDescriptor>,
    descriptor_type: DescriptorType,
}

impl OrbFeature {
    pub fn new(feature: OrientedPointFeature) -> Self {
        Self {
            feature,
            descriptors: Vec::new(),
            descriptor_type: DescriptorType::Undescribed,
        }
    }

    pub fn from_point(point: PointFeature) -> Self {
        Self::new(OrientedPointFeature::from(point))
    }

    pub fn feature(&self) -> &OrientedPointFeature {
        &self.feature
    }

    pub fn observation(&self) -> Point2 {
        self.feature.observation()
    }

    pub fn strength(&self) -> f32 {
        self.feature.strength()
    }

    pub fn orientation(&self) -> f32 {
        self.feature.orientation()
    }

    /// Sets the orientation, range [0, 2π).
    pub fn set_orientation(&mut self, orientation: f32) {
        self.feature.set_orientation(orientation);
    }

    pub fn descriptors(&self) -> &[OrbDescriptor] {
        &self.descriptors
    }

    pub fn descriptor_type(&self) -> DescriptorType {
        self.descriptor_type
    }

    pub fn add_descriptor(&mut self, descriptor: OrbDescriptor) {
        self.descriptors.push(descriptor);
    }

    pub fn set_descriptor_type(&mut self, descriptor_type: DescriptorType) {
        self.descriptor_type = descriptor_type;
    }

    /// The same feature at another position, orientation and descriptors are kept.
    pub fn relocated(self, observation: Point2) -> Self {
        let point = self.feature.point();
        let point = PointFeature::new(observation, point.distortion_state(), point.strength());
        Self {
            feature: OrientedPointFeature::new(point, self.feature.orientation()),
            ..self
        }
    }

    /// The descriptors in their serialized layout.
    pub fn descriptor_container(&self) -> DescriptorContainer {
        DescriptorContainer::new(self.descriptors.clone())
    }

    /// Appends the descriptors of a serialized container.
    ///
    /// The feature counts as oriented once it holds a descriptor. Nothing is appended
    /// if the container is malformed.
    pub fn set_descriptors_from_container(&mut self, bytes: &[u8]) -> BriefResult<()> {
        let container = DescriptorContainer::from_bytes(bytes)?;
        self.descriptors.extend(container.into_descriptors());
        if !self.descriptors.is_empty() {
            self.descriptor_type = DescriptorType::Oriented;
        }
        Ok(())
    }
}

impl From<PointFeature> for OrbFeature {
    fn from(point: PointFeature) -> Self {
        Self::from_point(point)
    }
}

/// Converts point features to ORB features, dropping every feature closer than
/// `border` pixels to a frame edge.
///
/// A feature is kept if `border <= x < width - border` and `border <= y < height - border`.
pub fn features_to_orb_features(features: &[PointFeature], width: usize, height: usize, border: usize) -> Vec<OrbFeature> {
    if width <= 2 * border || height <= 2 * border {
        return Vec::new();
    }

    let (min, max_x, max_y) = (border as f32, (width - border) as f32, (height - border) as f32);

    features
        .iter()
        .filter(|feature| {
            let p = feature.observation();
            p.x >= min && p.y >= min && p.x < max_x && p.y < max_y
        })
        .map(|&feature| OrbFeature::from_point(feature))
        .collect()
}
