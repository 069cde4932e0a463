//! Oriented BRIEF descriptors for ORB features.
//!
//! Features get their orientation from the intensity centroid of a circular patch,
//! are described by 256 patch comparisons steered by that orientation and are matched
//! by the Hamming distance of their descriptors.

pub mod container;
pub mod descriptor;
pub mod error;
pub mod extractor;
pub mod feature;
pub mod matcher;
pub mod orientation;
pub mod pattern;

pub use container::DescriptorContainer;
pub use descriptor::{DESCRIPTOR_BITS, DESCRIPTOR_BYTES, OrbDescriptor, calculate_hamming_distance};
pub use error::{BriefError, BriefResult};
pub use extractor::{BriefGenerator, DESCRIPTOR_LAYERS, DescriptorLayer, MULTI_LAYER_BORDER, SINGLE_LAYER_BORDER};
pub use feature::{DescriptorType, OrbFeature, features_to_orb_features};
pub use matcher::{determine_non_bijective_correspondences, feature_distance, max_hamming_distance};
pub use orientation::{FeatureOrientation, ORIENTATION_RADIUS};
pub use pattern::{ANGLE_BINS, SamplingPair, SamplingPairs, SamplingPattern};
