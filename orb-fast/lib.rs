//! FAST and Harris corner detection with non-maximum suppression.
//!
//! [`FastFeatureDetector`] classifies every pixel with the FAST-12 segment test,
//! keeps local maxima of a 3x3 neighborhood and optionally rescores them with
//! the largest passing threshold. [`ConfiguredDetector`] runs either detector
//! over a [`FramePyramid`] with settings from a [`DetectorConfig`].

pub mod builder;
pub mod config;
pub mod configured_detector;
pub mod corner_detection;
pub mod detector;
pub mod error;
pub mod harris;
pub mod nms;
pub mod pyramid;
pub mod refinement;
pub mod types;
pub mod utils;

pub use builder::DetectorBuilder;
pub use config::{DetectorConfig, DetectorKind};
pub use configured_detector::ConfiguredDetector;
pub use corner_detection::{CornerDetector, RingAccessor};
pub use detector::{Comfort, FastFeatureDetector, MIN_SUB_REGION_SIZE};
pub use error::{FastError, FastResult};
pub use harris::HarrisCornerDetector;
pub use nms::{CandidateRow, NonMaximumSuppression, StrengthPosition};
pub use pyramid::FramePyramid;
pub use refinement::KeypointRefinement;
pub use types::{CornerType, ScaleLevel, SubRegion};
