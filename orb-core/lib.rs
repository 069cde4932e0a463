//! Shared building blocks of the ORB pipeline: frames, feature value types,
//! the lined integral image and the worker pool.

pub mod error;
pub mod feature;
pub mod frame;
pub mod integral;
pub mod worker;

pub use error::{CoreError, CoreResult};
pub use feature::{Correspondence, DistortionState, OrientedPointFeature, Point2, PointFeature, normalize_angle};
pub use frame::{Frame, FrameView, PixelFormat};
pub use integral::IntegralImage;
pub use worker::{Worker, for_each_chunk_mut, map_ranges};

/// Settings of the complete detect, describe and match pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbConfig {
    /// FAST (or Harris) threshold, range [1, 255].
    pub threshold: u8,
    pub precise_scoring: bool,
    pub frame_is_undistorted: bool,
    pub use_harris_features: bool,
    pub pyramid_layers: usize,
    /// Descriptors on three scales instead of one.
    pub use_multi_layers: bool,
    /// Fraction of the 256 descriptor bits that may differ for a match, range [0, 1].
    pub match_threshold: f32,
    pub n_threads: usize,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            precise_scoring: false,
            frame_is_undistorted: true,
            use_harris_features: false,
            pyramid_layers: 3,
            use_multi_layers: false,
            match_threshold: 0.2,
            n_threads: num_cpus::get().max(1),
        }
    }
}

impl OrbConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.threshold == 0 {
            return Err(CoreError::InvalidConfig("threshold must be in [1, 255]".to_string()));
        }
        if self.pyramid_layers == 0 {
            return Err(CoreError::InvalidConfig("at least one pyramid layer is required".to_string()));
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(CoreError::InvalidConfig(format!(
                "match threshold {} outside [0, 1]",
                self.match_threshold
            )));
        }
        if self.n_threads == 0 {
            return Err(CoreError::InvalidThreadCount(self.n_threads));
        }
        Ok(())
    }

    /// Worker matching `n_threads`, or `None` when a single thread is requested.
    pub fn create_worker(&self) -> CoreResult<Option<Worker>> {
        match self.n_threads {
            0 => Err(CoreError::InvalidThreadCount(0)),
            1 => Ok(None),
            n => Worker::new(n).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(OrbConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let config = OrbConfig {
            threshold: 0,
            ..OrbConfig::default()
        };
        assert!(config.validate().is_err());

        let config = OrbConfig {
            match_threshold: 1.5,
            ..OrbConfig::default()
        };
        assert!(config.validate().is_err());

        let config = OrbConfig {
            pyramid_layers: 0,
            ..OrbConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_single_thread_has_no_worker() {
        let config = OrbConfig {
            n_threads: 1,
            ..OrbConfig::default()
        };
        assert!(config.create_worker().unwrap().is_none());
    }
}
