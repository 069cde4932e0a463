use crate::config::{DetectorConfig, DetectorKind};
use crate::configured_detector::ConfiguredDetector;
use crate::error::FastResult;
use crate::types::SubRegion;

/// Builder for creating a `ConfiguredDetector`
#[derive(Debug, Clone, Default)]
pub struct DetectorBuilder {
    config: DetectorConfig,
}

impl DetectorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the FAST detector (the default)
    pub fn fast(mut self) -> Self {
        self.config.detector = DetectorKind::Fast;
        self
    }

    /// Run the Harris corner detector
    pub fn harris(mut self) -> Self {
        self.config.detector = DetectorKind::Harris;
        self
    }

    /// Set the detection threshold
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Enable or disable precise FAST scoring
    pub fn precise_scoring(mut self, enable: bool) -> Self {
        self.config.precise_scoring = enable;
        self
    }

    pub fn frame_is_undistorted(mut self, undistorted: bool) -> Self {
        self.config.frame_is_undistorted = undistorted;
        self
    }

    pub fn pyramid_layers(mut self, layers: usize) -> Self {
        self.config.pyramid_layers = layers;
        self
    }

    /// Restrict detection to a region of the finest layer
    pub fn sub_region(mut self, region: SubRegion) -> Self {
        self.config.sub_region = Some(region);
        self
    }

    /// Suppress weaker features within `radius` pixels of a stronger one
    pub fn suppression_radius(mut self, radius: f32) -> Self {
        self.config.suppression_radius = Some(radius);
        self
    }

    /// Set the number of threads for parallel processing
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.n_threads = n_threads;
        self
    }

    /// Apply the fast preset
    pub fn preset_fast(self) -> Self {
        self.with_preset(DetectorConfig::fast_preset())
    }

    /// Apply the quality preset
    pub fn preset_quality(self) -> Self {
        self.with_preset(DetectorConfig::quality_preset())
    }

    /// Apply the Harris preset
    pub fn preset_harris(self) -> Self {
        self.with_preset(DetectorConfig::harris_preset())
    }

    fn with_preset(self, preset: DetectorConfig) -> Self {
        // the region belongs to the frame, not to the preset
        Self {
            config: DetectorConfig {
                sub_region: self.config.sub_region,
                ..preset
            },
        }
    }

    /// Validate the settings and build the `ConfiguredDetector`
    pub fn build(self) -> FastResult<ConfiguredDetector> {
        ConfiguredDetector::new(self.config)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.config.summary()
    }

    /// Create a builder from an existing `DetectorConfig`
    pub fn from_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Convert the builder into a `DetectorConfig`
    pub fn to_config(self) -> DetectorConfig {
        self.config
    }
}
