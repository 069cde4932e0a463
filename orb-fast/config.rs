use crate::builder::DetectorBuilder;
use crate::error::{FastError, FastResult};
use crate::harris::HarrisCornerDetector;
use crate::types::SubRegion;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Corner detector run by a [`crate::ConfiguredDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DetectorKind {
    #[default]
    Fast,
    Harris,
}

/// Complete detector configuration with all settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectorConfig {
    pub detector: DetectorKind,
    /// FAST threshold in [1, 255], or Harris threshold in [0, 512].
    pub threshold: u32,
    /// Replace coarse FAST strengths by the binary searched threshold.
    pub precise_scoring: bool,
    pub frame_is_undistorted: bool,
    /// Number of layers searched by [`crate::ConfiguredDetector::detect_multiscale`].
    pub pyramid_layers: usize,
    /// Area searched on the finest layer, the whole frame if unset.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub sub_region: Option<SubRegion>,
    /// Additional suppression of weaker features closer than this radius.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub suppression_radius: Option<f32>,
    pub n_threads: usize,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub version: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            detector: DetectorKind::Fast,
            threshold: 20,
            precise_scoring: false,
            frame_is_undistorted: true,
            pyramid_layers: 1,
            sub_region: None,
            suppression_radius: None,
            n_threads: 1,
            name: None,
            description: None,
            version: None,
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast preset: high threshold on a single layer, coarse scores
    pub fn fast_preset() -> Self {
        Self {
            threshold: 40,
            n_threads: num_cpus::get().max(1),
            name: Some("Fast".to_string()),
            description: Some("Few strong corners on the finest layer".to_string()),
            version: Some("1.0".to_string()),
            ..Self::default()
        }
    }

    /// Quality preset: lower threshold, precise scores, three layers
    pub fn quality_preset() -> Self {
        Self {
            threshold: 15,
            precise_scoring: true,
            pyramid_layers: 3,
            suppression_radius: Some(3.0),
            n_threads: num_cpus::get().max(1),
            name: Some("Quality".to_string()),
            description: Some("Precisely scored corners over a three layer pyramid".to_string()),
            version: Some("1.0".to_string()),
            ..Self::default()
        }
    }

    /// Harris preset for frames with little texture
    pub fn harris_preset() -> Self {
        Self {
            detector: DetectorKind::Harris,
            threshold: 30,
            pyramid_layers: 3,
            n_threads: num_cpus::get().max(1),
            name: Some("Harris".to_string()),
            description: Some("Harris corners over a three layer pyramid".to_string()),
            version: Some("1.0".to_string()),
            ..Self::default()
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self.version = Some("1.0".to_string());
        self
    }

    /// Convert to DetectorBuilder for further customization
    pub fn to_builder(self) -> DetectorBuilder {
        DetectorBuilder::from_config(self)
    }

    /// Threshold range accepted by the configured detector.
    pub fn threshold_range(&self) -> (u32, u32) {
        match self.detector {
            DetectorKind::Fast => (1, 255),
            DetectorKind::Harris => (0, HarrisCornerDetector::MAX_THRESHOLD),
        }
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "DetectorConfig: {:?}, threshold={}, precise={}, layers={}, radius={:?}, threads={}",
            self.detector,
            self.threshold,
            self.precise_scoring,
            self.pyramid_layers,
            self.suppression_radius,
            self.n_threads
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> FastResult<()> {
        let (min, max) = self.threshold_range();
        if !(min..=max).contains(&self.threshold) {
            return Err(FastError::InvalidThreshold {
                value: self.threshold,
                min,
                max,
            });
        }
        if self.pyramid_layers == 0 {
            return Err(FastError::InvalidLayerCount(self.pyramid_layers));
        }
        if self.n_threads == 0 {
            return Err(FastError::Config("thread count must be > 0".to_string()));
        }
        if let Some(radius) = self.suppression_radius {
            if !radius.is_finite() || radius < 1.0 {
                return Err(FastError::Config(format!("suppression radius {radius} must be >= 1")));
            }
        }
        if self.precise_scoring && self.detector == DetectorKind::Harris {
            return Err(FastError::Config("precise scoring applies to FAST only".to_string()));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> FastResult<()> {
        write_file(path.as_ref(), &self.to_json()?)
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> FastResult<Self> {
        Self::from_json(&read_file(path.as_ref())?)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> FastResult<()> {
        write_file(path.as_ref(), &self.to_toml()?)
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> FastResult<Self> {
        Self::from_toml(&read_file(path.as_ref())?)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> FastResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| FastError::Config(err.to_string()))
    }

    /// Deserialize from JSON string, the result is validated
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> FastResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|err| FastError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> FastResult<String> {
        toml::to_string_pretty(self).map_err(|err| FastError::Config(err.to_string()))
    }

    /// Deserialize from TOML string, the result is validated
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> FastResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|err| FastError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "serde")]
fn read_file(path: &std::path::Path) -> FastResult<String> {
    std::fs::read_to_string(path).map_err(|err| FastError::Config(format!("{}: {err}", path.display())))
}

#[cfg(feature = "serde")]
fn write_file(path: &std::path::Path, content: &str) -> FastResult<()> {
    std::fs::write(path, content).map_err(|err| FastError::Config(format!("{}: {err}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for config in [
            DetectorConfig::default(),
            DetectorConfig::fast_preset(),
            DetectorConfig::quality_preset(),
            DetectorConfig::harris_preset(),
        ] {
            assert!(config.validate().is_ok(), "{}", config.summary());
        }
    }

    #[test]
    fn test_threshold_range_depends_on_detector() {
        let fast = DetectorConfig {
            threshold: 300,
            ..DetectorConfig::default()
        };
        assert!(matches!(fast.validate(), Err(FastError::InvalidThreshold { max: 255, .. })));

        let harris = DetectorConfig {
            detector: DetectorKind::Harris,
            ..fast.clone()
        };
        assert!(harris.validate().is_ok());

        let zero = DetectorConfig {
            threshold: 0,
            ..DetectorConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_invalid_settings() {
        let config = DetectorConfig {
            suppression_radius: Some(0.5),
            ..DetectorConfig::default()
        };
        assert!(matches!(config.validate(), Err(FastError::Config(_))));

        let config = DetectorConfig {
            pyramid_layers: 0,
            ..DetectorConfig::default()
        };
        assert_eq!(config.validate(), Err(FastError::InvalidLayerCount(0)));

        let config = DetectorConfig {
            precise_scoring: true,
            ..DetectorConfig::harris_preset()
        };
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_and_toml() {
        let config = DetectorConfig::quality_preset().with_metadata("Indoor", "Tuned for indoor scenes");

        let json = config.to_json().unwrap();
        assert_eq!(DetectorConfig::from_json(&json).unwrap(), config);

        let toml = config.to_toml().unwrap();
        assert!(toml.contains("detector = \"fast\""));
        assert_eq!(DetectorConfig::from_toml(&toml).unwrap(), config);

        let partial = DetectorConfig::from_toml("detector = \"harris\"\nthreshold = 400\n").unwrap();
        assert_eq!(partial.detector, DetectorKind::Harris);
        assert_eq!(partial.pyramid_layers, 1);

        assert!(matches!(DetectorConfig::from_json("{\"threshold\": 0}"), Err(FastError::InvalidThreshold { .. })));
        assert!(matches!(DetectorConfig::from_json("not json"), Err(FastError::Config(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("orb-fast-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let config = DetectorConfig::harris_preset();
        let json_path = dir.join("detector.json");
        let toml_path = dir.join("detector.toml");
        config.save_json(&json_path).unwrap();
        config.save_toml(&toml_path).unwrap();
        assert_eq!(DetectorConfig::load_json(&json_path).unwrap(), config);
        assert_eq!(DetectorConfig::load_toml(&toml_path).unwrap(), config);

        assert!(DetectorConfig::load_json(dir.join("missing.json")).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
