use orb_core::{FrameView, PixelFormat, Point2, PointFeature, Worker};

use crate::builder::DetectorBuilder;
use crate::config::{DetectorConfig, DetectorKind};
use crate::detector::{FastFeatureDetector, MIN_SUB_REGION_SIZE};
use crate::error::FastResult;
use crate::harris::HarrisCornerDetector;
use crate::nms::{NonMaximumSuppression, StrengthPosition};
use crate::pyramid::FramePyramid;
use crate::types::{ScaleLevel, SubRegion};

/// A corner detector bound to a validated [`DetectorConfig`].
///
/// Owns the worker used by every detection call.
#[derive(Debug)]
pub struct ConfiguredDetector {
    config: DetectorConfig,
    worker: Option<Worker>,
}

impl ConfiguredDetector {
    pub fn new(config: DetectorConfig) -> FastResult<Self> {
        config.validate()?;
        let worker = match config.n_threads {
            1 => None,
            n => Some(Worker::new(n)?),
        };
        log::debug!("{}", config.summary());
        Ok(Self { config, worker })
    }

    pub fn builder() -> DetectorBuilder {
        DetectorBuilder::new()
    }

    /// Detects corners on `frame` only, in frame coordinates and raster order.
    ///
    /// Color frames are converted to `Y8` first.
    pub fn detect(&self, frame: &FrameView<'_>) -> FastResult<Vec<PointFeature>> {
        let converted;
        let frame = if frame.format() == PixelFormat::Y8 {
            *frame
        } else {
            converted = frame.to_y8()?;
            converted.view()
        };

        let region = self.config.sub_region.unwrap_or_else(|| SubRegion::full(&frame));
        self.detect_in_region(&frame, region)
    }

    /// Detects corners on every layer of `pyramid` up to the configured layer count.
    ///
    /// Positions stay in the coordinates of their layer. The sub-region is scaled down
    /// with the layer; layers too small for detection are skipped.
    pub fn detect_pyramid(&self, pyramid: &FramePyramid) -> FastResult<Vec<(ScaleLevel, Vec<PointFeature>)>> {
        let mut layers = Vec::new();

        for (scale_level, layer) in pyramid.scale_levels().into_iter().zip(pyramid.iter()) {
            if scale_level.level >= self.config.pyramid_layers {
                break;
            }

            let region = match self.config.sub_region {
                Some(region) => SubRegion::new(
                    region.left >> scale_level.level,
                    region.top >> scale_level.level,
                    region.width >> scale_level.level,
                    region.height >> scale_level.level,
                ),
                None => SubRegion::full(&layer),
            };

            let (min_width, min_height) = self.min_region_size();
            if region.width < min_width || region.height < min_height {
                log::debug!(
                    "skipping layer {} with a {}x{} search region",
                    scale_level.level,
                    region.width,
                    region.height
                );
                continue;
            }

            layers.push((scale_level, self.detect_in_region(&layer, region)?));
        }

        Ok(layers)
    }

    /// Detects corners over a pyramid of `frame` and returns them in finest-layer coordinates.
    ///
    /// A layer position `p` of layer `i` maps to `(p + 0.5) * 2^i`, features are ordered by layer.
    pub fn detect_multiscale(&self, frame: &FrameView<'_>) -> FastResult<Vec<PointFeature>> {
        let pyramid = FramePyramid::new(frame, self.config.pyramid_layers, self.worker.as_ref())?;

        let features = self
            .detect_pyramid(&pyramid)?
            .into_iter()
            .flat_map(|(scale_level, features)| {
                features.into_iter().map(move |feature| {
                    if scale_level.level == 0 {
                        return feature;
                    }
                    let p = feature.observation();
                    PointFeature::new(
                        Point2::new((p.x + 0.5) * scale_level.scale, (p.y + 0.5) * scale_level.scale),
                        feature.distortion_state(),
                        feature.strength(),
                    )
                })
            })
            .collect();

        Ok(features)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn worker(&self) -> Option<&Worker> {
        self.worker.as_ref()
    }

    /// Get a summary of the detector's configuration.
    pub fn config_summary(&self) -> String {
        self.config.summary()
    }

    fn min_region_size(&self) -> (usize, usize) {
        match self.config.detector {
            DetectorKind::Fast => (MIN_SUB_REGION_SIZE, MIN_SUB_REGION_SIZE),
            DetectorKind::Harris => (HarrisCornerDetector::MIN_WIDTH, HarrisCornerDetector::MIN_HEIGHT),
        }
    }

    fn detect_in_region(&self, frame: &FrameView<'_>, region: SubRegion) -> FastResult<Vec<PointFeature>> {
        let worker = self.worker.as_ref();
        let features = match self.config.detector {
            DetectorKind::Fast => FastFeatureDetector::detect_features(
                frame,
                Some(region),
                self.config.threshold,
                self.config.frame_is_undistorted,
                self.config.precise_scoring,
                worker,
            )?,
            DetectorKind::Harris => HarrisCornerDetector::detect_corners(
                frame,
                Some(region),
                self.config.threshold,
                self.config.frame_is_undistorted,
                worker,
            )?,
        };

        Ok(match self.config.suppression_radius {
            Some(radius) => Self::suppress_within_radius(frame, features, radius),
            None => features,
        })
    }

    fn suppress_within_radius(frame: &FrameView<'_>, features: Vec<PointFeature>, radius: f32) -> Vec<PointFeature> {
        let positions: Vec<StrengthPosition<f32>> = features
            .iter()
            .map(|feature| {
                let p = feature.observation();
                StrengthPosition::new(p.x as u32, p.y as u32, feature.strength())
            })
            .collect();

        let kept = NonMaximumSuppression::<f32>::suppress_non_maximum_radius(
            frame.width(),
            frame.height(),
            &positions,
            radius,
        );

        log::debug!("radius {radius} keeps {} of {} features", kept.len(), features.len());
        kept.into_iter().map(|index| features[index]).collect()
    }
}
