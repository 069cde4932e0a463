//! Complete ORB pipeline: pyramid detection, orientation, description and matching.

use std::path::Path;

use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use orb_brief::{
    BriefError, BriefGenerator, FeatureOrientation, MULTI_LAYER_BORDER, OrbFeature, features_to_orb_features,
};
use orb_core::{CoreError, Correspondence, Frame, FrameView, IntegralImage, PixelFormat, Point2, Worker};
use orb_fast::{FastError, FastFeatureDetector, FramePyramid, HarrisCornerDetector};

pub use orb_brief;
pub use orb_core::{self, OrbConfig};
pub use orb_fast;

/// Smallest distance of a reference feature to the layer border.
pub const REFERENCE_FEATURE_BORDER: usize = 31;

#[derive(Debug, thiserror::Error)]
pub enum OrbError {
    #[error("FAST error: {0}")]
    Fast(#[from] FastError),

    #[error("descriptor error: {0}")]
    Brief(#[from] BriefError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type OrbResult<T> = Result<T, OrbError>;

/// Detector settings applied to every pyramid layer.
#[derive(Debug, Clone, Copy)]
struct LayerDetection {
    use_harris_features: bool,
    threshold: u32,
    precise_scoring: bool,
    frame_is_undistorted: bool,
    use_multi_layers: bool,
}

/// Detects features on every layer of `pyramid` and describes them with single layer descriptors.
///
/// Layers are processed finest first with FAST (coarse scoring) or Harris corners. Features
/// closer than 31 pixels to a layer border are dropped. Positions of layer `i > 0` are mapped
/// into the finest layer with `(p + 0.5) * 2^i`. The result holds the features of all layers
/// in layer order.
pub fn detect_reference_features_and_determine_descriptors(
    pyramid: &FramePyramid,
    use_harris_features: bool,
    feature_threshold: u32,
    worker: Option<&Worker>,
) -> OrbResult<Vec<OrbFeature>> {
    let detection = LayerDetection {
        use_harris_features,
        threshold: feature_threshold,
        precise_scoring: false,
        frame_is_undistorted: true,
        use_multi_layers: false,
    };
    describe_pyramid(pyramid, detection, worker)
}

fn describe_pyramid(
    pyramid: &FramePyramid,
    detection: LayerDetection,
    worker: Option<&Worker>,
) -> OrbResult<Vec<OrbFeature>> {
    let border = if detection.use_multi_layers {
        REFERENCE_FEATURE_BORDER.max(MULTI_LAYER_BORDER)
    } else {
        REFERENCE_FEATURE_BORDER
    };

    let finest = pyramid.finest_layer();
    let mut integral = IntegralImage::with_capacity(finest.width(), finest.height());
    let generator = BriefGenerator::new();
    let mut features = Vec::new();

    for (level, layer) in pyramid.iter().enumerate() {
        if layer.width() <= 2 * border || layer.height() <= 2 * border {
            log::warn!(
                "skipping pyramid layer {level}: {}x{} leaves no room inside the {border} pixel border",
                layer.width(),
                layer.height()
            );
            continue;
        }

        let points = detect_layer(&layer, detection, worker)?;
        let mut layer_features = features_to_orb_features(&points, layer.width(), layer.height(), border);
        if layer_features.is_empty() {
            log::debug!("pyramid layer {level}: no feature inside the border");
            continue;
        }

        integral.rebuild(&layer)?;
        FeatureOrientation::determine_feature_orientation(&integral, &mut layer_features, worker)?;
        generator.determine_descriptors(&integral, &mut layer_features, detection.use_multi_layers, worker)?;

        log::debug!("pyramid layer {level}: {} of {} features described", layer_features.len(), points.len());

        if level == 0 {
            features.extend(layer_features);
        } else {
            let scale = (1u32 << level) as f32;
            features.extend(layer_features.into_iter().map(|feature| {
                let p = feature.observation();
                feature.relocated(Point2::new((p.x + 0.5) * scale, (p.y + 0.5) * scale))
            }));
        }
    }

    Ok(features)
}

fn detect_layer(
    layer: &FrameView<'_>,
    detection: LayerDetection,
    worker: Option<&Worker>,
) -> OrbResult<Vec<orb_core::PointFeature>> {
    let points = if detection.use_harris_features {
        HarrisCornerDetector::detect_corners(layer, None, detection.threshold, detection.frame_is_undistorted, worker)?
    } else {
        FastFeatureDetector::detect_features(
            layer,
            None,
            detection.threshold,
            detection.frame_is_undistorted,
            detection.precise_scoring,
            worker,
        )?
    };
    Ok(points)
}

/// ORB feature extractor and matcher configured by an [`OrbConfig`].
#[derive(Debug)]
pub struct OrbExtractor {
    config: OrbConfig,
    worker: Option<Worker>,
}

impl OrbExtractor {
    pub fn new(config: OrbConfig) -> OrbResult<Self> {
        config.validate()?;
        let worker = config.create_worker()?;
        Ok(Self { config, worker })
    }

    /// Detects and describes the features of `frame` over the configured pyramid.
    ///
    /// Color frames are converted to `Y8` first.
    pub fn detect_and_describe(&self, frame: &FrameView<'_>) -> OrbResult<Vec<OrbFeature>> {
        let worker = self.worker.as_ref();
        let pyramid = FramePyramid::new(frame, self.config.pyramid_layers, worker)?;

        let detection = LayerDetection {
            use_harris_features: self.config.use_harris_features,
            threshold: u32::from(self.config.threshold),
            precise_scoring: self.config.precise_scoring && !self.config.use_harris_features,
            frame_is_undistorted: self.config.frame_is_undistorted,
            use_multi_layers: self.config.use_multi_layers,
        };
        let features = describe_pyramid(&pyramid, detection, worker)?;

        log::debug!(
            "{} features on {} pyramid layers of a {}x{} frame",
            features.len(),
            pyramid.layers(),
            frame.width(),
            frame.height()
        );
        Ok(features)
    }

    /// Matches `forward` against `backward` with the configured match threshold.
    pub fn match_features(&self, forward: &[OrbFeature], backward: &[OrbFeature]) -> OrbResult<Vec<Correspondence>> {
        Ok(orb_brief::determine_non_bijective_correspondences(
            forward,
            backward,
            self.config.match_threshold,
            self.worker.as_ref(),
        )?)
    }

    pub fn config(&self) -> &OrbConfig {
        &self.config
    }

    pub fn worker(&self) -> Option<&Worker> {
        self.worker.as_ref()
    }
}

/// Frame holding the pixels of a decoded image.
///
/// Gray and RGBA images keep their format, every other layout is converted to RGB.
pub fn frame_from_image(image: &DynamicImage) -> OrbResult<Frame> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let frame = match image {
        DynamicImage::ImageLuma8(gray) => Frame::from_y8(gray.as_raw().clone(), width, height)?,
        DynamicImage::ImageRgba8(rgba) => Frame::new(rgba.as_raw().clone(), width, height, 0, PixelFormat::Rgba32)?,
        other => Frame::new(other.to_rgb8().into_raw(), width, height, 0, PixelFormat::Rgb24)?,
    };
    Ok(frame)
}

pub fn load_frame(path: impl AsRef<Path>) -> OrbResult<Frame> {
    let image = image::open(path)?;
    frame_from_image(&image)
}

/// Draws every feature as a circle with a line pointing along its orientation.
pub fn draw_features(frame: &FrameView<'_>, features: &[OrbFeature]) -> OrbResult<RgbaImage> {
    let gray = frame.to_y8()?;
    let (width, height) = (gray.width() as u32, gray.height() as u32);
    let gray = GrayImage::from_raw(width, height, gray.into_data()).ok_or(CoreError::BufferTooSmall {
        expected: width as usize * height as usize,
        actual: 0,
    })?;

    let mut canvas = DynamicImage::ImageLuma8(gray).into_rgba8();
    let color = Rgba([255, 0, 0, 255]);
    let radius = 4.0f32;

    for feature in features {
        let p = feature.observation();
        let (sin, cos) = feature.orientation().sin_cos();
        draw_hollow_circle_mut(&mut canvas, (p.x.round() as i32, p.y.round() as i32), radius as i32, color);
        draw_line_segment_mut(&mut canvas, (p.x, p.y), (p.x + cos * radius, p.y + sin * radius), color);
    }

    Ok(canvas)
}
