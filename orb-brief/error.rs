use orb_core::CoreError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BriefError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("feature at ({x}, {y}) is closer than {border} pixels to the border of a {width}x{height} frame")]
    FeatureOutsideBorder {
        x: f32,
        y: f32,
        border: usize,
        width: usize,
        height: usize,
    },

    #[error("invalid match threshold: {0} (must be in [0, 1])")]
    InvalidMatchThreshold(f32),

    #[error("invalid descriptor data: {0}")]
    InvalidDescriptorData(String),
}

pub type BriefResult<T> = Result<T, BriefError>;
