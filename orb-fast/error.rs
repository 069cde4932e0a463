use orb_core::CoreError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FastError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("invalid threshold: {value} (must be {min}-{max})")]
    InvalidThreshold { value: u32, min: u32, max: u32 },

    #[error(
        "sub-region {width}x{height} at ({left}, {top}) invalid for a {frame_width}x{frame_height} frame (minimum {min_width}x{min_height})"
    )]
    InvalidSubRegion {
        left: usize,
        top: usize,
        width: usize,
        height: usize,
        frame_width: usize,
        frame_height: usize,
        min_width: usize,
        min_height: usize,
    },

    #[error("invalid pyramid layer count: {0} (must be > 0)")]
    InvalidLayerCount(usize),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type FastResult<T> = Result<T, FastError>;
