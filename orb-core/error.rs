use crate::frame::PixelFormat;

/// Errors raised by frame validation, integral images and the worker pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("invalid frame dimensions: {width}x{height} (must be > 0)")]
    InvalidFrameSize { width: usize, height: usize },

    #[error("frame buffer too small: expected at least {expected} elements, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("unsupported pixel format {0:?}, expected {1:?}")]
    UnsupportedPixelFormat(PixelFormat, PixelFormat),

    #[error("invalid thread count: {0} (must be > 0)")]
    InvalidThreadCount(usize),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<rayon::ThreadPoolBuildError> for CoreError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        CoreError::ThreadPool(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
