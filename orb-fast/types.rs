use orb_core::FrameView;

use crate::error::{FastError, FastResult};

/// Rectangular area of a frame in which corners are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubRegion {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
}

impl SubRegion {
    pub const fn new(left: usize, top: usize, width: usize, height: usize) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The entire frame.
    pub fn full(frame: &FrameView<'_>) -> Self {
        Self::new(0, 0, frame.width(), frame.height())
    }

    pub fn right(&self) -> usize {
        self.left + self.width
    }

    pub fn bottom(&self) -> usize {
        self.top + self.height
    }

    /// Checks that the region lies inside `frame` and has at least the given size.
    pub(crate) fn validate(&self, frame: &FrameView<'_>, min_width: usize, min_height: usize) -> FastResult<()> {
        let right = self.left.checked_add(self.width);
        let bottom = self.top.checked_add(self.height);
        if self.width < min_width
            || self.height < min_height
            || right.is_none_or(|right| right > frame.width())
            || bottom.is_none_or(|bottom| bottom > frame.height())
        {
            return Err(FastError::InvalidSubRegion {
                left: self.left,
                top: self.top,
                width: self.width,
                height: self.height,
                frame_width: frame.width(),
                frame_height: frame.height(),
                min_width,
                min_height,
            });
        }
        Ok(())
    }
}

/// Scale information of one pyramid layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    pub level: usize,
    /// Size of one layer pixel in finest-layer pixels, `2^level`.
    pub scale: f32,
    pub width: usize,
    pub height: usize,
}

/// Corner classification of a ring test
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CornerType {
    /// Contiguous arc brighter than the center.
    Bright,
    /// Contiguous arc darker than the center.
    Dark,
    None,
}
