use crate::error::{CoreError, CoreResult};

/// Pixel layouts a frame may carry. Only `Y8` is accepted by the detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelFormat {
    Y8,
    Rgb24,
    Rgba32,
}

impl PixelFormat {
    pub const fn channels(self) -> usize {
        match self {
            PixelFormat::Y8 => 1,
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba32 => 4,
        }
    }
}

/// Borrowed, row-padded pixel buffer with upper-left origin.
///
/// Each row holds `width * channels` pixel elements followed by
/// `padding_elements` unused elements; the final row may omit its padding.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    padding_elements: usize,
    format: PixelFormat,
}

impl<'a> FrameView<'a> {
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        padding_elements: usize,
        format: PixelFormat,
    ) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidFrameSize { width, height });
        }

        let stride = width * format.channels() + padding_elements;
        let expected = stride * (height - 1) + width * format.channels();
        if data.len() < expected {
            return Err(CoreError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            padding_elements,
            format,
        })
    }

    /// Continuous 8-bit grayscale view.
    pub fn y8(data: &'a [u8], width: usize, height: usize) -> CoreResult<Self> {
        Self::new(data, width, height, 0, PixelFormat::Y8)
    }

    /// Returns this view if it holds `Y8` pixels.
    pub fn require_y8(self) -> CoreResult<Self> {
        if self.format != PixelFormat::Y8 {
            return Err(CoreError::UnsupportedPixelFormat(self.format, PixelFormat::Y8));
        }
        Ok(self)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn padding_elements(&self) -> usize {
        self.padding_elements
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Number of elements between the starts of two consecutive rows.
    pub fn stride_elements(&self) -> usize {
        self.width * self.format.channels() + self.padding_elements
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Pixel elements of row `y` without padding.
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride_elements();
        &self.data[start..start + self.width * self.format.channels()]
    }

    /// Intensity at `(x, y)` of a `Y8` frame.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.stride_elements() + x]
    }

    /// Continuous `Y8` copy of this view.
    ///
    /// Color pixels are reduced with the integer weights `(77 R + 150 G + 29 B) / 256`,
    /// the alpha channel is ignored.
    pub fn to_y8(&self) -> CoreResult<Frame> {
        let channels = self.format.channels();
        let mut data = Vec::with_capacity(self.width * self.height);

        for y in 0..self.height {
            let row = self.row(y);
            match self.format {
                PixelFormat::Y8 => data.extend_from_slice(row),
                PixelFormat::Rgb24 | PixelFormat::Rgba32 => {
                    data.extend(row.chunks_exact(channels).map(|pixel| {
                        let (r, g, b) = (u32::from(pixel[0]), u32::from(pixel[1]), u32::from(pixel[2]));
                        ((77 * r + 150 * g + 29 * b) / 256) as u8
                    }));
                }
            }
        }

        Frame::from_y8(data, self.width, self.height)
    }
}

/// Owned frame, the counterpart of [`FrameView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: usize,
    height: usize,
    padding_elements: usize,
    format: PixelFormat,
}

impl Frame {
    pub fn new(
        data: Vec<u8>,
        width: usize,
        height: usize,
        padding_elements: usize,
        format: PixelFormat,
    ) -> CoreResult<Self> {
        FrameView::new(&data, width, height, padding_elements, format)?;
        Ok(Self {
            data,
            width,
            height,
            padding_elements,
            format,
        })
    }

    /// Continuous `Y8` frame from row-major pixels.
    pub fn from_y8(data: Vec<u8>, width: usize, height: usize) -> CoreResult<Self> {
        Self::new(data, width, height, 0, PixelFormat::Y8)
    }

    /// `Y8` frame with every pixel set to `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> CoreResult<Self> {
        Self::from_y8(vec![value; width * height], width, height)
    }

    /// `Y8` frame whose pixels are produced by `f(x, y)`.
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> CoreResult<Self> {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::from_y8(data, width, height)
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            data: &self.data,
            width: self.width,
            height: self.height,
            padding_elements: self.padding_elements,
            format: self.format,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
