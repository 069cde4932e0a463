use crate::error::CoreResult;
use crate::frame::FrameView;

const FACTOR_EPSILON: f32 = 1e-6;

/// Lined integral image of an 8-bit grayscale frame.
///
/// Holds `(width + 1) * (height + 1)` sums; the first row and column are zero and
/// cell `(x, y)` is the sum of all source pixels in `[0, x) x [0, y)`.
#[derive(Debug, Clone, Default)]
pub struct IntegralImage {
    data: Vec<u32>,
    width: usize,
    height: usize,
}

impl IntegralImage {
    pub fn new(frame: &FrameView<'_>) -> CoreResult<Self> {
        let mut integral = Self::default();
        integral.rebuild(frame)?;
        Ok(integral)
    }

    /// Empty integral image whose buffer can hold a frame of the given size without reallocating.
    pub fn with_capacity(width: usize, height: usize) -> Self {
        Self {
            data: Vec::with_capacity((width + 1) * (height + 1)),
            width: 0,
            height: 0,
        }
    }

    /// Recomputes the sums for `frame`, reusing the existing allocation.
    pub fn rebuild(&mut self, frame: &FrameView<'_>) -> CoreResult<()> {
        let frame = frame.require_y8()?;
        let (width, height) = (frame.width(), frame.height());
        let stride = width + 1;

        self.data.clear();
        self.data.resize(stride * (height + 1), 0);
        self.width = width;
        self.height = height;

        for y in 0..height {
            let row = frame.row(y);
            let (previous, current) = self.data.split_at_mut((y + 1) * stride);
            let previous = &previous[y * stride..];
            let current = &mut current[..stride];

            let mut row_sum = 0u32;
            for x in 0..width {
                row_sum += u32::from(row[x]);
                current[x + 1] = previous[x + 1].wrapping_add(row_sum);
            }
        }

        Ok(())
    }

    /// Width of the source frame.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the source frame.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride_elements(&self) -> usize {
        self.width + 1
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Integral cell `(x, y)` with `x <= width`, `y <= height`.
    #[inline]
    pub fn value(&self, x: usize, y: usize) -> u32 {
        self.data[y * self.stride_elements() + x]
    }

    /// Sum of the source pixels in the window `[left, left + w) x [top, top + h)`.
    #[inline]
    pub fn sum(&self, left: usize, top: usize, w: usize, h: usize) -> u32 {
        debug_assert!(left + w <= self.width && top + h <= self.height);
        let stride = self.stride_elements();
        let top_row = top * stride;
        let bottom_row = (top + h) * stride;

        // modular arithmetic is exact as long as the window sum fits into 32 bits
        self.data[bottom_row + left + w]
            .wrapping_sub(self.data[top_row + left + w])
            .wrapping_sub(self.data[bottom_row + left])
            .wrapping_add(self.data[top_row + left])
    }

    /// Whether a `w x h` patch centered at `(cx, cy)` can be sampled by [`Self::patch_intensity_sum`].
    pub fn contains_patch(&self, cx: f32, cy: f32, w: usize, h: usize) -> bool {
        let left = cx + 0.5 - w as f32 * 0.5;
        let top = cy + 0.5 - h as f32 * 0.5;
        if !(left >= 0.0 && top >= 0.0) {
            return false;
        }
        let extra_x = usize::from(left.fract() > FACTOR_EPSILON);
        let extra_y = usize::from(top.fract() > FACTOR_EPSILON);
        left as usize + w + extra_x <= self.width && top as usize + h + extra_y <= self.height
    }

    /// Bilinearly interpolated intensity sum of a `w x h` patch centered at `(cx, cy)`.
    ///
    /// Pixel centers lie on integer coordinates, so an integer center with odd patch
    /// sizes covers whole pixels and needs a single window lookup.
    pub fn patch_intensity_sum(&self, cx: f32, cy: f32, w: usize, h: usize) -> f32 {
        debug_assert!(self.contains_patch(cx, cy, w, h), "patch at ({cx}, {cy}) leaves the frame");

        let left = cx + 0.5 - w as f32 * 0.5;
        let top = cy + 0.5 - h as f32 * 0.5;

        let pixel_left = left as usize;
        let pixel_top = top as usize;

        let factor_right = left - pixel_left as f32;
        let factor_bottom = top - pixel_top as f32;
        let factor_left = 1.0 - factor_right;
        let factor_top = 1.0 - factor_bottom;

        let factor_top_left = factor_top * factor_left;
        let sum_top_left = self.sum(pixel_left, pixel_top, w, h) as f32;

        if factor_top_left >= 1.0 - FACTOR_EPSILON {
            return sum_top_left;
        }

        let factor_top_right = factor_top * factor_right;
        let factor_bottom_left = factor_bottom * factor_left;
        let factor_bottom_right = factor_bottom * factor_right;

        let sum_top_right = if factor_top_right > FACTOR_EPSILON {
            self.sum(pixel_left + 1, pixel_top, w, h) as f32
        } else {
            0.0
        };
        let sum_bottom_left = if factor_bottom_left > FACTOR_EPSILON {
            self.sum(pixel_left, pixel_top + 1, w, h) as f32
        } else {
            0.0
        };
        let sum_bottom_right = if factor_bottom_right > FACTOR_EPSILON {
            self.sum(pixel_left + 1, pixel_top + 1, w, h) as f32
        } else {
            0.0
        };

        factor_top_left * sum_top_left
            + factor_top_right * sum_top_right
            + factor_bottom_left * sum_bottom_left
            + factor_bottom_right * sum_bottom_right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, PixelFormat};
    use proptest::prelude::*;

    fn brute_force_sum(frame: &Frame, left: usize, top: usize, w: usize, h: usize) -> u32 {
        let view = frame.view();
        let mut sum = 0u32;
        for y in top..top + h {
            for x in left..left + w {
                sum += u32::from(view.pixel(x, y));
            }
        }
        sum
    }

    #[test]
    fn test_lined_layout() {
        let frame = Frame::from_y8(vec![1, 2, 3, 4, 5, 6], 3, 2).unwrap();
        let integral = IntegralImage::new(&frame.view()).unwrap();
        assert_eq!(integral.data().len(), 4 * 3);
        assert_eq!(&integral.data()[0..4], &[0, 0, 0, 0]);
        assert_eq!(&integral.data()[4..8], &[0, 1, 3, 6]);
        assert_eq!(&integral.data()[8..12], &[0, 5, 12, 21]);
    }

    #[test]
    fn test_padded_source() {
        let data = vec![1, 2, 99, 3, 4];
        let view = FrameView::new(&data, 2, 2, 1, PixelFormat::Y8).unwrap();
        let integral = IntegralImage::new(&view).unwrap();
        assert_eq!(integral.sum(0, 0, 2, 2), 10);
        assert_eq!(integral.sum(1, 1, 1, 1), 4);
    }

    #[test]
    fn test_rejects_color_frames() {
        let data = vec![0u8; 3 * 4];
        let view = FrameView::new(&data, 2, 2, 0, PixelFormat::Rgb24).unwrap();
        assert!(IntegralImage::new(&view).is_err());
    }

    #[test]
    fn test_rebuild_reuses_buffer() {
        let large = Frame::filled(32, 32, 1).unwrap();
        let small = Frame::filled(8, 8, 2).unwrap();
        let mut integral = IntegralImage::with_capacity(32, 32);
        integral.rebuild(&large.view()).unwrap();
        let capacity = integral.data.capacity();
        integral.rebuild(&small.view()).unwrap();
        assert_eq!(integral.data.capacity(), capacity);
        assert_eq!(integral.sum(0, 0, 8, 8), 128);
    }

    #[test]
    fn test_patch_sum_integer_center() {
        let frame = Frame::from_fn(16, 16, |x, y| (x * 3 + y) as u8).unwrap();
        let integral = IntegralImage::new(&frame.view()).unwrap();
        let exact = brute_force_sum(&frame, 5, 6, 5, 3) as f32;
        assert_eq!(integral.patch_intensity_sum(7.0, 7.0, 5, 3), exact);
    }

    #[test]
    fn test_patch_sum_half_pixel_interpolates() {
        let frame = Frame::from_fn(16, 16, |x, _| (x * 10) as u8).unwrap();
        let integral = IntegralImage::new(&frame.view()).unwrap();
        let a = integral.patch_intensity_sum(7.0, 7.0, 3, 3);
        let b = integral.patch_intensity_sum(8.0, 7.0, 3, 3);
        let half = integral.patch_intensity_sum(7.5, 7.0, 3, 3);
        assert!((half - 0.5 * (a + b)).abs() < 1e-2);
    }

    #[test]
    fn test_contains_patch() {
        let frame = Frame::filled(10, 10, 0).unwrap();
        let integral = IntegralImage::new(&frame.view()).unwrap();
        assert!(integral.contains_patch(2.0, 2.0, 5, 5));
        assert!(!integral.contains_patch(1.0, 2.0, 5, 5));
        assert!(integral.contains_patch(7.0, 7.0, 5, 5));
        assert!(!integral.contains_patch(7.5, 7.0, 5, 5));
    }

    proptest! {
        #[test]
        fn prop_window_sum_matches_brute_force(
            seed in 0u32..1000,
            left in 0usize..10,
            top in 0usize..10,
            w in 1usize..10,
            h in 1usize..10,
        ) {
            let frame = Frame::from_fn(20, 20, |x, y| ((x * 31 + y * 17 + seed as usize) % 256) as u8).unwrap();
            let integral = IntegralImage::new(&frame.view()).unwrap();
            prop_assert_eq!(integral.sum(left, top, w, h), brute_force_sum(&frame, left, top, w, h));
        }
    }
}
