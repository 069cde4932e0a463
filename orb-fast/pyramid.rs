use orb_core::{Frame, FrameView, Worker, for_each_chunk_mut};

use crate::error::{FastError, FastResult};
use crate::types::ScaleLevel;

/// Dyadic frame pyramid for multi-scale feature detection.
///
/// Layer 0 has the resolution of the input frame, every further layer halves
/// width and height (rounded down) by averaging 2x2 blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePyramid {
    layers: Vec<Frame>,
}

impl FramePyramid {
    /// Builds up to `layers` layers from `frame`, converting color frames to `Y8`.
    ///
    /// Fewer layers are created when a layer would become empty.
    pub fn new(frame: &FrameView<'_>, layers: usize, worker: Option<&Worker>) -> FastResult<Self> {
        if layers == 0 {
            return Err(FastError::InvalidLayerCount(layers));
        }

        let mut pyramid = Vec::with_capacity(layers);
        pyramid.push(frame.to_y8()?);

        while pyramid.len() < layers {
            let Some(finer) = pyramid.last() else {
                break;
            };
            if finer.width() < 2 || finer.height() < 2 {
                log::debug!(
                    "pyramid stops at {} layers, {}x{} cannot be halved",
                    pyramid.len(),
                    finer.width(),
                    finer.height()
                );
                break;
            }
            let coarser = Self::downsample(&finer.view(), worker)?;
            pyramid.push(coarser);
        }

        Ok(Self { layers: pyramid })
    }

    pub fn layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: usize) -> Option<FrameView<'_>> {
        self.layers.get(index).map(Frame::view)
    }

    pub fn finest_layer(&self) -> FrameView<'_> {
        self.layers[0].view()
    }

    pub fn iter(&self) -> impl Iterator<Item = FrameView<'_>> {
        self.layers.iter().map(Frame::view)
    }

    pub fn scale_levels(&self) -> Vec<ScaleLevel> {
        self.layers
            .iter()
            .enumerate()
            .map(|(level, layer)| ScaleLevel {
                level,
                scale: (1u32 << level) as f32,
                width: layer.width(),
                height: layer.height(),
            })
            .collect()
    }

    /// Halves a `Y8` frame, every target pixel is the rounded mean of a 2x2 block.
    pub fn downsample(frame: &FrameView<'_>, worker: Option<&Worker>) -> FastResult<Frame> {
        let frame = frame.require_y8()?;
        let width = frame.width() / 2;
        let height = frame.height() / 2;

        let mut data = vec![0u8; width * height];
        for_each_chunk_mut(worker, &mut data, 4096, |offset, chunk| {
            for (i, value) in chunk.iter_mut().enumerate() {
                let index = offset + i;
                let (x, y) = (2 * (index % width), 2 * (index / width));
                let sum = u32::from(frame.pixel(x, y))
                    + u32::from(frame.pixel(x + 1, y))
                    + u32::from(frame.pixel(x, y + 1))
                    + u32::from(frame.pixel(x + 1, y + 1));
                *value = ((sum + 2) / 4) as u8;
            }
        });

        Ok(Frame::from_y8(data, width, height)?)
    }
}
