//! Normalized pixel batches handed to the model encoder.
//!
//! Each visual unit (grid tile, global tile, or video frame) becomes one
//! CHW `Array3<f32>`, scaled to `[0, 1]` and normalized per channel. The
//! batch's unit count is what the prompt assembler's unit count is checked
//! against.

use image::RgbImage;
use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::tiler::TileGrid;

/// Per-frame shape descriptor for video batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoShape {
    /// Number of sampled frames.
    pub temporal: usize,
    pub height: u32,
    pub width: u32,
}

/// An ordered sequence of normalized visual units.
#[derive(Debug, Clone)]
pub struct PixelBatch {
    /// CHW tensors, one per unit, in prompt order.
    pub units: Vec<Array3<f32>>,
    /// Present for video batches only.
    pub video_shape: Option<VideoShape>,
}

impl PixelBatch {
    /// Batch for a tiled image: grid tiles in row-major order, then the
    /// global tile - the exact order the image prompt references them.
    pub fn from_tile_grid(grid: &TileGrid, mean: [f32; 3], std: [f32; 3]) -> Self {
        let mut units: Vec<Array3<f32>> = grid
            .tiles
            .iter()
            .map(|tile| normalize_image(&tile.pixels, mean, std))
            .collect();
        units.push(normalize_image(&grid.global_tile.pixels, mean, std));
        Self {
            units,
            video_shape: None,
        }
    }

    /// Batch for a sampled video: one unit per frame, in index order.
    pub fn from_frames(frames: &[RgbImage], mean: [f32; 3], std: [f32; 3]) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| f.dimensions())
            .unwrap_or((0, 0));
        let units = frames
            .iter()
            .map(|frame| normalize_image(frame, mean, std))
            .collect();
        Self {
            units,
            video_shape: Some(VideoShape {
                temporal: frames.len(),
                height,
                width,
            }),
        }
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

/// Convert an RGB image to a CHW tensor: scale to `[0, 1]`, subtract the
/// per-channel mean, divide by the per-channel std.
pub fn normalize_image(image: &RgbImage, mean: [f32; 3], std: [f32; 3]) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut tensor = Array3::<f32>::zeros((3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            tensor[[c, y as usize, x as usize]] = (value - mean[c]) / std[c];
        }
    }
    tensor
}
