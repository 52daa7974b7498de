//! Image tiling.
//!
//! Splits one image into a grid of fixed-size tiles plus one downsized
//! global summary tile. The processing size is computed once - best-fit
//! scale to the longest-edge budget, then round each dimension up to the
//! next tile multiple - so the image is resampled a single time instead of
//! twice with compounding rounding error.

use image::{imageops, imageops::FilterType, RgbImage};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{PrepError, PrepResult};

/// One fixed-size square crop of the resized image.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Grid row, 0 = visually topmost.
    pub row: u32,
    /// Grid column, 0 = leftmost.
    pub col: u32,
    pub pixels: RgbImage,
}

/// The full tiling of one image: a row-major grid plus the global tile.
#[derive(Debug, Clone)]
pub struct TileGrid {
    /// Row-major, row 0 first. `tiles.len() == rows * cols`.
    pub tiles: Vec<Tile>,
    pub rows: u32,
    pub cols: u32,
    /// Holistic low-resolution summary of the whole image, resampled from
    /// the original rather than the grid-sized intermediate.
    pub global_tile: Tile,
}

impl TileGrid {
    /// Grid tiles plus the global tile - the pixel-batch count the prompt
    /// unit count must match exactly.
    pub fn unit_count(&self) -> usize {
        self.tiles.len() + 1
    }
}

/// Compute the combined processing size for an image.
///
/// Best-fit scales the longer side down to `max_edge` (never up), then
/// rounds each dimension up to the nearest multiple of `tile_edge`.
fn processing_size(width: u32, height: u32, max_edge: u32, tile_edge: u32) -> (u32, u32) {
    let longer = width.max(height) as f64;
    let scale = (max_edge as f64 / longer).min(1.0);

    let scaled_w = ((width as f64 * scale).round() as u32).max(1);
    let scaled_h = ((height as f64 * scale).round() as u32).max(1);

    let target_w = scaled_w.div_ceil(tile_edge) * tile_edge;
    let target_h = scaled_h.div_ceil(tile_edge) * tile_edge;
    (target_w, target_h)
}

/// Tile an image into a grid of `tile_edge`-sized tiles plus a global tile.
///
/// Fails with [`PrepError::InvalidImage`] when the source has zero width or
/// height. `max_edge` and `tile_edge` must be positive.
pub fn tile_image(image: &RgbImage, max_edge: u32, tile_edge: u32) -> PrepResult<TileGrid> {
    debug_assert!(max_edge > 0 && tile_edge > 0);

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PrepError::InvalidImage { width, height });
    }

    let (target_w, target_h) = processing_size(width, height, max_edge, tile_edge);
    let resized = imageops::resize(image, target_w, target_h, FilterType::Lanczos3);

    let rows = target_h.div_ceil(tile_edge);
    let cols = target_w.div_ceil(tile_edge);

    debug!(
        width,
        height, target_w, target_h, rows, cols, "Tiling image"
    );

    // Row-major, row 0 at y == 0: the image crate's origin is top-left, so
    // this is already the visually topmost row.
    let mut tiles = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let x = col * tile_edge;
            let y = row * tile_edge;
            let tile_w = tile_edge.min(target_w - x);
            let tile_h = tile_edge.min(target_h - y);
            let pixels = imageops::crop_imm(&resized, x, y, tile_w, tile_h).to_image();
            tiles.push(Tile { row, col, pixels });
        }
    }

    // Global summary comes from the original image, not the grid-sized
    // intermediate.
    let global_tile = Tile {
        row: 0,
        col: 0,
        pixels: imageops::resize(image, tile_edge, tile_edge, FilterType::Lanczos3),
    };

    Ok(TileGrid {
        tiles,
        rows,
        cols,
        global_tile,
    })
}

/// Resample one video frame directly to `tile_edge x tile_edge`.
///
/// Video frames skip the grid and use a single global-style tile each.
pub fn frame_tile(frame: &RgbImage, tile_edge: u32) -> PrepResult<RgbImage> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(PrepError::InvalidImage { width, height });
    }
    Ok(imageops::resize(frame, tile_edge, tile_edge, FilterType::Lanczos3))
}

/// Tile independent images in parallel.
///
/// Tiling is pure and stateless, so images fan out across the rayon pool.
pub fn tile_batch(images: &[RgbImage], max_edge: u32, tile_edge: u32) -> PrepResult<Vec<TileGrid>> {
    images
        .par_iter()
        .map(|image| tile_image(image, max_edge, tile_edge))
        .collect()
}
