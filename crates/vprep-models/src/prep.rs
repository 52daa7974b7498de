//! Preprocessing configuration.
//!
//! One immutable [`PrepConfig`] is constructed per request and threaded by
//! value into every pipeline call. Image and video paths carry separate
//! pixel budgets; nothing is mutated on a live processor between calls.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default longest-edge budget for still images.
pub const DEFAULT_IMAGE_MAX_EDGE: u32 = 2048;
/// Default longest-edge budget for video frames (one global tile per frame).
pub const DEFAULT_VIDEO_MAX_EDGE: u32 = 512;
/// Default tile edge length in pixels.
pub const DEFAULT_TILE_EDGE: u32 = 512;
/// Default placeholder tokens per visual unit.
pub const DEFAULT_SEQ_LEN: usize = 64;
/// Default video sampling rate in frames per second.
pub const DEFAULT_SAMPLING_RATE: f64 = 1.0;

/// Default marker wrapped around every visual unit.
pub const DEFAULT_FAKE_TOKEN: &str = "<fake_token_around_image>";
/// Default placeholder token, repeated `seq_len` times per unit. Also the
/// single-token splice point in rendered image chat text.
pub const DEFAULT_PLACEHOLDER_TOKEN: &str = "<image>";
/// Default marker labeling the global (holistic) tile.
pub const DEFAULT_GLOBAL_TOKEN: &str = "<global-img>";
/// Default role prefix after which the video block is spliced.
pub const DEFAULT_VIDEO_SPLICE_MARKER: &str = "User:";

/// Marker strings used to build and splice placeholder blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PromptMarkers {
    #[serde(default = "default_fake_token")]
    pub fake_token: String,

    #[serde(default = "default_placeholder_token")]
    pub placeholder_token: String,

    #[serde(default = "default_global_token")]
    pub global_token: String,

    /// Role prefix the video block is inserted after in rendered chat text.
    #[serde(default = "default_video_splice_marker")]
    pub video_splice_marker: String,
}

fn default_fake_token() -> String {
    DEFAULT_FAKE_TOKEN.to_string()
}
fn default_placeholder_token() -> String {
    DEFAULT_PLACEHOLDER_TOKEN.to_string()
}
fn default_global_token() -> String {
    DEFAULT_GLOBAL_TOKEN.to_string()
}
fn default_video_splice_marker() -> String {
    DEFAULT_VIDEO_SPLICE_MARKER.to_string()
}

impl Default for PromptMarkers {
    fn default() -> Self {
        Self {
            fake_token: default_fake_token(),
            placeholder_token: default_placeholder_token(),
            global_token: default_global_token(),
            video_splice_marker: default_video_splice_marker(),
        }
    }
}

/// Per-request preprocessing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PrepConfig {
    /// Longest-edge budget for still images before tiling.
    #[serde(default = "default_image_max_edge")]
    pub image_max_edge: u32,

    /// Longest-edge budget for video frames.
    #[serde(default = "default_video_max_edge")]
    pub video_max_edge: u32,

    /// Tile edge length; every visual unit is `tile_edge x tile_edge`.
    #[serde(default = "default_tile_edge")]
    pub tile_edge: u32,

    /// Placeholder tokens emitted per visual unit. Must match the encoder's
    /// per-tile token count exactly.
    #[serde(default = "default_seq_len")]
    pub seq_len: usize,

    /// Assumed video sampling rate in frames per second.
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,

    /// Per-channel normalization mean applied to pixel batches.
    #[serde(default = "default_pixel_mean")]
    pub pixel_mean: [f32; 3],

    /// Per-channel normalization std applied to pixel batches.
    #[serde(default = "default_pixel_std")]
    pub pixel_std: [f32; 3],

    #[serde(default)]
    pub markers: PromptMarkers,
}

fn default_image_max_edge() -> u32 {
    DEFAULT_IMAGE_MAX_EDGE
}
fn default_video_max_edge() -> u32 {
    DEFAULT_VIDEO_MAX_EDGE
}
fn default_tile_edge() -> u32 {
    DEFAULT_TILE_EDGE
}
fn default_seq_len() -> usize {
    DEFAULT_SEQ_LEN
}
fn default_sampling_rate() -> f64 {
    DEFAULT_SAMPLING_RATE
}
fn default_pixel_mean() -> [f32; 3] {
    [0.5, 0.5, 0.5]
}
fn default_pixel_std() -> [f32; 3] {
    [0.5, 0.5, 0.5]
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            image_max_edge: DEFAULT_IMAGE_MAX_EDGE,
            video_max_edge: DEFAULT_VIDEO_MAX_EDGE,
            tile_edge: DEFAULT_TILE_EDGE,
            seq_len: DEFAULT_SEQ_LEN,
            sampling_rate: DEFAULT_SAMPLING_RATE,
            pixel_mean: default_pixel_mean(),
            pixel_std: default_pixel_std(),
            markers: PromptMarkers::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PrepConfig::default();
        assert_eq!(config.tile_edge, 512);
        assert_eq!(config.seq_len, 64);
        assert_eq!(config.sampling_rate, 1.0);
        assert_eq!(config.markers.placeholder_token, "<image>");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PrepConfig = serde_json::from_str(r#"{"tile_edge": 448}"#).unwrap();
        assert_eq!(config.tile_edge, 448);
        assert_eq!(config.seq_len, DEFAULT_SEQ_LEN);
        assert_eq!(config.markers, PromptMarkers::default());
    }
}
