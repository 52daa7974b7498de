//! Scene segmentation data models and configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default feature-distance threshold for declaring a scene change.
pub const DEFAULT_SCENE_THRESHOLD: f64 = 0.5;
/// Default minimum scene duration in seconds (suppresses rapid cuts).
pub const DEFAULT_MIN_SCENE_SECS: f64 = 2.0;
/// Default maximum scene duration in seconds (forces a boundary).
pub const DEFAULT_MAX_SCENE_SECS: f64 = 15.0;

/// The start of a visually distinct segment.
///
/// The first boundary of any segmentation is `(0, 0.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneBoundary {
    /// Index of the first frame of the scene.
    pub frame_index: usize,
    /// Timestamp of that frame in seconds.
    pub timestamp: f64,
}

impl SceneBoundary {
    pub fn new(frame_index: usize, timestamp: f64) -> Self {
        Self {
            frame_index,
            timestamp,
        }
    }
}

/// A scene span derived from two consecutive boundaries.
///
/// `end_frame` is inclusive; the last span of a video runs to the final
/// streamed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneSpan {
    pub start_frame: usize,
    pub end_frame: usize,
    pub start_secs: f64,
    pub end_secs: f64,
}

impl SceneSpan {
    /// Number of frames in this span.
    pub fn frame_count(&self) -> usize {
        self.end_frame - self.start_frame + 1
    }
}

/// What happens to the reference frame when a threshold crossing is
/// suppressed because the current scene is still shorter than the minimum
/// duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Reference stays at the scene start; the rejected candidate leaves no
    /// trace and later frames are compared against the original scene.
    #[default]
    Pinned,
    /// Reference moves to the rejected candidate without emitting a
    /// boundary; later frames are compared against the candidate.
    Sliding,
}

/// Segmentation tuning. All values are caller-supplied; the segmenter itself
/// enforces no implicit defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentationConfig {
    /// Distance above which a frame is a scene-change candidate.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Minimum scene duration in seconds. Candidate changes inside this
    /// window are suppressed.
    #[serde(default = "default_min_scene_secs")]
    pub min_scene_secs: f64,

    /// Maximum scene duration in seconds. A boundary is forced once a scene
    /// reaches this length, regardless of distance.
    #[serde(default = "default_max_scene_secs")]
    pub max_scene_secs: f64,

    /// Reference handling after a suppressed candidate.
    #[serde(default)]
    pub reference_policy: ReferencePolicy,
}

fn default_threshold() -> f64 {
    DEFAULT_SCENE_THRESHOLD
}
fn default_min_scene_secs() -> f64 {
    DEFAULT_MIN_SCENE_SECS
}
fn default_max_scene_secs() -> f64 {
    DEFAULT_MAX_SCENE_SECS
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SCENE_THRESHOLD,
            min_scene_secs: DEFAULT_MIN_SCENE_SECS,
            max_scene_secs: DEFAULT_MAX_SCENE_SECS,
            reference_policy: ReferencePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SegmentationConfig::default();
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.min_scene_secs, 2.0);
        assert_eq!(config.max_scene_secs, 15.0);
        assert_eq!(config.reference_policy, ReferencePolicy::Pinned);
    }

    #[test]
    fn test_span_frame_count() {
        let span = SceneSpan {
            start_frame: 10,
            end_frame: 19,
            start_secs: 10.0,
            end_secs: 19.0,
        };
        assert_eq!(span.frame_count(), 10);
    }

    #[test]
    fn test_config_serde_fills_defaults() {
        let config: SegmentationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SegmentationConfig::default());
    }
}
