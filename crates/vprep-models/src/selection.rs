//! Frame selection intents and resolved frames.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which frames of a video to process.
///
/// Constructed from user/UI input and immutable afterwards. Explicit
/// selections may contain out-of-range entries; resolution filters them
/// rather than failing (see the pipeline crate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "mode", content = "values", rename_all = "snake_case")]
pub enum FrameSelection {
    /// Every decodable frame at the configured sampling rate.
    #[default]
    AllFrames,
    /// Explicit frame numbers. Negative or past-the-end entries are dropped
    /// during resolution.
    FrameNumbers(Vec<i64>),
    /// Explicit timestamps in seconds. Negative or past-duration entries are
    /// dropped during resolution.
    Timestamps(Vec<f64>),
}

impl FrameSelection {
    /// True when the selection names explicit frames (random access) rather
    /// than the full stream.
    pub fn is_explicit(&self) -> bool {
        !matches!(self, FrameSelection::AllFrames)
    }
}

/// One concrete frame chosen by resolution: a decodable index plus the
/// timestamp to report for it.
///
/// Within one resolution, indices are strictly increasing and unique. For
/// index-derived frames `timestamp == index / sampling_rate`; for
/// timestamp-derived frames the original (unrounded) timestamp is kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedFrame {
    /// Frame index used for extraction.
    pub index: usize,
    /// Timestamp in seconds, reported alongside the frame.
    pub timestamp: f64,
}

impl ResolvedFrame {
    pub fn new(index: usize, timestamp: f64) -> Self {
        Self { index, timestamp }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all_frames() {
        assert_eq!(FrameSelection::default(), FrameSelection::AllFrames);
        assert!(!FrameSelection::AllFrames.is_explicit());
        assert!(FrameSelection::FrameNumbers(vec![0]).is_explicit());
    }

    #[test]
    fn test_selection_serde_round_trip() {
        let sel = FrameSelection::Timestamps(vec![0.0, 1.5, 3.0]);
        let json = serde_json::to_string(&sel).unwrap();
        assert!(json.contains("timestamps"));
        let back: FrameSelection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sel);
    }
}
