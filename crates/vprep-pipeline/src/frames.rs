//! Frame-selection resolution.
//!
//! Turns a [`FrameSelection`] into a concrete, ordered list of
//! [`ResolvedFrame`]s given a video duration and an assumed sampling rate.
//! Out-of-range entries are dropped and logged, never surfaced as errors -
//! unless the caller requires at least one frame and none survive.

use tracing::{debug, warn};

use vprep_models::{FrameSelection, ResolvedFrame};

use crate::error::{PrepError, PrepResult};

/// Resolve a selection into ordered `(index, timestamp)` pairs.
///
/// Indices in the result are strictly increasing and unique. May return an
/// empty list; use [`resolve_frames_required`] on paths that need at least
/// one frame.
pub fn resolve_frames(
    selection: &FrameSelection,
    duration_secs: f64,
    sampling_rate: f64,
) -> Vec<ResolvedFrame> {
    if !(sampling_rate > 0.0) || !(duration_secs >= 0.0) {
        warn!(
            duration_secs,
            sampling_rate, "Degenerate duration or sampling rate, resolving to zero frames"
        );
        return Vec::new();
    }

    // Number of sampled frames; explicit indices must stay below this.
    let frame_count = (duration_secs * sampling_rate).floor() as usize;

    match selection {
        FrameSelection::AllFrames => (0..frame_count)
            .map(|index| ResolvedFrame::new(index, index as f64 / sampling_rate))
            .collect(),

        FrameSelection::FrameNumbers(numbers) => {
            let mut numbers = numbers.clone();
            numbers.sort_unstable();
            numbers.dedup();

            let (kept, dropped): (Vec<i64>, Vec<i64>) = numbers
                .into_iter()
                .partition(|&n| n >= 0 && (n as usize) < frame_count);
            if !dropped.is_empty() {
                debug!(
                    ?dropped,
                    frame_count, "Dropped out-of-range frame numbers from selection"
                );
            }

            kept.into_iter()
                .map(|n| ResolvedFrame::new(n as usize, n as f64 / sampling_rate))
                .collect()
        }

        FrameSelection::Timestamps(timestamps) => {
            let (mut kept, dropped): (Vec<f64>, Vec<f64>) = timestamps
                .iter()
                .copied()
                .partition(|&t| t.is_finite() && t >= 0.0 && t <= duration_secs);
            if !dropped.is_empty() {
                debug!(
                    ?dropped,
                    duration_secs, "Dropped out-of-range timestamps from selection"
                );
            }
            kept.sort_by(f64::total_cmp);

            // The extraction index rounds to the nearest sampled frame, but
            // the reported timestamp stays exact. Two timestamps rounding to
            // the same index keep the first occurrence.
            let mut frames: Vec<ResolvedFrame> = Vec::with_capacity(kept.len());
            for t in kept {
                let index = (t * sampling_rate).round() as usize;
                if frames.last().map_or(true, |f| f.index != index) {
                    frames.push(ResolvedFrame::new(index, t));
                }
            }
            frames
        }
    }
}

/// Resolve a selection that must yield at least one frame.
///
/// Fails with [`PrepError::InvalidSelection`] when filtering empties the
/// result - the video-prompt and segmentation paths both require this.
pub fn resolve_frames_required(
    selection: &FrameSelection,
    duration_secs: f64,
    sampling_rate: f64,
) -> PrepResult<Vec<ResolvedFrame>> {
    let frames = resolve_frames(selection, duration_secs, sampling_rate);
    if frames.is_empty() {
        return Err(PrepError::invalid_selection(format!(
            "selection {:?} yields no frames for duration {:.3}s at {:.3} fps",
            selection, duration_secs, sampling_rate
        )));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_frames_count_and_ordering() {
        let frames = resolve_frames(&FrameSelection::AllFrames, 10.0, 2.0);
        assert_eq!(frames.len(), 20);
        assert_eq!(frames[0], ResolvedFrame::new(0, 0.0));
        assert_eq!(frames[19], ResolvedFrame::new(19, 9.5));
        for pair in frames.windows(2) {
            assert!(pair[0].index < pair[1].index);
        }
    }

    #[test]
    fn test_all_frames_fractional_duration() {
        // floor(3.7 * 1.0) = 3 frames
        let frames = resolve_frames(&FrameSelection::AllFrames, 3.7, 1.0);
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn test_frame_numbers_filters_out_of_range() {
        let sel = FrameSelection::FrameNumbers(vec![5, -1, 3, 1000]);
        let frames = resolve_frames(&sel, 10.0, 2.0);
        assert_eq!(
            frames,
            vec![ResolvedFrame::new(3, 1.5), ResolvedFrame::new(5, 2.5)]
        );
    }

    #[test]
    fn test_frame_numbers_sorted_and_deduped() {
        let sel = FrameSelection::FrameNumbers(vec![7, 2, 7, 0]);
        let frames = resolve_frames(&sel, 10.0, 1.0);
        let indices: Vec<usize> = frames.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 2, 7]);
    }

    #[test]
    fn test_frame_numbers_all_out_of_range_is_empty_not_error() {
        // max index is floor(10 * 2) = 20
        let sel = FrameSelection::FrameNumbers(vec![30, -1, 1000]);
        assert!(resolve_frames(&sel, 10.0, 2.0).is_empty());
    }

    #[test]
    fn test_required_raises_on_empty() {
        let sel = FrameSelection::FrameNumbers(vec![30, -1, 1000]);
        let err = resolve_frames_required(&sel, 10.0, 2.0).unwrap_err();
        assert!(matches!(err, PrepError::InvalidSelection { .. }));
    }

    #[test]
    fn test_timestamps_keep_exact_value() {
        let sel = FrameSelection::Timestamps(vec![4.3, 0.26]);
        let frames = resolve_frames(&sel, 10.0, 2.0);
        // Index rounds, timestamp does not.
        assert_eq!(
            frames,
            vec![ResolvedFrame::new(1, 0.26), ResolvedFrame::new(9, 4.3)]
        );
    }

    #[test]
    fn test_timestamps_filter_and_boundary() {
        // t == duration is kept; negatives and beyond-duration dropped.
        let sel = FrameSelection::Timestamps(vec![-0.5, 10.0, 11.0]);
        let frames = resolve_frames(&sel, 10.0, 1.0);
        assert_eq!(frames, vec![ResolvedFrame::new(10, 10.0)]);
    }

    #[test]
    fn test_timestamps_same_index_keeps_first() {
        // Both round to index 1 at 1 fps.
        let sel = FrameSelection::Timestamps(vec![0.9, 1.1]);
        let frames = resolve_frames(&sel, 10.0, 1.0);
        assert_eq!(frames, vec![ResolvedFrame::new(1, 0.9)]);
    }

    #[test]
    fn test_degenerate_inputs_resolve_empty() {
        assert!(resolve_frames(&FrameSelection::AllFrames, 10.0, 0.0).is_empty());
        assert!(resolve_frames(&FrameSelection::AllFrames, -1.0, 1.0).is_empty());
        assert!(resolve_frames(&FrameSelection::AllFrames, 0.4, 1.0).is_empty());
    }
}
