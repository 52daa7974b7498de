//! Scene segmentation.
//!
//! Single-pass state machine over an ordered frame stream. Each frame's
//! feature is compared against the reference feature of the current scene;
//! a boundary opens a new scene and moves the reference. Two duration
//! constraints compete with the distance threshold: scenes shorter than
//! `min_scene_secs` never end (candidate cuts are suppressed), and scenes
//! reaching `max_scene_secs` end unconditionally.
//!
//! Segmentation is strictly sequential - the decision at frame `k` depends
//! on the reference chosen at the most recent boundary, which can be
//! arbitrarily far back. It may be pipelined behind concurrent extraction,
//! but must consume frames in index order.

use tokio::sync::watch;
use tracing::{debug, info};

use vprep_models::{
    FrameSelection, ReferencePolicy, ResolvedFrame, SceneBoundary, SceneSpan, SegmentationConfig,
};

use crate::error::PrepResult;
use crate::extract::check_cancel;
use crate::frames::resolve_frames_required;
use crate::sources::{FrameEmbedder, VideoSource};

/// Why a boundary was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryReason {
    /// The scene reached `max_scene_secs`.
    DurationCap,
    /// Feature distance crossed the threshold after `min_scene_secs`.
    DistanceThreshold,
}

enum SegmenterState<F> {
    AwaitingFirstFrame,
    Active {
        reference: F,
        last_boundary_secs: f64,
    },
}

/// Streaming scene segmenter.
///
/// Feed frames in index order via [`observe`](Self::observe); call
/// [`finish`](Self::finish) to take the boundary list. The list is never
/// empty once at least one frame was observed - the first frame always
/// opens the first scene.
pub struct SceneSegmenter<F> {
    config: SegmentationConfig,
    state: SegmenterState<F>,
    boundaries: Vec<SceneBoundary>,
}

impl<F> SceneSegmenter<F> {
    pub fn new(config: SegmentationConfig) -> Self {
        Self {
            config,
            state: SegmenterState::AwaitingFirstFrame,
            boundaries: Vec::new(),
        }
    }

    /// Boundaries accumulated so far.
    pub fn boundaries(&self) -> &[SceneBoundary] {
        &self.boundaries
    }

    /// Observe the next frame in stream order.
    ///
    /// `distance` compares the current reference with the new feature;
    /// it must be symmetric and non-negative. Returns the reason when this
    /// frame opened a new scene.
    pub fn observe<D>(
        &mut self,
        frame: ResolvedFrame,
        feature: F,
        distance: D,
    ) -> Option<BoundaryReason>
    where
        D: Fn(&F, &F) -> f64,
    {
        match &mut self.state {
            SegmenterState::AwaitingFirstFrame => {
                self.boundaries
                    .push(SceneBoundary::new(frame.index, frame.timestamp));
                self.state = SegmenterState::Active {
                    reference: feature,
                    last_boundary_secs: frame.timestamp,
                };
                None
            }
            SegmenterState::Active {
                reference,
                last_boundary_secs,
            } => {
                let elapsed = frame.timestamp - *last_boundary_secs;
                let d = distance(reference, &feature);

                // Duration cap wins over the threshold rule when both fire.
                let reason = if elapsed >= self.config.max_scene_secs {
                    Some(BoundaryReason::DurationCap)
                } else if d > self.config.threshold && elapsed >= self.config.min_scene_secs {
                    Some(BoundaryReason::DistanceThreshold)
                } else {
                    None
                };

                match reason {
                    Some(reason) => {
                        info!(
                            frame_index = frame.index,
                            timestamp = frame.timestamp,
                            distance = format!("{:.3}", d),
                            ?reason,
                            "Scene boundary"
                        );
                        self.boundaries
                            .push(SceneBoundary::new(frame.index, frame.timestamp));
                        *reference = feature;
                        *last_boundary_secs = frame.timestamp;
                    }
                    None if d > self.config.threshold => {
                        // Candidate cut inside the minimum-duration window.
                        debug!(
                            frame_index = frame.index,
                            elapsed,
                            distance = format!("{:.3}", d),
                            "Suppressed scene change (scene too short)"
                        );
                        if self.config.reference_policy == ReferencePolicy::Sliding {
                            *reference = feature;
                        }
                    }
                    None => {}
                }
                reason
            }
        }
    }

    /// Terminal transition: consume the segmenter and take the boundaries.
    pub fn finish(self) -> Vec<SceneBoundary> {
        self.boundaries
    }
}

/// Fold consecutive boundaries into scene spans.
///
/// Each span runs from its boundary to the frame before the next one; the
/// last span runs to `end_frame`/`end_secs` (end of stream).
pub fn scene_spans(
    boundaries: &[SceneBoundary],
    end_frame: usize,
    end_secs: f64,
) -> Vec<SceneSpan> {
    boundaries
        .iter()
        .enumerate()
        .map(|(i, boundary)| match boundaries.get(i + 1) {
            Some(next) => SceneSpan {
                start_frame: boundary.frame_index,
                end_frame: next.frame_index.saturating_sub(1),
                start_secs: boundary.timestamp,
                end_secs: next.timestamp,
            },
            None => SceneSpan {
                start_frame: boundary.frame_index,
                end_frame,
                start_secs: boundary.timestamp,
                end_secs,
            },
        })
        .collect()
}

/// Result of a full segmentation run.
#[derive(Debug, Clone)]
pub struct SegmentationOutcome {
    pub boundaries: Vec<SceneBoundary>,
    pub spans: Vec<SceneSpan>,
}

/// Segment a whole video into scenes.
///
/// Resolves every sampled frame, then runs the sequential extract ->
/// feature -> observe loop. The cancellation signal is checked before each
/// frame; a cancelled run fails with
/// [`PrepError::Cancelled`](crate::error::PrepError) and returns no partial
/// boundary list.
pub async fn segment_video(
    source: &dyn VideoSource,
    embedder: &dyn FrameEmbedder,
    config: SegmentationConfig,
    sampling_rate: f64,
    cancel: Option<watch::Receiver<bool>>,
) -> PrepResult<SegmentationOutcome> {
    let duration = source.duration_secs().await?;
    let frames = resolve_frames_required(&FrameSelection::AllFrames, duration, sampling_rate)?;
    let last = *frames.last().expect("required resolution is non-empty");

    info!(
        duration,
        sampling_rate,
        frame_count = frames.len(),
        "Segmenting video"
    );

    let mut segmenter = SceneSegmenter::new(config);
    for frame in frames {
        check_cancel(&cancel)?;
        let image = source.frame_at(frame.timestamp).await?;
        let feature = embedder.feature(&image).await?;
        segmenter.observe(frame, feature, |a, b| embedder.distance(a, b));
    }

    let boundaries = segmenter.finish();
    let spans = scene_spans(&boundaries, last.index, last.timestamp);
    info!(scenes = spans.len(), "Segmentation complete");

    Ok(SegmentationOutcome { boundaries, spans })
}
