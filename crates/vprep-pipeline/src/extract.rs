//! Frame extraction with ordering and cancellation guarantees.
//!
//! Explicit selections are random-access and extract concurrently; results
//! land in indexed slots so the returned sequence is index-ascending no
//! matter which task finishes first. `AllFrames` extraction is a stream
//! decode and stays sequential. Both paths check the cancellation signal
//! between frames and fail with `Cancelled` - partial results are never
//! returned.

use std::sync::Arc;

use image::RgbImage;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info};

use vprep_models::ResolvedFrame;

use crate::error::{PrepError, PrepResult};
use crate::sources::{SourceError, SourceResult, VideoSource};

/// Check a cooperative cancellation signal.
pub fn check_cancel(cancel: &Option<watch::Receiver<bool>>) -> PrepResult<()> {
    if let Some(rx) = cancel {
        if *rx.borrow() {
            info!("Cancellation observed, unwinding");
            return Err(PrepError::Cancelled);
        }
    }
    Ok(())
}

/// Extract frames one at a time, in stream order.
pub async fn extract_frames_sequential(
    source: &dyn VideoSource,
    frames: &[ResolvedFrame],
    cancel: &Option<watch::Receiver<bool>>,
) -> PrepResult<Vec<RgbImage>> {
    let mut images = Vec::with_capacity(frames.len());
    for frame in frames {
        check_cancel(cancel)?;
        images.push(source.frame_at(frame.timestamp).await?);
    }
    debug!(count = images.len(), "Sequential extraction complete");
    Ok(images)
}

/// Extract frames concurrently, preserving index order.
///
/// Every frame fetch is independent, so fetches fan out as tasks; each
/// result is written to its pre-assigned slot rather than appended, which
/// keeps the output index-ascending regardless of completion order.
pub async fn extract_frames_concurrent(
    source: Arc<dyn VideoSource>,
    frames: &[ResolvedFrame],
    cancel: &Option<watch::Receiver<bool>>,
) -> PrepResult<Vec<RgbImage>> {
    let mut set: JoinSet<(usize, SourceResult<RgbImage>)> = JoinSet::new();
    for (slot, frame) in frames.iter().enumerate() {
        let source = Arc::clone(&source);
        let timestamp = frame.timestamp;
        set.spawn(async move { (slot, source.frame_at(timestamp).await) });
    }

    let mut slots: Vec<Option<RgbImage>> = (0..frames.len()).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        if check_cancel(cancel).is_err() {
            set.abort_all();
            return Err(PrepError::Cancelled);
        }
        let (slot, result) = joined.map_err(|e| {
            PrepError::UpstreamDecode(SourceError::decode(format!("extraction task failed: {e}")))
        })?;
        slots[slot] = Some(result?);
    }

    debug!(count = slots.len(), "Concurrent extraction complete");
    Ok(slots
        .into_iter()
        .map(|slot| slot.expect("every spawned slot is filled exactly once"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Fake source: 1x1 frames whose red channel encodes the timestamp.
    /// Later timestamps decode faster, inverting completion order.
    struct StaggeredSource {
        duration: f64,
    }

    #[async_trait]
    impl VideoSource for StaggeredSource {
        async fn duration_secs(&self) -> SourceResult<f64> {
            Ok(self.duration)
        }

        async fn frame_at(&self, timestamp_secs: f64) -> SourceResult<RgbImage> {
            let delay = (self.duration - timestamp_secs).max(0.0);
            tokio::time::sleep(Duration::from_millis((delay * 10.0) as u64)).await;
            Ok(RgbImage::from_pixel(
                1,
                1,
                image::Rgb([timestamp_secs as u8, 0, 0]),
            ))
        }
    }

    fn frames(timestamps: &[f64]) -> Vec<ResolvedFrame> {
        timestamps
            .iter()
            .enumerate()
            .map(|(i, &t)| ResolvedFrame::new(i, t))
            .collect()
    }

    fn red_channels(images: &[RgbImage]) -> Vec<u8> {
        images.iter().map(|img| img.get_pixel(0, 0)[0]).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_extraction_preserves_index_order() {
        let source = Arc::new(StaggeredSource { duration: 10.0 });
        let frames = frames(&[1.0, 4.0, 9.0]);
        // Frame at 9.0 completes first; output must still be ascending.
        let images = extract_frames_concurrent(source, &frames, &None)
            .await
            .unwrap();
        assert_eq!(red_channels(&images), vec![1, 4, 9]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_extraction_order() {
        let source = StaggeredSource { duration: 5.0 };
        let frames = frames(&[0.0, 2.0, 4.0]);
        let images = extract_frames_sequential(&source, &frames, &None)
            .await
            .unwrap();
        assert_eq!(red_channels(&images), vec![0, 2, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_fails_without_partial_result() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let source = StaggeredSource { duration: 5.0 };
        let err = extract_frames_sequential(&source, &frames(&[0.0, 1.0]), &Some(rx.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, PrepError::Cancelled));

        let err = extract_frames_concurrent(
            Arc::new(StaggeredSource { duration: 5.0 }),
            &frames(&[0.0, 1.0]),
            &Some(rx),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PrepError::Cancelled));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        struct FailingSource;

        #[async_trait]
        impl VideoSource for FailingSource {
            async fn duration_secs(&self) -> SourceResult<f64> {
                Ok(1.0)
            }
            async fn frame_at(&self, _timestamp_secs: f64) -> SourceResult<RgbImage> {
                Err(SourceError::decode("corrupt stream"))
            }
        }

        let err = extract_frames_sequential(&FailingSource, &frames(&[0.0]), &None)
            .await
            .unwrap_err();
        assert!(matches!(err, PrepError::UpstreamDecode(_)));
    }
}
