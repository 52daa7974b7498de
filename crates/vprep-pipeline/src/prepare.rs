//! Model input preparation facade.
//!
//! One [`ModelPreprocessor`] implementation per model variant, chosen at
//! configuration time - never by inspecting media or processor types at
//! runtime. [`TilePreprocessor`] covers tile-grid models: it composes
//! resolve -> extract -> tile -> assemble -> splice and enforces the
//! prompt-unit / pixel-batch count invariant before returning.

use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use tokio::sync::watch;
use tracing::{debug, info};

use vprep_models::{format_seconds, FrameSelection, PrepConfig};

use crate::error::{ensure_media_count, PrepResult};
use crate::extract::{check_cancel, extract_frames_concurrent, extract_frames_sequential};
use crate::frames::resolve_frames_required;
use crate::pixels::PixelBatch;
use crate::prompt::{image_prompt_text, image_unit_count, splice, splice_after, video_prompt_text};
use crate::sources::VideoSource;
use crate::tiler::{frame_tile, tile_image};

/// Media attached to one request.
pub enum MediaInput {
    Image(RgbImage),
    Video {
        source: Arc<dyn VideoSource>,
        selection: FrameSelection,
    },
}

/// Everything the model needs for one request: the spliced prompt text and
/// the matching ordered pixel batch.
#[derive(Debug, Clone)]
pub struct ModelInput {
    pub prompt: String,
    pub pixels: PixelBatch,
}

/// Prepares model inputs for one model variant.
#[async_trait]
pub trait ModelPreprocessor: Send + Sync {
    /// Build the model input from media and already-rendered chat text.
    ///
    /// `rendered_chat_text` comes from the external tokenizer's template
    /// with a single media placeholder; the full expansion is spliced in
    /// here once tile/frame counts are known.
    async fn prepare(
        &self,
        input: MediaInput,
        rendered_chat_text: &str,
        cancel: Option<watch::Receiver<bool>>,
    ) -> PrepResult<ModelInput>;
}

/// Preprocessor for tile-grid models (grid tiles + global tile per image,
/// one global-style tile per video frame).
pub struct TilePreprocessor {
    config: PrepConfig,
}

impl TilePreprocessor {
    pub fn new(config: PrepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrepConfig {
        &self.config
    }

    fn prepare_image(&self, image: &RgbImage, rendered: &str) -> PrepResult<ModelInput> {
        let config = &self.config;
        let grid = tile_image(image, config.image_max_edge, config.tile_edge)?;

        let block = image_prompt_text(grid.rows, grid.cols, config.seq_len, &config.markers);
        let pixels = PixelBatch::from_tile_grid(&grid, config.pixel_mean, config.pixel_std);
        ensure_media_count(image_unit_count(grid.rows, grid.cols), pixels.unit_count())?;

        let prompt = splice(rendered, &config.markers.placeholder_token, &block)?;
        debug!(
            rows = grid.rows,
            cols = grid.cols,
            units = pixels.unit_count(),
            "Prepared image input"
        );
        Ok(ModelInput { prompt, pixels })
    }

    async fn prepare_video(
        &self,
        source: Arc<dyn VideoSource>,
        selection: &FrameSelection,
        rendered: &str,
        cancel: Option<watch::Receiver<bool>>,
    ) -> PrepResult<ModelInput> {
        let config = &self.config;
        let duration = source.duration_secs().await?;
        let frames = resolve_frames_required(selection, duration, config.sampling_rate)?;

        // Random-access selections extract concurrently; the full stream
        // decodes in order.
        let images = if selection.is_explicit() {
            extract_frames_concurrent(Arc::clone(&source), &frames, &cancel).await?
        } else {
            extract_frames_sequential(source.as_ref(), &frames, &cancel).await?
        };

        // Video frames use the video pixel budget, not the image tile size.
        let mut tiles = Vec::with_capacity(images.len());
        for image in &images {
            check_cancel(&cancel)?;
            tiles.push(frame_tile(image, config.video_max_edge)?);
        }

        let labels: Vec<String> = frames
            .iter()
            .map(|frame| format_seconds(frame.timestamp))
            .collect();
        let block = video_prompt_text(
            &labels,
            &format_seconds(duration),
            config.seq_len,
            &config.markers,
        );

        let pixels = PixelBatch::from_frames(&tiles, config.pixel_mean, config.pixel_std);
        ensure_media_count(labels.len(), pixels.unit_count())?;

        let prompt = splice_after(rendered, &config.markers.video_splice_marker, &block)?;
        info!(
            frame_count = frames.len(),
            duration, "Prepared video input"
        );
        Ok(ModelInput { prompt, pixels })
    }
}

#[async_trait]
impl ModelPreprocessor for TilePreprocessor {
    async fn prepare(
        &self,
        input: MediaInput,
        rendered_chat_text: &str,
        cancel: Option<watch::Receiver<bool>>,
    ) -> PrepResult<ModelInput> {
        match input {
            MediaInput::Image(image) => self.prepare_image(&image, rendered_chat_text),
            MediaInput::Video { source, selection } => {
                self.prepare_video(source, &selection, rendered_chat_text, cancel)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrepError;
    use crate::sources::{SourceError, SourceResult};
    use image::Rgb;

    struct SolidSource {
        duration: f64,
    }

    #[async_trait]
    impl VideoSource for SolidSource {
        async fn duration_secs(&self) -> SourceResult<f64> {
            Ok(self.duration)
        }
        async fn frame_at(&self, timestamp_secs: f64) -> SourceResult<RgbImage> {
            if timestamp_secs < 0.0 {
                return Err(SourceError::decode("negative timestamp"));
            }
            Ok(RgbImage::from_pixel(640, 360, Rgb([9, 9, 9])))
        }
    }

    fn config() -> PrepConfig {
        PrepConfig {
            tile_edge: 256,
            image_max_edge: 512,
            video_max_edge: 256,
            seq_len: 2,
            ..PrepConfig::default()
        }
    }

    #[tokio::test]
    async fn test_prepare_image_counts_match() {
        let prep = TilePreprocessor::new(config());
        let image = RgbImage::from_pixel(1024, 1024, Rgb([3, 3, 3]));
        let input = prep
            .prepare(
                MediaInput::Image(image),
                "User: what is this? <image>\nAssistant:",
                None,
            )
            .await
            .unwrap();

        // 512x512 processing size at 256 tiles: 2x2 grid + global = 5 units.
        assert_eq!(input.pixels.unit_count(), 5);
        assert_eq!(input.prompt.matches("<image><image>").count(), 5);
        assert!(input.prompt.starts_with("User: what is this? "));
        assert!(input.prompt.ends_with("\nAssistant:"));
        assert!(!input.prompt.contains("<image><image><image>"));
    }

    #[tokio::test]
    async fn test_prepare_image_missing_placeholder() {
        let prep = TilePreprocessor::new(config());
        let image = RgbImage::from_pixel(100, 100, Rgb([3, 3, 3]));
        let err = prep
            .prepare(MediaInput::Image(image), "no placeholder here", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PrepError::MissingSplicePoint { .. }));
    }

    #[tokio::test]
    async fn test_prepare_video_all_frames() {
        let prep = TilePreprocessor::new(config());
        let input = prep
            .prepare(
                MediaInput::Video {
                    source: Arc::new(SolidSource { duration: 4.0 }),
                    selection: FrameSelection::AllFrames,
                },
                "User: summarize\nAssistant:",
                None,
            )
            .await
            .unwrap();

        // 4 frames at 1 fps, one unit each.
        assert_eq!(input.pixels.unit_count(), 4);
        let shape = input.pixels.video_shape.unwrap();
        assert_eq!(shape.temporal, 4);
        assert_eq!((shape.height, shape.width), (256, 256));
        assert_eq!(input.prompt.matches("Frame from").count(), 4);
        // Block lands right after the role prefix.
        assert!(input
            .prompt
            .starts_with("User:You are provided the following series of 4 frames"));
    }

    #[tokio::test]
    async fn test_prepare_video_explicit_frames() {
        let prep = TilePreprocessor::new(config());
        let input = prep
            .prepare(
                MediaInput::Video {
                    source: Arc::new(SolidSource { duration: 10.0 }),
                    selection: FrameSelection::FrameNumbers(vec![8, 2, -3, 99]),
                },
                "User: compare\nAssistant:",
                None,
            )
            .await
            .unwrap();

        // Only indices 2 and 8 survive filtering.
        assert_eq!(input.pixels.unit_count(), 2);
        assert!(input.prompt.contains("Frame from 0:00:02:"));
        assert!(input.prompt.contains("Frame from 0:00:08:"));
    }

    #[tokio::test]
    async fn test_prepare_video_empty_selection_fails() {
        let prep = TilePreprocessor::new(config());
        let err = prep
            .prepare(
                MediaInput::Video {
                    source: Arc::new(SolidSource { duration: 10.0 }),
                    selection: FrameSelection::FrameNumbers(vec![-1, 30, 1000]),
                },
                "User: compare\nAssistant:",
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PrepError::InvalidSelection { .. }));
    }
}
