#![deny(unreachable_patterns)]
//! Media preparation for vision-language model inference.
//!
//! This crate provides:
//! - Frame-selection resolution with validation and range filtering
//! - Deterministic image tiling (grid tiles + global summary tile)
//! - Placeholder-token prompt assembly and chat-text splicing
//! - Streaming scene segmentation with min/max duration constraints
//! - Ordered, cancellable frame extraction over collaborator sources
//!
//! All operations are pure transformations of their inputs plus the
//! collaborator services in [`sources`]; configuration is threaded
//! explicitly into every call and nothing is retried here.

pub mod error;
pub mod extract;
pub mod frames;
pub mod pixels;
pub mod prepare;
pub mod prompt;
pub mod scenes;
pub mod sources;
pub mod tiler;

pub use error::{ensure_media_count, PrepError, PrepResult};
pub use extract::{extract_frames_concurrent, extract_frames_sequential};
pub use frames::{resolve_frames, resolve_frames_required};
pub use pixels::{normalize_image, PixelBatch, VideoShape};
pub use prepare::{MediaInput, ModelInput, ModelPreprocessor, TilePreprocessor};
pub use prompt::{image_prompt_text, image_unit_count, splice, splice_after, video_prompt_text};
pub use scenes::{
    scene_spans, segment_video, BoundaryReason, SceneSegmenter, SegmentationOutcome,
};
pub use sources::{
    euclidean_distance, ChatMessage, FrameEmbedder, FrameFeature, SourceError, SourceResult,
    Tokenizer, VideoSource,
};
pub use tiler::{frame_tile, tile_batch, tile_image, Tile, TileGrid};
