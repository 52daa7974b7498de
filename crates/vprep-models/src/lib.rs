//! Shared data models for the VPrep preprocessing pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Frame selection intents and resolved frames
//! - Scene boundaries, spans, and segmentation tuning
//! - Per-request preprocessing configuration and prompt markers
//! - Timestamp parsing and prompt-label formatting

pub mod prep;
pub mod scene;
pub mod selection;
pub mod timestamp;

// Re-export common types
pub use prep::{PrepConfig, PromptMarkers};
pub use scene::{ReferencePolicy, SceneBoundary, SceneSpan, SegmentationConfig};
pub use selection::{FrameSelection, ResolvedFrame};
pub use timestamp::{format_seconds, parse_timestamp, TimestampError};
