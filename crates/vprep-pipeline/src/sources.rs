//! Collaborator seams: video decoding, frame embedding, tokenization.
//!
//! The pipeline treats all three as opaque services chosen at configuration
//! time. It never inspects concrete types at runtime and never retries a
//! failed collaborator call; failures are wrapped into
//! [`PrepError::UpstreamDecode`](crate::error::PrepError) and propagated.

use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by external collaborators.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Video decode failed: {0}")]
    Decode(String),

    #[error("Embedding failed: {0}")]
    Embed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn embed(message: impl Into<String>) -> Self {
        Self::Embed(message.into())
    }
}

/// Result type for collaborator calls.
pub type SourceResult<T> = Result<T, SourceError>;

/// A decodable video.
///
/// `frame_at` must tolerate exact-timestamp requests (zero tolerance
/// window) and return the nearest decodable frame.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Total duration in seconds.
    async fn duration_secs(&self) -> SourceResult<f64>;

    /// Decode the frame nearest to `timestamp_secs`.
    async fn frame_at(&self, timestamp_secs: f64) -> SourceResult<RgbImage>;
}

/// An opaque per-frame feature value produced by a [`FrameEmbedder`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeature(pub Vec<f32>);

/// Computes per-frame features and a distance between them.
///
/// `distance` is symmetric, non-negative, and zero for identical input.
#[async_trait]
pub trait FrameEmbedder: Send + Sync {
    /// Compute the feature vector for one frame.
    async fn feature(&self, frame: &RgbImage) -> SourceResult<FrameFeature>;

    /// Distance between two features.
    fn distance(&self, a: &FrameFeature, b: &FrameFeature) -> f64;
}

/// One message of a chat conversation handed to the tokenizer's template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Template rendering and text/token conversion.
///
/// The pipeline only requires that decode -> splice -> encode round-trips
/// the non-placeholder text unchanged.
pub trait Tokenizer: Send + Sync {
    /// Render a conversation into template text containing a single media
    /// placeholder per attached medium.
    fn render_template(&self, messages: &[ChatMessage]) -> String;

    /// Encode text into token ids.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode token ids back into text.
    fn decode(&self, tokens: &[u32]) -> String;
}

/// Euclidean distance between two feature vectors, truncated to the shorter
/// length. A reasonable default for embedders without a custom metric.
pub fn euclidean_distance(a: &FrameFeature, b: &FrameFeature) -> f64 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
