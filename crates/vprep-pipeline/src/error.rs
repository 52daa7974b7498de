//! Error types for preprocessing operations.

use thiserror::Error;

use crate::sources::SourceError;

/// Result type for preprocessing operations.
pub type PrepResult<T> = Result<T, PrepError>;

/// Errors that can occur while preparing model inputs.
///
/// Out-of-range frame numbers and timestamps are not errors; they are
/// filtered and logged during resolution. Every variant here is surfaced to
/// the caller, and none is retried by this crate - failures are
/// deterministic given identical inputs.
#[derive(Debug, Error)]
pub enum PrepError {
    /// A selection filtered down to zero frames on a path that requires at
    /// least one.
    #[error("Frame selection resolved to zero frames: {reason}")]
    InvalidSelection { reason: String },

    /// Source image has zero width or height.
    #[error("Invalid image: {width}x{height}")]
    InvalidImage { width: u32, height: u32 },

    /// Placeholder unit count disagrees with the prepared pixel batch.
    /// Internal invariant violation; callers should treat this as a bug.
    #[error("Media count mismatch: {units} prompt units vs {batches} pixel batches")]
    MediaCountMismatch { units: usize, batches: usize },

    /// Rendered chat text lacks the marker the expanded block splices into.
    /// Internal invariant violation; callers should treat this as a bug.
    #[error("Splice point {marker:?} not found in rendered prompt")]
    MissingSplicePoint { marker: String },

    /// Cooperative cancellation observed between per-frame steps.
    #[error("Operation cancelled")]
    Cancelled,

    /// A collaborator (video source, embedder) failed. Wrapped and
    /// propagated; retries belong to the collaborator or the caller.
    #[error("Upstream decode failure: {0}")]
    UpstreamDecode(#[from] SourceError),
}

impl PrepError {
    /// Create an empty-selection error.
    pub fn invalid_selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            reason: reason.into(),
        }
    }

    /// Create a splice-point error.
    pub fn missing_splice_point(marker: impl Into<String>) -> Self {
        Self::MissingSplicePoint {
            marker: marker.into(),
        }
    }
}

/// Check the hard invariant that prompt units and pixel batches agree.
pub fn ensure_media_count(units: usize, batches: usize) -> PrepResult<()> {
    if units == batches {
        Ok(())
    } else {
        Err(PrepError::MediaCountMismatch { units, batches })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_count_check() {
        assert!(ensure_media_count(5, 5).is_ok());
        let err = ensure_media_count(5, 4).unwrap_err();
        assert!(matches!(
            err,
            PrepError::MediaCountMismatch {
                units: 5,
                batches: 4
            }
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = PrepError::invalid_selection("all 3 frame numbers out of range");
        assert!(err.to_string().contains("zero frames"));
        let err = PrepError::missing_splice_point("<image>");
        assert!(err.to_string().contains("<image>"));
    }
}
