//! Placeholder-token prompt assembly.
//!
//! Builds the media placeholder text spliced into rendered chat prompts.
//! Every visual unit expands to exactly `seq_len` placeholder tokens, so
//! the unit count here must match the pixel-batch count from the tiler -
//! callers check that invariant with
//! [`ensure_media_count`](crate::error::ensure_media_count) before
//! tokenization.
//!
//! Splicing is two-phase by design: the chat template is rendered by an
//! external tokenizer with a single placeholder, and the fully expanded
//! block replaces it once tile/frame counts are known.

use vprep_models::PromptMarkers;

use crate::error::{PrepError, PrepResult};

/// Number of prompt units `image_prompt_text` emits for a grid.
pub fn image_unit_count(rows: u32, cols: u32) -> usize {
    (rows * cols) as usize + 1
}

/// Build the placeholder text for a tiled image.
///
/// Emits one labeled unit per grid tile, row by row top-to-bottom with a
/// newline after each row, then one trailing global-tile unit. Unit count
/// is `rows * cols + 1`.
pub fn image_prompt_text(rows: u32, cols: u32, seq_len: usize, markers: &PromptMarkers) -> String {
    let placeholders = markers.placeholder_token.repeat(seq_len);

    let mut text = String::new();
    for row in 0..rows {
        for col in 0..cols {
            text.push_str(&markers.fake_token);
            text.push_str(&format!("<row_{}_col_{}>", row + 1, col + 1));
            text.push_str(&placeholders);
        }
        text.push('\n');
    }

    text.push('\n');
    text.push_str(&markers.fake_token);
    text.push_str(&markers.global_token);
    text.push_str(&placeholders);
    text.push_str(&markers.fake_token);

    text
}

/// Build the placeholder text for a sampled video.
///
/// `timestamps` are already formatted prompt labels (`H:MM:SS`), one per
/// sampled frame; unit count equals `timestamps.len()`.
pub fn video_prompt_text(
    timestamps: &[String],
    total_duration: &str,
    seq_len: usize,
    markers: &PromptMarkers,
) -> String {
    let placeholders = markers.placeholder_token.repeat(seq_len);

    let mut text = format!(
        "You are provided the following series of {} frames from a {} [H:MM:SS] video.\n",
        timestamps.len(),
        total_duration
    );
    for timestamp in timestamps {
        text.push_str(&format!("\nFrame from {}:", timestamp));
        text.push_str(&markers.fake_token);
        text.push_str(&markers.global_token);
        text.push_str(&placeholders);
        text.push_str(&markers.fake_token);
    }
    text.push_str("\n\n");

    text
}

/// Replace the first occurrence of `placeholder` in rendered chat text with
/// the expanded block.
///
/// Fails with [`PrepError::MissingSplicePoint`] when the placeholder is
/// absent.
pub fn splice(rendered: &str, placeholder: &str, replacement: &str) -> PrepResult<String> {
    match rendered.split_once(placeholder) {
        Some((before, after)) => Ok(format!("{before}{replacement}{after}")),
        None => Err(PrepError::missing_splice_point(placeholder)),
    }
}

/// Insert the expanded block immediately after the first occurrence of
/// `marker` in rendered chat text.
///
/// The video path uses this with the role-prefix marker, since the rendered
/// template carries no per-frame placeholder.
pub fn splice_after(rendered: &str, marker: &str, block: &str) -> PrepResult<String> {
    match rendered.split_once(marker) {
        Some((before, after)) => Ok(format!("{before}{marker}{block}{after}")),
        None => Err(PrepError::missing_splice_point(marker)),
    }
}
