// FormatSelector - picks the one stream the pipeline downloads

use super::errors::PipelineError;
use super::models::{SelectedFormat, StreamDescriptor};

/// Container the downloaded audio must arrive in
pub const TARGET_CONTAINER: &str = "webm";

/// Quality tag of the stream we want
pub const TARGET_QUALITY: &str = "low";

pub struct FormatSelector;

impl FormatSelector {
    /// Audio-only, webm, tagged "low"
    pub fn matches(format: &StreamDescriptor) -> bool {
        format.is_audio_only()
            && format.container == TARGET_CONTAINER
            && format.quality == TARGET_QUALITY
    }

    /// First match in the given (already sorted) order
    pub fn select(streams: &[StreamDescriptor]) -> Result<SelectedFormat, PipelineError> {
        match streams.iter().find(|f| Self::matches(f)) {
            Some(format) => {
                tracing::info!(format_id = %format.format_id, label = %format.label, "found format");
                Ok(SelectedFormat::from(format))
            }
            None => {
                tracing::info!(candidates = streams.len(), "no low quality webm audio format found");
                Err(PipelineError::FormatNotFound)
            }
        }
    }
}
