// Transcoder stage - fetched source to MP3 in the same workspace

use std::path::{Path, PathBuf};

use super::errors::PipelineError;
use super::models::OutputProfile;
use super::traits::AudioTranscoder;

/// Where the output lands: same directory and stem, new extension
pub fn output_path(source: &Path, profile: OutputProfile) -> PathBuf {
    source.with_extension(profile.format)
}

pub async fn transcode(
    transcoder: &dyn AudioTranscoder,
    source: &Path,
    container: &str,
    profile: OutputProfile,
) -> Result<PathBuf, PipelineError> {
    let output = output_path(source, profile);
    tracing::info!(
        source = %source.display(),
        output = %output.display(),
        backend = transcoder.name(),
        "converting audio"
    );

    let audio = transcoder.decode(source, container).await.map_err(|e| {
        tracing::error!(error = %e, "decode failed");
        PipelineError::TranscodeFailure(e.to_string())
    })?;

    transcoder
        .encode(&audio, &output, profile)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "encode failed");
            PipelineError::TranscodeFailure(e.to_string())
        })?;

    // Encoder success does not guarantee an output file
    if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
        tracing::error!(output = %output.display(), "output missing after conversion");
        return Err(PipelineError::TranscodeFailure(format!(
            "{} file not found after conversion process",
            profile.format.to_uppercase()
        )));
    }

    tracing::info!(output = %output.display(), "conversion successful");
    Ok(output)
}
