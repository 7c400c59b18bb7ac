// Stream catalog probe

use super::errors::PipelineError;
use super::models::{MediaMetadata, ProbeReport, StreamDescriptor};
use super::traits::MediaExtractor;

/// Format filter handed to the extractor while probing for a download
pub const PROBE_FORMAT_FILTER: &str = "ba";

/// No filter: metadata must not depend on which formats exist
pub const METADATA_FORMAT_FILTER: &str = "";

/// Fetch metadata and the stream catalog for `url` without downloading.
///
/// Streams come back stable-sorted by quality tag so that selection over
/// them is deterministic.
pub async fn probe_streams(
    extractor: &dyn MediaExtractor,
    url: &str,
) -> Result<(MediaMetadata, Vec<StreamDescriptor>), PipelineError> {
    let report = probe_with_filter(extractor, url, PROBE_FORMAT_FILTER).await?;

    let mut streams = report.streams;
    sort_by_quality(&mut streams);

    tracing::debug!(url, streams = streams.len(), "info extraction successful");
    Ok((report.metadata, streams))
}

/// Metadata only, probed without any format filter
pub async fn probe_metadata(
    extractor: &dyn MediaExtractor,
    url: &str,
) -> Result<MediaMetadata, PipelineError> {
    let report = probe_with_filter(extractor, url, METADATA_FORMAT_FILTER).await?;
    Ok(report.metadata)
}

async fn probe_with_filter(
    extractor: &dyn MediaExtractor,
    url: &str,
    format_filter: &str,
) -> Result<ProbeReport, PipelineError> {
    tracing::info!(url, format_filter, extractor = extractor.name(), "extracting info");

    extractor.probe(url, format_filter).await.map_err(|e| {
        tracing::error!(url, error = %e, "info extraction failed");
        PipelineError::ExtractionFailure(e.to_string())
    })
}

pub fn sort_by_quality(streams: &mut [StreamDescriptor]) {
    // `sort_by` is stable: ties keep the extractor's order
    streams.sort_by(|a, b| a.quality.cmp(&b.quality));
}
