// Collaborator traits the pipeline drives

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::errors::ToolError;
use super::models::{DecodedAudio, DownloadProgress, DownloadRequest, OutputProfile, ProbeReport};

/// Metadata and stream extraction engine (yt-dlp)
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// List metadata and every available stream without downloading media bytes
    async fn probe(&self, url: &str, format_filter: &str) -> Result<ProbeReport, ToolError>;

    /// Download one format, reporting progress and the final path to `observer`.
    ///
    /// Returns the tool's exit code; `Err` only when the tool could not run at all.
    async fn download(
        &self,
        request: &DownloadRequest,
        observer: &dyn DownloadObserver,
    ) -> Result<i32, ToolError>;
}

/// Receives download signals from a `MediaExtractor`
pub trait DownloadObserver: Send + Sync {
    fn on_progress(&self, _progress: &DownloadProgress) {}

    /// The file is fully written at `path`
    fn on_complete(&self, path: PathBuf);
}

/// Audio decode/encode engine (ffmpeg)
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Open `path` as `container` and confirm it carries audio
    async fn decode(&self, path: &Path, container: &str) -> Result<DecodedAudio, ToolError>;

    /// Encode `audio` into `output` using `profile`
    async fn encode(
        &self,
        audio: &DecodedAudio,
        output: &Path,
        profile: OutputProfile,
    ) -> Result<(), ToolError>;
}
