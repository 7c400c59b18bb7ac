// Pipeline orchestrator: probe -> select -> fetch -> transcode -> package

use std::path::PathBuf;
use std::sync::Arc;

use super::errors::PipelineError;
use super::fetcher;
use super::format_selector::FormatSelector;
use super::models::{MediaMetadata, OutputProfile, SelectedFormat};
use super::packager::PackagedAudio;
use super::probe::{probe_metadata, probe_streams};
use super::traits::{AudioTranscoder, MediaExtractor};
use super::transcoder;
use super::workspace::{Workspace, WorkspaceManager};

#[derive(Clone)]
pub struct Pipeline {
    extractor: Arc<dyn MediaExtractor>,
    transcoder: Arc<dyn AudioTranscoder>,
    workspaces: WorkspaceManager,
    profile: OutputProfile,
}

impl Pipeline {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        transcoder: Arc<dyn AudioTranscoder>,
        workspaces: WorkspaceManager,
    ) -> Self {
        Self {
            extractor,
            transcoder,
            workspaces,
            profile: OutputProfile::MP3,
        }
    }

    /// Metadata only: no format filter, never opens a workspace, never downloads
    pub async fn metadata(&self, url: &str) -> Result<MediaMetadata, PipelineError> {
        probe_metadata(self.extractor.as_ref(), url).await
    }

    /// Full run. On success the returned audio owns the workspace; on failure
    /// the workspace (if one was opened) is already gone.
    pub async fn run(&self, url: &str) -> Result<PackagedAudio, PipelineError> {
        let (metadata, streams) = probe_streams(self.extractor.as_ref(), url).await?;
        let format = FormatSelector::select(&streams)?;

        let mut workspace = self.workspaces.open().map_err(|e| {
            tracing::error!(error = %e, root = %self.workspaces.root().display(), "failed to create workspace");
            PipelineError::Unhandled(e.to_string())
        })?;

        let audio_path = match self.fetch_and_transcode(url, &format, &workspace).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "cleaning up workspace after failure");
                workspace.fail();
                return Err(e);
            }
        };

        match PackagedAudio::open(&audio_path, &metadata, self.profile, workspace).await {
            Ok(packaged) => Ok(packaged),
            Err((e, mut workspace)) => {
                tracing::warn!(error = %e, "cleaning up workspace after failure");
                workspace.fail();
                Err(e)
            }
        }
    }

    async fn fetch_and_transcode(
        &self,
        url: &str,
        format: &SelectedFormat,
        workspace: &Workspace,
    ) -> Result<PathBuf, PipelineError> {
        let source = fetcher::fetch(self.extractor.as_ref(), url, format, workspace.path()).await?;
        transcoder::transcode(self.transcoder.as_ref(), &source, &format.container, self.profile).await
    }
}
