// Fetcher - downloads the selected stream into a workspace

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::errors::PipelineError;
use super::models::{DownloadProgress, DownloadRequest, SelectedFormat};
use super::traits::{DownloadObserver, MediaExtractor};

/// Single-assignment cell the extractor's completion signal writes into
#[derive(Debug, Default)]
pub struct CompletionSlot {
    path: OnceLock<PathBuf>,
}

impl CompletionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Path> {
        self.path.get().map(PathBuf::as_path)
    }
}

impl DownloadObserver for CompletionSlot {
    fn on_progress(&self, progress: &DownloadProgress) {
        tracing::trace!(percent = progress.percent, status = %progress.status, "download progress");
    }

    fn on_complete(&self, path: PathBuf) {
        tracing::debug!(path = %path.display(), "download finished");
        if let Err(extra) = self.path.set(path) {
            tracing::debug!(path = %extra.display(), "ignoring repeated completion signal");
        }
    }
}

/// yt-dlp output template inside `dir`: stream id as base name, container as extension
pub fn output_template(dir: &Path) -> PathBuf {
    dir.join("%(id)s.%(ext)s")
}

/// Download `format` of `url` into `workspace_dir` and return the written file
pub async fn fetch(
    extractor: &dyn MediaExtractor,
    url: &str,
    format: &SelectedFormat,
    workspace_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let request = DownloadRequest {
        url: url.to_string(),
        format_id: format.format_id.clone(),
        output_template: output_template(workspace_dir),
    };
    let slot = CompletionSlot::new();

    tracing::info!(format_id = %format.format_id, dir = %workspace_dir.display(), "starting download");
    let code = extractor
        .download(&request, &slot)
        .await
        .map_err(|e| PipelineError::FetchIncomplete(e.to_string()))?;

    if code != 0 {
        tracing::error!(code, "yt-dlp download failed");
        return Err(PipelineError::FetchIncomplete(format!(
            "yt-dlp download failed with error code {}",
            code
        )));
    }

    let path = match slot.get().filter(|p| p.exists()) {
        Some(path) => path.to_path_buf(),
        None => {
            tracing::warn!(
                signalled = ?slot.get(),
                "completion path missing, scanning workspace"
            );
            recover_from_dir(workspace_dir, &format.container)?
        }
    };

    let size = tokio::fs::metadata(&path)
        .await
        .map(|m| m.len())
        .map_err(|e| PipelineError::FetchIncomplete(format!("{}: {}", path.display(), e)))?;
    if size == 0 {
        return Err(PipelineError::FetchIncomplete(format!(
            "downloaded file {} is empty",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), size, "download complete");
    Ok(path)
}

/// First file in `dir` (by name) with extension `ext`
pub fn recover_from_dir(dir: &Path, ext: &str) -> Result<PathBuf, PipelineError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| PipelineError::FetchIncomplete(format!("{}: {}", dir.display(), e)))?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == ext))
        .collect();
    candidates.sort();

    if candidates.len() > 1 {
        tracing::warn!(count = candidates.len(), "several candidate files, using the first");
    }

    match candidates.into_iter().next() {
        Some(path) => {
            tracing::info!(path = %path.display(), "fallback: found file in workspace");
            Ok(path)
        }
        None => {
            tracing::error!(dir = %dir.display(), ext, "fallback failed: no matching file");
            Err(PipelineError::FetchIncomplete(format!(
                "Downloaded {} file not found after process completion",
                ext
            )))
        }
    }
}
