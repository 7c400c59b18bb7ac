// Response packager - names the output and ties workspace cleanup to the body stream

use axum::body::Bytes;
use futures_util::stream::{self, Stream};
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::errors::PipelineError;
use super::models::{MediaMetadata, OutputProfile};
use super::workspace::Workspace;

/// Base name used when nothing survives sanitizing
pub const FALLBACK_BASE_NAME: &str = "audio";

const CHUNK_SIZE: usize = 64 * 1024;

/// Keep alphanumerics, spaces, dots and underscores; path separators become a
/// single space; trailing spaces, dots and underscores are trimmed.
pub fn sanitize_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() || matches!(c, ' ' | '.' | '_') {
            out.push(c);
        } else if matches!(c, '/' | '\\') && !out.ends_with(' ') {
            out.push(' ');
        }
    }
    out.trim_end_matches([' ', '.', '_']).to_string()
}

/// Sanitized title (or the fallback) plus the profile's extension
pub fn response_filename(title: &str, profile: OutputProfile) -> String {
    let base = sanitize_filename(title);
    let base = if base.is_empty() { FALLBACK_BASE_NAME } else { base.as_str() };
    format!("{}.{}", base, profile.format)
}

/// `Content-Disposition` value; non-ASCII names use RFC 5987 encoding
pub fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let mut encoded = String::new();
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-' | b'~') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    format!("attachment; filename*=utf-8''{}", encoded)
}

/// A finished MP3 ready to stream, owning the workspace it lives in
#[derive(Debug)]
pub struct PackagedAudio {
    pub filename: String,
    pub mime_type: &'static str,
    pub content_length: u64,
    file: File,
    workspace: Workspace,
}

impl PackagedAudio {
    /// Open `audio_path` for streaming. On error the workspace is handed back
    /// untouched so the caller can fail it.
    pub async fn open(
        audio_path: &Path,
        metadata: &MediaMetadata,
        profile: OutputProfile,
        mut workspace: Workspace,
    ) -> Result<Self, (PipelineError, Workspace)> {
        let file = match File::open(audio_path).await {
            Ok(file) => file,
            Err(e) => return Err((PipelineError::Unhandled(e.to_string()), workspace)),
        };
        let content_length = match file.metadata().await {
            Ok(m) => m.len(),
            Err(e) => return Err((PipelineError::Unhandled(e.to_string()), workspace)),
        };

        let filename = response_filename(&metadata.title, profile);
        workspace.mark_success();
        tracing::info!(
            path = %audio_path.display(),
            filename = %filename,
            mime = profile.mime_type,
            "returning file"
        );

        Ok(Self {
            filename,
            mime_type: profile.mime_type,
            content_length,
            file,
            workspace,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Stream the file in chunks. The workspace is disposed off the runtime
    /// threads at end of file or on a read error, and by `Drop` when the
    /// stream is dropped early (client went away).
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        let Self { file, workspace, .. } = self;

        stream::unfold(Some((file, workspace)), |state| async move {
            let (mut file, mut workspace) = state?;
            let mut buf = vec![0u8; CHUNK_SIZE];
            match file.read(&mut buf).await {
                Ok(0) => {
                    drop(file);
                    tracing::debug!("response body fully sent");
                    workspace.dispose_async().await;
                    None
                }
                Ok(n) => {
                    buf.truncate(n);
                    Some((Ok(Bytes::from(buf)), Some((file, workspace))))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed reading response body");
                    drop(file);
                    workspace.dispose_async().await;
                    Some((Err(e), None))
                }
            }
        })
    }
}
