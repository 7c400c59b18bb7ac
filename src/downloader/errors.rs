// Error types for the audio pipeline and its external tools

use axum::http::StatusCode;
use thiserror::Error;

/// Failure of an external tool (yt-dlp, ffmpeg, ffprobe)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    /// Binary missing from the system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// The platform refused the request (429, bot detection, 403)
    #[error("Blocked by upstream: {0}")]
    Blocked(String),

    /// Video removed, private, or otherwise unreachable
    #[error("Video unavailable: {0}")]
    Unavailable(String),

    /// Tool output could not be understood
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Process could not be started or awaited
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Tool ran and reported an error we have no better bucket for
    #[error("{0}")]
    Failed(String),
}

// Classify raw stderr text from a tool
impl From<String> for ToolError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("429")
            || lower.contains("403")
            || lower.contains("sign in to confirm")
            || lower.contains("bot")
        {
            return Self::Blocked(s);
        }

        if lower.contains("command not found") || lower.contains("no such file or directory") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("video unavailable")
            || lower.contains("private video")
            || lower.contains("has been removed")
            || lower.contains("unsupported url")
        {
            return Self::Unavailable(s);
        }

        if lower.contains("invalid json") || lower.contains("parse") {
            return Self::ParseError(s);
        }

        Self::Failed(s)
    }
}

impl From<&str> for ToolError {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

/// Typed outcome of every pipeline stage.
///
/// `Display` is the exact text placed in the `detail` field of the HTTP
/// error body, so variants carrying upstream text include it verbatim.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("URL is invalid")]
    InvalidRequest,

    #[error("Failed to extract video info: {0}")]
    ExtractionFailure(String),

    #[error("No low quality webm audio format found for this video")]
    FormatNotFound,

    #[error("Failed to download audio: {0}")]
    FetchIncomplete(String),

    #[error("Failed to convert audio to MP3: {0}")]
    TranscodeFailure(String),

    #[error("An internal server error occurred: {0}")]
    Unhandled(String),
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::FormatNotFound => StatusCode::NOT_FOUND,
            Self::ExtractionFailure(_)
            | Self::FetchIncomplete(_)
            | Self::TranscodeFailure(_)
            | Self::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
