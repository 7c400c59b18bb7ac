//! HTTP surface: `POST /youtube` streams MP3, `GET /youtube` returns metadata.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::downloader::packager::content_disposition;
use crate::downloader::{MediaMetadata, PackagedAudio, Pipeline, PipelineError};

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pipeline: Pipeline,
}

impl ApiState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

/// Creates the service router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/youtube", post(download_audio).get(video_info))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct UrlRequest {
    #[serde(default)]
    url: Option<String>,
}

/// Pull a non-empty `url` out of a JSON body
fn parse_url(body: &[u8]) -> Result<String, PipelineError> {
    serde_json::from_slice::<UrlRequest>(body)
        .ok()
        .and_then(|req| req.url)
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or(PipelineError::InvalidRequest)
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl IntoResponse for PackagedAudio {
    fn into_response(self) -> Response {
        let disposition = content_disposition(&self.filename);
        let mime_type = self.mime_type;
        let content_length = self.content_length;

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime_type)
            .header(header::CONTENT_LENGTH, content_length)
            .header(header::CONTENT_DISPOSITION, disposition)
            .body(Body::from_stream(self.into_stream()));

        match response {
            Ok(response) => response,
            Err(e) => PipelineError::Unhandled(e.to_string()).into_response(),
        }
    }
}

/// Download, transcode and stream the audio of `url`.
///
/// The pipeline runs on its own task so a panic in a collaborator surfaces
/// as a 500 instead of a dropped connection.
async fn download_audio(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<PackagedAudio, PipelineError> {
    let url = parse_url(&body)?;
    tracing::info!(url = %url, "audio request");

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move { pipeline.run(&url).await })
        .await
        .unwrap_or_else(|e| Err(PipelineError::Unhandled(e.to_string())))
}

/// Metadata for `url` without downloading anything.
async fn video_info(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<MediaMetadata>, PipelineError> {
    let url = parse_url(&body)?;
    tracing::info!(url = %url, "info request");

    let metadata = state.pipeline.metadata(&url).await?;
    Ok(Json(metadata))
}
