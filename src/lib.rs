pub mod api;
pub mod config;
pub mod downloader;

use std::io;
use std::sync::Arc;
use thiserror::Error;

use api::{create_router, ApiState};
use config::{ConfigError, ServiceConfig};
use downloader::backends::{FfmpegTranscoder, YtDlpExtractor};
use downloader::{Pipeline, WorkspaceManager};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind {address}: {source}")]
    Bind { address: String, source: io::Error },
    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

/// Wire the real yt-dlp and ffmpeg backends into a pipeline
pub fn build_pipeline(config: &ServiceConfig) -> Pipeline {
    let extractor = YtDlpExtractor::new(config.ytdlp_path.clone())
        .with_socket_timeout(config.socket_timeout_seconds);
    let transcoder = FfmpegTranscoder::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone());

    Pipeline::new(
        Arc::new(extractor),
        Arc::new(transcoder),
        WorkspaceManager::new(config.workspace_root.clone()),
    )
}

/// Load configuration from the environment and serve until ctrl-c
pub async fn run() -> Result<(), StartupError> {
    let config = ServiceConfig::from_env()?;
    serve(config).await
}

pub async fn serve(config: ServiceConfig) -> Result<(), StartupError> {
    tracing::info!(
        address = %config.address(),
        workspace_root = %config.workspace_root.display(),
        ytdlp = %config.ytdlp_path,
        ffmpeg = %config.ffmpeg_path,
        ffprobe = %config.ffprobe_path,
        "starting music downloader"
    );

    let app = create_router(ApiState::new(build_pipeline(&config)));

    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(address = %address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
