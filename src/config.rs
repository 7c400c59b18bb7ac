// Process startup configuration

use std::path::PathBuf;
use thiserror::Error;

use crate::downloader::utils::find_tool;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings read once at startup
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Directory under which per-request workspaces are created
    pub workspace_root: PathBuf,
    pub ytdlp_path: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Passed through to yt-dlp; the service itself imposes no timeout
    pub socket_timeout_seconds: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workspace_root: std::env::temp_dir(),
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            socket_timeout_seconds: 30,
        }
    }
}

impl ServiceConfig {
    /// Read from the process environment, discovering tools that are not set
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                name: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.port,
        };

        let socket_timeout_seconds = match var("YTDLP_SOCKET_TIMEOUT") {
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::InvalidValue {
                name: "YTDLP_SOCKET_TIMEOUT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.socket_timeout_seconds,
        };

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port,
            workspace_root: var("WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_root),
            ytdlp_path: var("YTDLP_BIN").unwrap_or_else(|| find_tool("yt-dlp")),
            ffmpeg_path: var("FFMPEG_BIN").unwrap_or_else(|| find_tool("ffmpeg")),
            ffprobe_path: var("FFPROBE_BIN").unwrap_or_else(|| find_tool("ffprobe")),
            socket_timeout_seconds,
        })
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    pub fn with_socket_timeout(mut self, seconds: u32) -> Self {
        self.socket_timeout_seconds = seconds;
        self
    }

    /// `host:port`, for binding and logging
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
