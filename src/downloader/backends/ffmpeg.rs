// ffmpeg backend - decodes with ffprobe, encodes with ffmpeg

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

use crate::downloader::errors::ToolError;
use crate::downloader::models::{DecodedAudio, OutputProfile};
use crate::downloader::traits::AudioTranscoder;
use crate::downloader::utils::{run_output, stderr_summary};

pub struct FfmpegTranscoder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    fn build_probe_args(path: &Path, container: &str) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-f".to_string(),
            container.to_string(),
            "-select_streams".to_string(),
            "a:0".to_string(),
            "-show_entries".to_string(),
            "stream=codec_name,sample_rate,channels".to_string(),
            "-of".to_string(),
            "json".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    // No `-ar`: the source sample rate is kept as-is
    fn build_encode_args(audio: &DecodedAudio, output: &Path, profile: OutputProfile) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-nostdin".to_string(),
            "-y".to_string(),
            "-f".to_string(),
            audio.container.clone(),
            "-i".to_string(),
            audio.path.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-map".to_string(),
            "0:a:0".to_string(),
            "-c:a".to_string(),
            profile.codec.to_string(),
            "-sample_fmt".to_string(),
            profile.sample_format().to_string(),
            "-f".to_string(),
            profile.format.to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    fn parse_probe(stdout: &[u8], path: &Path, container: &str) -> Result<DecodedAudio, ToolError> {
        let parsed: ProbeOutput = serde_json::from_slice(stdout)
            .map_err(|e| ToolError::ParseError(format!("Invalid JSON from ffprobe: {}", e)))?;

        let stream = parsed.streams.into_iter().next().ok_or_else(|| {
            ToolError::Failed(format!("{} has no audio stream", path.display()))
        })?;

        Ok(DecodedAudio {
            path: path.to_path_buf(),
            container: container.to_string(),
            codec: stream.codec_name.unwrap_or_default(),
            sample_rate: stream.sample_rate.and_then(|r| r.parse().ok()),
            channels: stream.channels,
        })
    }
}

#[async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn decode(&self, path: &Path, container: &str) -> Result<DecodedAudio, ToolError> {
        let output = run_output(&self.ffprobe_path, Self::build_probe_args(path, container)).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::Failed(stderr_summary(&stderr, output.status.code())));
        }

        Self::parse_probe(&output.stdout, path, container)
    }

    async fn encode(
        &self,
        audio: &DecodedAudio,
        output: &Path,
        profile: OutputProfile,
    ) -> Result<(), ToolError> {
        let args = Self::build_encode_args(audio, output, profile);
        tracing::debug!(program = %self.ffmpeg_path, args = %args.join(" "), "encoding");

        let result = run_output(&self.ffmpeg_path, args).await?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ToolError::Failed(stderr_summary(&stderr, result.status.code())));
        }
        Ok(())
    }
}
