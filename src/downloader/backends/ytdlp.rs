// yt-dlp backend - probes and downloads through the native `yt-dlp` binary

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;

use crate::downloader::errors::ToolError;
use crate::downloader::models::{DownloadRequest, ProbeReport, RawInfo};
use crate::downloader::traits::{DownloadObserver, MediaExtractor};
use crate::downloader::utils::{
    collect_stderr, parse_ytdlp_line, run_output, spawn_error, stderr_summary,
    YtDlpLine, COMPLETE_MARKER,
};

/// CLI-based extractor using the yt-dlp binary
pub struct YtDlpExtractor {
    ytdlp_path: String,
    socket_timeout_seconds: u32,
}

impl YtDlpExtractor {
    pub fn new(ytdlp_path: impl Into<String>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            socket_timeout_seconds: 30,
        }
    }

    pub fn with_socket_timeout(mut self, seconds: u32) -> Self {
        self.socket_timeout_seconds = seconds;
        self
    }

    fn common_args(&self) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--no-update".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout_seconds.to_string(),
        ]
    }

    fn build_probe_args(&self, url: &str, format_filter: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--simulate".to_string(),
            // Probing must not leave anything on disk
            "--no-cache-dir".to_string(),
        ];
        // Empty filter: let yt-dlp report the item whatever formats it has
        if !format_filter.is_empty() {
            args.push("-f".to_string());
            args.push(format_filter.to_string());
        }
        args.extend(self.common_args());
        args.push(url.to_string());
        args
    }

    fn build_download_args(&self, request: &DownloadRequest) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            request.format_id.clone(),
            "-o".to_string(),
            request.output_template.to_string_lossy().to_string(),
            "--newline".to_string(),
            // We own transcoding: no merge, no fixup, no side files
            "--fixup".to_string(),
            "never".to_string(),
            "--no-mtime".to_string(),
            "--no-write-info-json".to_string(),
            "--no-write-description".to_string(),
            "--no-write-thumbnail".to_string(),
            "--no-cache-dir".to_string(),
            // `--print` implies simulate and quiet; undo both
            "--print".to_string(),
            format!("after_move:{}%(filepath)s", COMPLETE_MARKER),
            "--no-simulate".to_string(),
            "--progress".to_string(),
        ];
        args.extend(self.common_args());
        args.push(request.url.clone());
        args
    }

    fn parse_probe(stdout: &[u8], url: &str) -> Result<ProbeReport, ToolError> {
        let raw: RawInfo = serde_json::from_slice(stdout)
            .map_err(|e| ToolError::ParseError(format!("Invalid JSON from yt-dlp: {}", e)))?;
        Ok(raw.into_report(url))
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str, format_filter: &str) -> Result<ProbeReport, ToolError> {
        let args = self.build_probe_args(url, format_filter);
        tracing::debug!(program = %self.ytdlp_path, args = %args.join(" "), "probing");

        let output = run_output(&self.ytdlp_path, args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::from(stderr_summary(&stderr, output.status.code())));
        }

        Self::parse_probe(&output.stdout, url)
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        observer: &dyn DownloadObserver,
    ) -> Result<i32, ToolError> {
        let args = self.build_download_args(request);
        tracing::debug!(program = %self.ytdlp_path, args = %args.join(" "), "starting download");

        let mut child = TokioCommand::new(&self.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.ytdlp_path, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::ExecutionError("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ToolError::ExecutionError("Failed to capture stderr".to_string()))?;
        let stderr_task = tokio::spawn(collect_stderr(stderr));

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ToolError::ExecutionError(format!("Failed to read yt-dlp output: {}", e)))?
        {
            match parse_ytdlp_line(&line) {
                Some(YtDlpLine::Progress(progress)) => observer.on_progress(&progress),
                Some(YtDlpLine::Destination(path)) => {
                    tracing::debug!(path = %path.display(), "yt-dlp destination");
                }
                Some(YtDlpLine::Complete(path)) => observer.on_complete(path),
                None => {}
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ToolError::ExecutionError(format!("Process error: {}", e)))?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        let code = status.code().unwrap_or(-1);
        if code != 0 {
            tracing::warn!(
                code,
                stderr = %stderr_summary(&stderr_output, status.code()),
                "yt-dlp download exited with failure"
            );
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_probe_args_simulate_only() {
        let extractor = YtDlpExtractor::new("yt-dlp");
        let args = extractor.build_probe_args("https://youtu.be/abc", "ba");

        assert!(args.contains(&"--simulate".to_string()));
        assert!(args.contains(&"--dump-single-json".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "ba"));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));
    }

    #[test]
    fn test_info_args_without_filter_omit_format_flag() {
        let extractor = YtDlpExtractor::new("yt-dlp");
        let args = extractor.build_probe_args("https://youtu.be/abc", "");

        assert!(!args.iter().any(|a| a == "-f"));
        assert!(args.contains(&"--simulate".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));
    }

    #[test]
    fn test_download_args_restrict_format_and_disable_postprocessing() {
        let extractor = YtDlpExtractor::new("yt-dlp").with_socket_timeout(15);
        let request = DownloadRequest {
            url: "https://youtu.be/abc".to_string(),
            format_id: "249".to_string(),
            output_template: PathBuf::from("/tmp/ws/%(id)s.%(ext)s"),
        };
        let args = extractor.build_download_args(&request);

        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "249"));
        assert!(args.windows(2).any(|w| w[0] == "-o" && w[1] == "/tmp/ws/%(id)s.%(ext)s"));
        assert!(args.windows(2).any(|w| w[0] == "--fixup" && w[1] == "never"));
        assert!(args.windows(2).any(|w| w[0] == "--socket-timeout" && w[1] == "15"));
        assert!(!args.iter().any(|a| a == "-x" || a == "--merge-output-format"));
        assert!(args
            .iter()
            .any(|a| a.starts_with("after_move:") && a.contains(COMPLETE_MARKER)));
    }

    #[test]
    fn test_parse_probe_rejects_garbage() {
        let err = YtDlpExtractor::parse_probe(b"not json", "u").unwrap_err();
        assert!(matches!(err, ToolError::ParseError(_)));
    }
}
