// Helper functions shared by the tool backends

use regex::Regex;
use std::path::PathBuf;
use std::process::{Command as StdCommand, Output, Stdio};
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;

use super::errors::ToolError;
use super::models::DownloadProgress;

/// Prefix of the line yt-dlp prints once a file reaches its final path.
/// Passed to `--print after_move:` so it can be told apart from regular output.
pub const COMPLETE_MARKER: &str = "[complete] ";

/// Run a command to completion, collecting stdout and stderr
pub async fn run_output(program: &str, args: Vec<String>) -> Result<Output, ToolError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| ToolError::ExecutionError(format!("Failed to capture stdout from {}", program)))?;
    let stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| ToolError::ExecutionError(format!("Failed to capture stderr from {}", program)))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(collect_stderr(stderr_pipe));

    let status = child
        .wait()
        .await
        .map_err(|e| ToolError::ExecutionError(format!("Failed to wait for {}: {}", program, e)))?;
    let stdout = stdout_task
        .await
        .map_err(|e| ToolError::ExecutionError(format!("stdout task failed: {}", e)))?
        .map_err(|e| ToolError::ExecutionError(format!("Failed to read stdout: {}", e)))?;
    let stderr = stderr_task
        .await
        .map_err(|e| ToolError::ExecutionError(format!("stderr task failed: {}", e)))?;

    Ok(Output {
        status,
        stdout,
        stderr: stderr.into_bytes(),
    })
}

/// Drain a stderr pipe into a string (lossy)
pub async fn collect_stderr<R>(mut pipe: R) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let _ = pipe.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).trim().to_string()
}

pub fn spawn_error(program: &str, e: std::io::Error) -> ToolError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ToolError::ToolNotFound(program.to_string())
    } else {
        ToolError::ExecutionError(format!("Failed to start {}: {}", program, e))
    }
}

/// Last non-empty stderr line, or a generic message with the exit code
pub fn stderr_summary(stderr: &str, code: Option<i32>) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| match code {
            Some(c) => format!("exited with code {}", c),
            None => "terminated by signal".to_string(),
        })
}

/// Find an executable in common install locations, then `PATH`
pub fn find_tool(binary_name: &str) -> String {
    let common_paths = [
        format!("/opt/homebrew/bin/{}", binary_name), // Homebrew on Apple Silicon
        format!("/usr/local/bin/{}", binary_name),    // Homebrew on Intel Mac
        format!("/usr/bin/{}", binary_name),          // System installation
    ];

    for path in common_paths {
        if std::path::Path::new(&path).exists() {
            return path;
        }
    }

    if let Ok(output) = StdCommand::new("which").arg(binary_name).output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    // Last resort: hope it's in PATH
    binary_name.to_string()
}

/// One interesting line of `yt-dlp --newline` output
#[derive(Debug, Clone, PartialEq)]
pub enum YtDlpLine {
    Progress(DownloadProgress),
    Destination(PathBuf),
    Complete(PathBuf),
}

/// Parse a yt-dlp output line like:
/// [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
pub fn parse_ytdlp_line(line: &str) -> Option<YtDlpLine> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(
            r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)(?:\s+at\s+(\S+\s*\S*/s))?(?:\s+ETA\s+(\S+))?"
        ).unwrap();
        static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"\[download\]\s+(.+) has already been downloaded").unwrap();
    }

    if let Some(path) = line.strip_prefix(COMPLETE_MARKER) {
        let path = path.trim();
        if path.is_empty() || path == "NA" {
            return None;
        }
        return Some(YtDlpLine::Complete(PathBuf::from(path)));
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        let size = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
        let status = match (caps.get(3), caps.get(4)) {
            (Some(speed), Some(eta)) => {
                format!("{:.1}% of {} @ {} ETA {}", percent, size, speed.as_str(), eta.as_str())
            }
            (Some(speed), None) => format!("{:.1}% of {} @ {}", percent, size, speed.as_str()),
            _ => format!("{:.1}% of {}", percent, size),
        };
        return Some(YtDlpLine::Progress(DownloadProgress { percent, status }));
    }

    if let Some(caps) = DEST_RE.captures(line) {
        return Some(YtDlpLine::Destination(PathBuf::from(caps.get(1)?.as_str().trim())));
    }

    if let Some(caps) = ALREADY_RE.captures(line) {
        return Some(YtDlpLine::Destination(PathBuf::from(caps.get(1)?.as_str().trim())));
    }

    None
}
