// In-memory collaborators for pipeline and API tests

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::errors::ToolError;
use super::models::{
    DecodedAudio, DownloadProgress, DownloadRequest, MediaMetadata, OutputProfile, ProbeReport,
    StreamDescriptor, CODEC_NONE,
};
use super::traits::{AudioTranscoder, DownloadObserver, MediaExtractor};

pub const VIDEO_ID: &str = "abc";

pub fn audio_stream(id: &str, ext: &str, note: &str) -> StreamDescriptor {
    StreamDescriptor {
        format_id: id.to_string(),
        container: ext.to_string(),
        audio_codec: "opus".to_string(),
        video_codec: CODEC_NONE.to_string(),
        quality: note.to_string(),
        label: format!("{} - audio only ({})", id, note),
    }
}

/// Entries directly under a workspace root
pub fn workspace_count(root: &Path) -> usize {
    std::fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
}

#[derive(Debug, Clone)]
pub enum DownloadBehavior {
    /// Write the file and signal its path
    Signal,
    /// Write the file, never signal
    Silent,
    /// Write the file, signal a path that does not exist
    WrongSignal,
    /// Exit 0 without writing anything
    NoFile,
    /// Write a zero-length file and signal it
    EmptyFile,
    /// Write nothing and exit with this code
    ExitCode(i32),
    Panic,
}

pub struct FakeExtractor {
    probe: Result<ProbeReport, ToolError>,
    download: DownloadBehavior,
    download_calls: AtomicUsize,
    probe_filters: Mutex<Vec<String>>,
}

impl Default for FakeExtractor {
    fn default() -> Self {
        Self::with_streams(vec![
            audio_stream("251", "webm", "medium"),
            audio_stream("249", "webm", "low"),
            audio_stream("140", "m4a", "low"),
        ])
    }
}

impl FakeExtractor {
    pub fn with_streams(streams: Vec<StreamDescriptor>) -> Self {
        Self {
            probe: Ok(ProbeReport {
                metadata: MediaMetadata {
                    id: VIDEO_ID.to_string(),
                    title: "Test Title".to_string(),
                    url: format!("https://youtu.be/{}", VIDEO_ID),
                    uploader: "Uploader".to_string(),
                    ..Default::default()
                },
                streams,
            }),
            download: DownloadBehavior::Signal,
            download_calls: AtomicUsize::new(0),
            probe_filters: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_probe(error: ToolError) -> Self {
        Self {
            probe: Err(error),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        if let Ok(report) = &mut self.probe {
            report.metadata.title = title.to_string();
        }
        self
    }

    pub fn with_download(mut self, behavior: DownloadBehavior) -> Self {
        self.download = behavior;
        self
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    /// Format filters passed to `probe`, in call order
    pub fn probe_filters(&self) -> Vec<String> {
        self.probe_filters.lock().unwrap().clone()
    }

    fn resolve_template(template: &Path, ext: &str) -> PathBuf {
        let rendered = template
            .to_string_lossy()
            .replace("%(id)s", VIDEO_ID)
            .replace("%(ext)s", ext);
        PathBuf::from(rendered)
    }
}

#[async_trait]
impl MediaExtractor for FakeExtractor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, _url: &str, format_filter: &str) -> Result<ProbeReport, ToolError> {
        self.probe_filters.lock().unwrap().push(format_filter.to_string());
        self.probe.clone()
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        observer: &dyn DownloadObserver,
    ) -> Result<i32, ToolError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let path = Self::resolve_template(&request.output_template, "webm");

        let write = |bytes: &'static [u8]| {
            let path = path.clone();
            async move { tokio::fs::write(&path, bytes).await.map_err(|e| ToolError::ExecutionError(e.to_string())) }
        };

        observer.on_progress(&DownloadProgress {
            percent: 0.0,
            status: "starting".to_string(),
        });

        match &self.download {
            DownloadBehavior::Signal => {
                write(b"webm audio payload").await?;
                observer.on_complete(path);
                Ok(0)
            }
            DownloadBehavior::Silent => {
                write(b"webm audio payload").await?;
                Ok(0)
            }
            DownloadBehavior::WrongSignal => {
                write(b"webm audio payload").await?;
                observer.on_complete(path.with_file_name("elsewhere.webm"));
                Ok(0)
            }
            DownloadBehavior::NoFile => Ok(0),
            DownloadBehavior::EmptyFile => {
                write(b"").await?;
                observer.on_complete(path);
                Ok(0)
            }
            DownloadBehavior::ExitCode(code) => Ok(*code),
            DownloadBehavior::Panic => panic!("extractor exploded"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum EncodeBehavior {
    /// Write a non-empty output file
    Write,
    Fail(ToolError),
    /// Report success but write nothing
    SucceedWithoutOutput,
}

pub struct FakeTranscoder {
    decode_error: Option<ToolError>,
    encode: EncodeBehavior,
    calls: AtomicUsize,
    encode_calls: AtomicUsize,
}

impl Default for FakeTranscoder {
    fn default() -> Self {
        Self {
            decode_error: None,
            encode: EncodeBehavior::Write,
            calls: AtomicUsize::new(0),
            encode_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeTranscoder {
    pub fn with_encode(mut self, behavior: EncodeBehavior) -> Self {
        self.encode = behavior;
        self
    }

    /// Make `decode` reject the source
    pub fn failing_decode(mut self, error: ToolError) -> Self {
        self.decode_error = Some(error);
        self
    }

    pub fn encode_calls(&self) -> usize {
        self.encode_calls.load(Ordering::SeqCst)
    }

    /// Number of decode calls (one per transcoder invocation)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioTranscoder for FakeTranscoder {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn decode(&self, path: &Path, container: &str) -> Result<DecodedAudio, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.decode_error {
            return Err(e.clone());
        }
        Ok(DecodedAudio {
            path: path.to_path_buf(),
            container: container.to_string(),
            codec: "opus".to_string(),
            sample_rate: Some(48_000),
            channels: Some(2),
        })
    }

    async fn encode(
        &self,
        audio: &DecodedAudio,
        output: &Path,
        profile: OutputProfile,
    ) -> Result<(), ToolError> {
        self.encode_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(profile.sample_width_bits, 16);
        match &self.encode {
            EncodeBehavior::Write => {
                let mut bytes = b"ID3".to_vec();
                bytes.extend(
                    tokio::fs::read(&audio.path)
                        .await
                        .map_err(|e| ToolError::Failed(e.to_string()))?,
                );
                tokio::fs::write(output, bytes)
                    .await
                    .map_err(|e| ToolError::Failed(e.to_string()))
            }
            EncodeBehavior::Fail(e) => Err(e.clone()),
            EncodeBehavior::SucceedWithoutOutput => Ok(()),
        }
    }
}
