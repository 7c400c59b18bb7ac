// Common data models for the audio pipeline

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Number;
use std::path::PathBuf;

/// Codec sentinel yt-dlp uses for "stream not present"
pub const CODEC_NONE: &str = "none";

/// One downloadable variant of a remote media item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Format ID (e.g., "249", "251")
    pub format_id: String,
    /// Container of the audio payload (webm, m4a, mp4)
    pub container: String,
    /// Audio codec (opus, mp4a.40.2, none)
    pub audio_codec: String,
    /// Video codec (vp9, avc1, none)
    pub video_codec: String,
    /// Quality tag (e.g., "low", "medium", "1080p")
    pub quality: String,
    /// Display label (e.g., "249 - audio only (low)")
    pub label: String,
}

impl StreamDescriptor {
    pub fn has_video(&self) -> bool {
        self.video_codec != CODEC_NONE
    }

    pub fn has_audio(&self) -> bool {
        self.audio_codec != CODEC_NONE
    }

    pub fn is_audio_only(&self) -> bool {
        self.has_audio() && !self.has_video()
    }
}

/// Raw format entry as dumped by yt-dlp
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub format: Option<String>,
    pub format_note: Option<String>,
    pub ext: Option<String>,
    pub audio_ext: Option<String>,
    pub acodec: Option<String>,
    pub vcodec: Option<String>,
}

impl From<RawFormat> for StreamDescriptor {
    fn from(raw: RawFormat) -> Self {
        let container = raw
            .audio_ext
            .filter(|ext| !ext.is_empty() && ext != CODEC_NONE)
            .or(raw.ext)
            .unwrap_or_default();

        Self {
            format_id: raw.format_id.unwrap_or_default(),
            container,
            audio_codec: raw.acodec.unwrap_or_else(|| CODEC_NONE.to_string()),
            video_codec: raw.vcodec.unwrap_or_else(|| CODEC_NONE.to_string()),
            quality: raw.format_note.unwrap_or_default(),
            label: raw.format.unwrap_or_default(),
        }
    }
}

/// The single stream chosen for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFormat {
    pub format_id: String,
    pub container: String,
    pub label: String,
}

impl From<&StreamDescriptor> for SelectedFormat {
    fn from(d: &StreamDescriptor) -> Self {
        Self {
            format_id: d.format_id.clone(),
            container: d.container.clone(),
            label: d.label.clone(),
        }
    }
}

/// Video metadata served by `GET /youtube` and used for the response filename.
///
/// Absent numeric fields serialize as `""` so clients always see every key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaMetadata {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    #[serde(serialize_with = "number_or_empty")]
    pub duration: Option<Number>,
    pub url: String,
    pub uploader: String,
    pub channel_url: String,
    pub description: String,
    #[serde(serialize_with = "number_or_empty")]
    pub timestamp: Option<Number>,
    pub upload_date: String,
}

fn number_or_empty<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(""),
    }
}

/// Raw info document as dumped by yt-dlp (only the fields we read)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<Number>,
    pub original_url: Option<String>,
    pub webpage_url: Option<String>,
    pub uploader: Option<String>,
    pub channel_url: Option<String>,
    pub description: Option<String>,
    pub timestamp: Option<Number>,
    pub upload_date: Option<String>,
    pub formats: Vec<RawFormat>,
}

/// Everything one probe call returns
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub metadata: MediaMetadata,
    pub streams: Vec<StreamDescriptor>,
}

impl RawInfo {
    /// Split into metadata and descriptors; `request_url` backs an absent canonical URL
    pub fn into_report(self, request_url: &str) -> ProbeReport {
        let url = self
            .original_url
            .or(self.webpage_url)
            .unwrap_or_else(|| request_url.to_string());

        ProbeReport {
            metadata: MediaMetadata {
                id: self.id.unwrap_or_default(),
                title: self.title.unwrap_or_default(),
                thumbnail: self.thumbnail.unwrap_or_default(),
                duration: self.duration,
                url,
                uploader: self.uploader.unwrap_or_default(),
                channel_url: self.channel_url.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
                timestamp: self.timestamp,
                upload_date: self.upload_date.unwrap_or_default(),
            },
            streams: self.formats.into_iter().map(StreamDescriptor::from).collect(),
        }
    }
}

/// Everything the extractor needs to fetch one format
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
    /// yt-dlp output template, e.g. `/tmp/ws/%(id)s.%(ext)s`
    pub output_template: PathBuf,
}

/// Download progress information
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}

/// Target encoding for the transcoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputProfile {
    /// ffmpeg muxer name and file extension
    pub format: &'static str,
    pub codec: &'static str,
    pub mime_type: &'static str,
    pub sample_width_bits: u16,
}

impl OutputProfile {
    pub const MP3: OutputProfile = OutputProfile {
        format: "mp3",
        codec: "libmp3lame",
        mime_type: "audio/mpeg",
        sample_width_bits: 16,
    };

    /// Planar sample format ffmpeg should encode at
    pub fn sample_format(&self) -> &'static str {
        match self.sample_width_bits {
            32 => "s32p",
            _ => "s16p",
        }
    }
}

/// Handle to a decoded (probed) source file
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub path: PathBuf,
    pub container: String,
    pub codec: String,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
}
