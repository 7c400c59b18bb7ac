// Downloader module - the probe/fetch/transcode pipeline and its collaborators

pub mod backends;
pub mod errors;
pub mod fetcher;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod packager;
pub mod probe;
pub mod traits;
pub mod transcoder;
pub mod utils;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{PipelineError, ToolError};
pub use models::{MediaMetadata, SelectedFormat, StreamDescriptor};
pub use orchestrator::Pipeline;
pub use packager::PackagedAudio;
pub use traits::{AudioTranscoder, DownloadObserver, MediaExtractor};
pub use workspace::{Workspace, WorkspaceManager};
