// Request-scoped temporary directories
//
// A request has no workspace while probing and selecting. `WorkspaceManager::open`
// creates one right before the fetch; from then on it is `Open` until the
// request ends in `Success` or `Failed`. Both end states remove the directory:
// failures eagerly, successes once the response body has been streamed.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "music-downloader-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceState {
    Open,
    Success,
    Failed,
}

/// Creates workspaces under a common root
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn open(&self) -> io::Result<Workspace> {
        std::fs::create_dir_all(&self.root)?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(&self.root)?;

        tracing::debug!(path = %dir.path().display(), "workspace opened");
        Ok(Workspace {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
            state: WorkspaceState::Open,
        })
    }
}

/// A directory owned by exactly one request
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    dir: Option<TempDir>,
    state: WorkspaceState,
}

impl Workspace {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> WorkspaceState {
        self.state
    }

    pub fn is_disposed(&self) -> bool {
        self.dir.is_none()
    }

    /// Packaging succeeded; removal is deferred to whoever owns `self` now
    pub fn mark_success(&mut self) {
        self.state = WorkspaceState::Success;
    }

    /// A stage failed; remove the directory right away
    pub fn fail(&mut self) {
        self.state = WorkspaceState::Failed;
        self.dispose();
    }

    /// Remove the directory. Safe to call any number of times; errors are logged, never returned.
    pub fn dispose(&mut self) {
        if let Some(dir) = self.dir.take() {
            self.log_removal(dir.close());
        }
    }

    /// `dispose` for async contexts: the removal runs on the blocking pool
    pub async fn dispose_async(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(result) => self.log_removal(result),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "workspace removal task failed");
            }
        }
    }

    fn log_removal(&self, result: io::Result<()>) {
        match result {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), state = ?self.state, "workspace removed");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "workspace already gone");
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove workspace");
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.is_disposed() {
            tracing::debug!(path = %self.path.display(), state = ?self.state, "workspace dropped before dispose");
        }
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_unique_dirs() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());

        let a = manager.open().unwrap();
        let b = manager.open().unwrap();

        assert!(a.path().is_dir());
        assert!(b.path().is_dir());
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(root.path()));
        assert_eq!(a.state(), WorkspaceState::Open);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let mut ws = WorkspaceManager::new(root.path()).open().unwrap();
        std::fs::write(ws.path().join("a.webm"), b"data").unwrap();
        let path = ws.path().to_path_buf();

        ws.dispose();
        ws.dispose();

        assert!(!path.exists());
        assert!(ws.is_disposed());
    }

    #[test]
    fn test_fail_removes_eagerly() {
        let root = tempfile::tempdir().unwrap();
        let mut ws = WorkspaceManager::new(root.path()).open().unwrap();
        let path = ws.path().to_path_buf();

        ws.fail();

        assert_eq!(ws.state(), WorkspaceState::Failed);
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes() {
        let root = tempfile::tempdir().unwrap();
        let mut ws = WorkspaceManager::new(root.path()).open().unwrap();
        ws.mark_success();
        let path = ws.path().to_path_buf();

        drop(ws);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_dispose_async_removes_once() {
        let root = tempfile::tempdir().unwrap();
        let mut ws = WorkspaceManager::new(root.path()).open().unwrap();
        std::fs::write(ws.path().join("abc.mp3"), b"data").unwrap();
        let path = ws.path().to_path_buf();

        ws.dispose_async().await;
        ws.dispose_async().await;
        ws.dispose();

        assert!(!path.exists());
        assert!(ws.is_disposed());
    }

    #[test]
    fn test_dispose_tolerates_external_removal() {
        let root = tempfile::tempdir().unwrap();
        let mut ws = WorkspaceManager::new(root.path()).open().unwrap();
        std::fs::remove_dir_all(ws.path()).unwrap();

        ws.dispose();
        assert!(ws.is_disposed());
    }

    #[test]
    fn test_open_creates_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let ws = WorkspaceManager::new(&nested).open().unwrap();
        assert!(ws.path().starts_with(&nested));
    }
}
