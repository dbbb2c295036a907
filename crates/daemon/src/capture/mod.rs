// Change capture: decides per cycle between the git-backed and the
// snapshot-backed strategy and produces a `ChangeSet` or "no change".

pub mod snapshot;
pub mod vcs;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use autolog_common::types::{ChangeSet, SourceKind};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::CycleError;
use crate::git::worker::{CommandExecutor, GitWorker, ProcessCommandExecutor};
use crate::operator::ActiveFileSource;
use crate::store::snapshot::SnapshotStore;

pub use snapshot::SnapshotCapture;
pub use vcs::VersionControlCapture;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("could not capture {which} changes: {message}")]
    Diff { which: &'static str, message: String },
    #[error("no active file is open")]
    NoActiveFile,
    #[error("could not read `{path}`: {message}")]
    ReadFile { path: PathBuf, message: String },
}

impl From<CaptureError> for CycleError {
    fn from(error: CaptureError) -> Self {
        match error {
            CaptureError::NoActiveFile => CycleError::NoActiveFile,
            other => CycleError::DiffCapture { detail: other.to_string() },
        }
    }
}

/// The strategy chosen for one cycle.
pub enum CaptureStrategy<'a, E: CommandExecutor> {
    VersionControl(VersionControlCapture<'a, E>),
    Snapshot(SnapshotCapture),
}

impl<E: CommandExecutor> CaptureStrategy<'_, E> {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            Self::VersionControl(_) => SourceKind::VersionControlled,
            Self::Snapshot(_) => SourceKind::FileSnapshot,
        }
    }
}

pub struct ChangeCaptureService<E: CommandExecutor = ProcessCommandExecutor> {
    worker: GitWorker<E>,
    include_unstaged: bool,
    active_file: Arc<dyn ActiveFileSource>,
}

impl<E: CommandExecutor> ChangeCaptureService<E> {
    pub fn new(
        worker: GitWorker<E>,
        include_unstaged: bool,
        active_file: Arc<dyn ActiveFileSource>,
    ) -> Self {
        Self { worker, include_unstaged, active_file }
    }

    pub fn active_file(&self) -> Option<PathBuf> {
        self.active_file.active_file()
    }

    /// Probe the working directory once and pick a strategy.
    ///
    /// A failed probe is logged and treated as "not a repository".
    pub fn select_strategy(&self, interval: Duration) -> CaptureStrategy<'_, E> {
        let is_repository = match self.worker.is_repository() {
            Ok(is_repository) => is_repository,
            Err(error) => {
                warn!(%error, "repository probe failed; using file snapshots");
                false
            }
        };

        if is_repository {
            CaptureStrategy::VersionControl(VersionControlCapture::new(
                &self.worker,
                self.include_unstaged,
            ))
        } else {
            CaptureStrategy::Snapshot(SnapshotCapture::new(interval))
        }
    }

    /// Capture the changes for this cycle. `Ok(None)` means nothing to commit.
    pub fn capture_at(
        &self,
        snapshots: &mut SnapshotStore,
        interval: Duration,
        now: SystemTime,
    ) -> Result<Option<ChangeSet>, CaptureError> {
        let strategy = self.select_strategy(interval);
        debug!(mode = strategy.source_kind().as_str(), "capturing changes");
        match strategy {
            CaptureStrategy::VersionControl(capture) => capture.capture(),
            CaptureStrategy::Snapshot(capture) => {
                capture.capture(self.active_file.active_file(), snapshots, now)
            }
        }
    }
}
