use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use autolog_common::diff::line::diff;
use autolog_common::types::ChangeSet;
use tracing::debug;

use super::CaptureError;
use crate::store::snapshot::SnapshotStore;

/// Positional diff of the active file against its last recorded content.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotCapture {
    interval: Duration,
}

impl SnapshotCapture {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn capture(
        &self,
        active_file: Option<PathBuf>,
        snapshots: &mut SnapshotStore,
        now: SystemTime,
    ) -> Result<Option<ChangeSet>, CaptureError> {
        let path = active_file.ok_or(CaptureError::NoActiveFile)?;
        let (content, modified) = read_with_mtime(&path)?;

        let previous = snapshots.get(&path).map(str::to_owned);
        snapshots.set(&path, content.clone());

        if content.trim().is_empty() {
            debug!(path = %path.display(), "active file is empty");
            return Ok(None);
        }

        let threshold = now.checked_sub(self.interval).unwrap_or(SystemTime::UNIX_EPOCH);
        if modified < threshold {
            debug!(path = %path.display(), "active file not modified within the interval");
            return Ok(None);
        }

        let text = match previous {
            None => content,
            Some(previous) => diff(&previous, &content),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(ChangeSet::file_snapshot(path, text)))
    }
}

/// Record the current content of `path` as its baseline.
pub fn reprime(path: &Path, snapshots: &mut SnapshotStore) -> Result<(), CaptureError> {
    let content = fs::read_to_string(path).map_err(|error| read_error(path, error))?;
    snapshots.set(path, content);
    Ok(())
}

fn read_with_mtime(path: &Path) -> Result<(String, SystemTime), CaptureError> {
    let content = fs::read_to_string(path).map_err(|error| read_error(path, error))?;
    let modified = fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|error| read_error(path, error))?;
    Ok((content, modified))
}

fn read_error(path: &Path, error: std::io::Error) -> CaptureError {
    CaptureError::ReadFile { path: path.to_path_buf(), message: error.to_string() }
}
