// Last-observed file contents for snapshot-backed change capture.
//
// Entries live for the process lifetime and are never evicted or persisted.
// After a restart the first capture of any path reports its whole content.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Map from file path to the last full text seen for it.
#[derive(Debug, Default, Clone)]
pub struct SnapshotStore {
    entries: HashMap<PathBuf, String>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Record `text` as the baseline for `path`, replacing any previous one.
    pub fn set(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.entries.insert(path.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
