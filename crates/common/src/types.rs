// Core domain types shared across all autolog crates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a change set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Staged (and optionally unstaged) diff from a git working tree.
    VersionControlled,
    /// Positional diff of the active file against its last snapshot.
    FileSnapshot,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VersionControlled => "version_controlled",
            Self::FileSnapshot => "file_snapshot",
        }
    }
}

/// The changes captured in one cycle.
///
/// An empty `text` means there is nothing to commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub source_kind: SourceKind,
    pub text: String,
    pub subject_path: Option<PathBuf>,
}

impl ChangeSet {
    pub fn version_controlled(text: impl Into<String>) -> Self {
        Self { source_kind: SourceKind::VersionControlled, text: text.into(), subject_path: None }
    }

    pub fn file_snapshot(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            source_kind: SourceKind::FileSnapshot,
            text: text.into(),
            subject_path: Some(path.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Text handed to message generation. Snapshot changes name the file they
    /// belong to.
    pub fn prompt_text(&self) -> String {
        match (&self.source_kind, &self.subject_path) {
            (SourceKind::FileSnapshot, Some(path)) => {
                format!("File: {}\nChanges:\n{}\n", path.display(), self.text)
            }
            _ => self.text.clone(),
        }
    }

    pub fn subject_path(&self) -> Option<&Path> {
        self.subject_path.as_deref()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitRecordError {
    #[error("commit message must not be empty")]
    EmptyMessage,
}

/// One entry appended to the remote journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub timestamp_iso: String,
    pub message: String,
}

impl CommitRecord {
    pub fn new(
        timestamp_iso: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, CommitRecordError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(CommitRecordError::EmptyMessage);
        }
        Ok(Self { timestamp_iso: timestamp_iso.into(), message })
    }
}

/// A commit listed by the hosting service, used for history views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub date: String,
    pub author: String,
    pub message: String,
}
