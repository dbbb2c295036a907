use autolog_common::types::ChangeSet;

use super::CaptureError;
use crate::git::worker::{CommandExecutor, GitWorker, GitWorkerError};

/// Staged (and optionally unstaged) diff of the working tree.
pub struct VersionControlCapture<'a, E: CommandExecutor> {
    worker: &'a GitWorker<E>,
    include_unstaged: bool,
}

impl<'a, E: CommandExecutor> VersionControlCapture<'a, E> {
    pub fn new(worker: &'a GitWorker<E>, include_unstaged: bool) -> Self {
        Self { worker, include_unstaged }
    }

    pub fn capture(&self) -> Result<Option<ChangeSet>, CaptureError> {
        let staged = self.worker.diff_cached().map_err(|e| diff_error("staged", e))?.stdout;

        let mut text = staged.trim_end().to_string();
        if self.include_unstaged {
            let unstaged =
                self.worker.diff_unstaged().map_err(|e| diff_error("unstaged", e))?.stdout;
            let unstaged = unstaged.trim_end();
            if !unstaged.trim().is_empty() {
                if !text.trim().is_empty() {
                    text.push_str("\n\n");
                }
                text.push_str(unstaged);
            }
        }

        let change = ChangeSet::version_controlled(text);
        Ok((!change.is_empty()).then_some(change))
    }
}

fn diff_error(which: &'static str, error: GitWorkerError) -> CaptureError {
    CaptureError::Diff { which, message: error.to_string() }
}
