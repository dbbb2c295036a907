// Host-side collaborators: the operator who answers prompts and the editor
// that knows which file is active.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::BoxFuture;

/// Interactive checkpoints the engine may raise during a cycle.
pub trait Operator: Send + Sync {
    /// Ask a yes/no question. `false` on decline or cancel.
    fn confirm(&self, prompt: &str) -> BoxFuture<'_, bool>;

    /// Ask for free text. `None` on cancel.
    fn input(&self, prompt: &str) -> BoxFuture<'_, Option<String>>;
}

/// Source of the file currently open in the host editor.
pub trait ActiveFileSource: Send + Sync {
    fn active_file(&self) -> Option<PathBuf>;
}

/// Active file set by the host and read by the engine.
#[derive(Debug, Default)]
pub struct SharedActiveFile {
    path: RwLock<Option<PathBuf>>,
}

impl SharedActiveFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path: RwLock::new(path) }
    }

    pub fn set(&self, path: Option<PathBuf>) {
        match self.path.write() {
            Ok(mut guard) => *guard = path,
            Err(poisoned) => *poisoned.into_inner() = path,
        }
    }
}

impl ActiveFileSource for SharedActiveFile {
    fn active_file(&self) -> Option<PathBuf> {
        match self.path.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
