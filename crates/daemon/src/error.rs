// Cycle error taxonomy.
//
// Each variant is a structured kind with an optional backend detail. The
// presentation layer formats user-facing text from `code()` and `Display`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("could not capture code changes: {detail}")]
    DiffCapture { detail: String },

    #[error("no active file is open")]
    NoActiveFile,

    #[error("authentication failed: {detail}")]
    Auth { detail: String },

    #[error("no commit message was provided")]
    MissingMessage,

    #[error("could not read the remote commit log: {detail}")]
    RemoteRead { detail: String },

    #[error("could not write the remote commit log: {detail}")]
    RemoteWrite { detail: String },

    #[error("remote commit log changed concurrently: {detail}")]
    RemoteWriteConflict { detail: String },
}

impl CycleError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DiffCapture { .. } => "DIFF_CAPTURE_FAILED",
            Self::NoActiveFile => "NO_ACTIVE_FILE",
            Self::Auth { .. } => "AUTH_FAILED",
            Self::MissingMessage => "MISSING_MESSAGE",
            Self::RemoteRead { .. } => "REMOTE_READ_FAILED",
            Self::RemoteWrite { .. } => "REMOTE_WRITE_FAILED",
            Self::RemoteWriteConflict { .. } => "REMOTE_WRITE_CONFLICT",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::DiffCapture { detail }
            | Self::Auth { detail }
            | Self::RemoteRead { detail }
            | Self::RemoteWrite { detail }
            | Self::RemoteWriteConflict { detail } => Some(detail),
            Self::NoActiveFile | Self::MissingMessage => None,
        }
    }
}
