// Remote hosting service: repository metadata, the commit-log document and
// commit history.

pub mod branch;
pub mod github;
pub mod log;

use autolog_common::types::CommitSummary;
use thiserror::Error;

use crate::identity::RepositoryIdentity;
use crate::BoxFuture;

pub use branch::{BranchSafetyGuard, GuardDecision};
pub use github::GitHubClient;
pub use log::RemoteLogAppender;

/// Current text of a remote document and the revision token it was read at.
///
/// `revision` is `None` only when the document does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteDocument {
    pub text: String,
    pub revision: Option<String>,
}

/// A full replacement of a remote document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutContent {
    /// Commit message recorded by the host.
    pub message: String,
    /// New document text, unencoded.
    pub text: String,
    /// Revision being replaced. `None` creates the document.
    pub revision: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("host answered {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl HostError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `message` field of an error payload, if the host sent one.
    pub fn payload_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Operations of the hosting API the engine relies on.
pub trait RepositoryHost: Send + Sync {
    fn default_branch<'a>(
        &'a self,
        identity: &'a RepositoryIdentity,
    ) -> BoxFuture<'a, Result<String, HostError>>;

    /// `Ok(None)` when the document does not exist.
    fn get_content<'a>(
        &'a self,
        identity: &'a RepositoryIdentity,
        path: &'a str,
    ) -> BoxFuture<'a, Result<Option<RemoteDocument>, HostError>>;

    /// Returns the new revision token when the host reports one.
    fn put_content<'a>(
        &'a self,
        identity: &'a RepositoryIdentity,
        path: &'a str,
        content: PutContent,
    ) -> BoxFuture<'a, Result<Option<String>, HostError>>;

    fn list_commits<'a>(
        &'a self,
        identity: &'a RepositoryIdentity,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<CommitSummary>, HostError>>;
}
