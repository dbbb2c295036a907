// Append-only commit journal stored as a single document on the host.
//
// Each append is read, extend, write. The write carries the revision token
// read in the same attempt, so a concurrent writer is detected as a
// conflict instead of being overwritten.

use std::sync::Arc;

use autolog_common::journal::{append_entry, format_timestamp};
use autolog_common::types::CommitRecord;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{HostError, PutContent, RemoteDocument, RepositoryHost};
use crate::error::CycleError;
use crate::identity::RepositoryIdentity;

const DEFAULT_WRITE_FAILURE: &str = "failed to write commit log";

pub struct RemoteLogAppender {
    host: Arc<dyn RepositoryHost>,
    log_path: String,
    conflict_retries: u32,
}

impl RemoteLogAppender {
    pub fn new(
        host: Arc<dyn RepositoryHost>,
        log_path: impl Into<String>,
        conflict_retries: u32,
    ) -> Self {
        Self { host, log_path: log_path.into(), conflict_retries }
    }

    pub fn log_path(&self) -> &str {
        &self.log_path
    }

    pub async fn append(
        &self,
        identity: &RepositoryIdentity,
        message: &str,
    ) -> Result<Option<String>, CycleError> {
        self.append_at(identity, message, Utc::now()).await
    }

    /// Append one entry stamped with `at`. Returns the new revision token.
    pub async fn append_at(
        &self,
        identity: &RepositoryIdentity,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<String>, CycleError> {
        let record = CommitRecord::new(format_timestamp(at), message)
            .map_err(|_| CycleError::MissingMessage)?;

        let mut retries_left = self.conflict_retries;
        loop {
            let document = self.read(identity).await?;
            let content = PutContent {
                message: record.message.clone(),
                text: append_entry(&document.text, &record),
                revision: document.revision,
            };

            match self.host.put_content(identity, &self.log_path, content).await {
                Ok(revision) => {
                    debug!(path = %self.log_path, revision = ?revision, "commit log updated");
                    return Ok(revision);
                }
                Err(error) if is_conflict(&error) => {
                    if retries_left == 0 {
                        return Err(CycleError::RemoteWriteConflict { detail: error.to_string() });
                    }
                    retries_left -= 1;
                    warn!(%error, retries_left, "commit log changed concurrently; retrying");
                }
                Err(error) => return Err(CycleError::RemoteWrite { detail: write_detail(&error) }),
            }
        }
    }

    async fn read(&self, identity: &RepositoryIdentity) -> Result<RemoteDocument, CycleError> {
        match self.host.get_content(identity, &self.log_path).await {
            Ok(Some(document)) => Ok(document),
            Ok(None) => Ok(RemoteDocument::default()),
            Err(error) => Err(CycleError::RemoteRead { detail: error.to_string() }),
        }
    }
}

/// 409, or 422 complaining about the revision token.
fn is_conflict(error: &HostError) -> bool {
    match error.status() {
        Some(409) => true,
        Some(422) => error
            .payload_message()
            .is_some_and(|message| message.to_ascii_lowercase().contains("sha")),
        _ => false,
    }
}

fn write_detail(error: &HostError) -> String {
    match error {
        HostError::Status { message, .. } => {
            message.clone().unwrap_or_else(|| DEFAULT_WRITE_FAILURE.to_string())
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::remote::tests::FakeHost;

    fn identity() -> RepositoryIdentity {
        RepositoryIdentity::new("octocat", "auto-log", "ghp_test")
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn existing(text: &str, sha: &str) -> Result<Option<RemoteDocument>, HostError> {
        Ok(Some(RemoteDocument { text: text.into(), revision: Some(sha.into()) }))
    }

    fn appender(host: &Arc<FakeHost>, retries: u32) -> RemoteLogAppender {
        RemoteLogAppender::new(host.clone(), "commit_log.txt", retries)
    }

    // ── Create and update ──

    #[tokio::test]
    async fn missing_document_is_created_without_revision() {
        let host = Arc::new(FakeHost::default().with_read(Ok(None)));

        let revision =
            appender(&host, 0).append_at(&identity(), "Add README", at()).await.unwrap();

        assert_eq!(revision.as_deref(), Some("new-sha"));
        let puts = host.put_requests();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].text, "\n[2024-03-09T14:05:07.000Z]\n\nAdd README");
        assert_eq!(puts[0].revision, None);
        assert_eq!(puts[0].message, "Add README");
    }

    #[tokio::test]
    async fn existing_document_is_extended_with_its_revision() {
        let host = Arc::new(FakeHost::default().with_read(existing("old", "abc")));

        appender(&host, 0).append_at(&identity(), "Fix typo", at()).await.unwrap();

        let puts = host.put_requests();
        assert_eq!(puts[0].text, "old\n[2024-03-09T14:05:07.000Z]\n\nFix typo");
        assert_eq!(puts[0].revision.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn blank_message_is_rejected_before_any_request() {
        let host = Arc::new(FakeHost::default());

        let error = appender(&host, 0).append_at(&identity(), "  ", at()).await.unwrap_err();

        assert_eq!(error, CycleError::MissingMessage);
        assert_eq!(host.read_count(), 0);
    }

    // ── Failures ──

    #[tokio::test]
    async fn read_failure_stops_before_writing() {
        let host = Arc::new(
            FakeHost::default().with_read(Err(HostError::Status { status: 500, message: None })),
        );

        let error = appender(&host, 0).append_at(&identity(), "msg", at()).await.unwrap_err();

        assert!(matches!(error, CycleError::RemoteRead { .. }));
        assert!(host.put_requests().is_empty());
    }

    #[tokio::test]
    async fn write_failure_carries_backend_message() {
        let host = Arc::new(
            FakeHost::default()
                .with_read(Ok(None))
                .with_write(Err(HostError::Status {
                    status: 401,
                    message: Some("Bad credentials".into()),
                })),
        );

        let error = appender(&host, 0).append_at(&identity(), "msg", at()).await.unwrap_err();
        assert_eq!(error, CycleError::RemoteWrite { detail: "Bad credentials".into() });
    }

    #[tokio::test]
    async fn write_failure_without_message_uses_default_detail() {
        let host = Arc::new(
            FakeHost::default()
                .with_read(Ok(None))
                .with_write(Err(HostError::Status { status: 500, message: None })),
        );

        let error = appender(&host, 0).append_at(&identity(), "msg", at()).await.unwrap_err();
        assert_eq!(error, CycleError::RemoteWrite { detail: DEFAULT_WRITE_FAILURE.into() });
    }

    // ── Conflicts ──

    #[tokio::test]
    async fn conflict_is_surfaced_when_retries_are_disabled() {
        let host = Arc::new(
            FakeHost::default()
                .with_read(existing("old", "stale"))
                .with_write(Err(HostError::Status {
                    status: 409,
                    message: Some("conflict".into()),
                })),
        );

        let error = appender(&host, 0).append_at(&identity(), "msg", at()).await.unwrap_err();

        assert!(matches!(error, CycleError::RemoteWriteConflict { .. }));
        assert_eq!(host.read_count(), 1);
    }

    #[tokio::test]
    async fn sha_mismatch_422_counts_as_conflict() {
        let host = Arc::new(FakeHost::default().with_read(Ok(None)).with_write(Err(
            HostError::Status { status: 422, message: Some("\"sha\" wasn't supplied.".into()) },
        )));

        let error = appender(&host, 0).append_at(&identity(), "msg", at()).await.unwrap_err();
        assert!(matches!(error, CycleError::RemoteWriteConflict { .. }));
    }

    #[tokio::test]
    async fn other_422_is_a_plain_write_failure() {
        let host = Arc::new(FakeHost::default().with_read(Ok(None)).with_write(Err(
            HostError::Status { status: 422, message: Some("Invalid request.".into()) },
        )));

        let error = appender(&host, 0).append_at(&identity(), "msg", at()).await.unwrap_err();
        assert_eq!(error, CycleError::RemoteWrite { detail: "Invalid request.".into() });
    }

    #[tokio::test]
    async fn conflict_retry_rereads_the_fresh_revision() {
        let host = Arc::new(
            FakeHost::default()
                .with_read(existing("old", "stale"))
                .with_read(existing("old\nother", "fresh"))
                .with_write(Err(HostError::Status { status: 409, message: None }))
                .with_write(Ok(Some("final".into()))),
        );

        let revision = appender(&host, 1).append_at(&identity(), "msg", at()).await.unwrap();

        assert_eq!(revision.as_deref(), Some("final"));
        assert_eq!(host.read_count(), 2);
        let puts = host.put_requests();
        assert_eq!(puts[1].revision.as_deref(), Some("fresh"));
        assert!(puts[1].text.starts_with("old\nother\n["));
    }
}
