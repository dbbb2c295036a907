// One commit cycle: identity -> branch guard -> capture -> message -> append.
//
// The orchestrator owns the mutable cycle state. A cycle that starts while
// another one holds the state returns `Skipped` rather than waiting.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use autolog_common::types::SourceKind;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::capture::{snapshot, ChangeCaptureService};
use crate::error::CycleError;
use crate::git::worker::{CommandExecutor, ProcessCommandExecutor};
use crate::identity::IdentityProvider;
use crate::message::{CommitMessageProvider, MessageMode};
use crate::remote::{BranchSafetyGuard, GuardDecision, RemoteLogAppender};
use crate::store::snapshot::SnapshotStore;

/// State carried from one cycle to the next.
#[derive(Debug, Clone)]
pub struct OrchestratorState {
    pub snapshots: SnapshotStore,
    pub mode: MessageMode,
    pub interval: Duration,
}

impl OrchestratorState {
    pub fn new(mode: MessageMode, interval: Duration) -> Self {
        Self { snapshots: SnapshotStore::new(), mode, interval }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    Committed { message: String, source_kind: SourceKind, revision: Option<String> },
    NoChanges,
    BranchRejected { branch: String },
    Skipped,
}

pub struct CommitOrchestrator<E: CommandExecutor = ProcessCommandExecutor> {
    identity: Arc<dyn IdentityProvider>,
    guard: BranchSafetyGuard,
    capture: ChangeCaptureService<E>,
    messages: CommitMessageProvider,
    log: RemoteLogAppender,
    state: Mutex<OrchestratorState>,
}

impl<E: CommandExecutor> CommitOrchestrator<E> {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        guard: BranchSafetyGuard,
        capture: ChangeCaptureService<E>,
        messages: CommitMessageProvider,
        log: RemoteLogAppender,
        state: OrchestratorState,
    ) -> Self {
        Self { identity, guard, capture, messages, log, state: Mutex::new(state) }
    }

    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        self.run_cycle_at(SystemTime::now()).await
    }

    /// Run one cycle, judging snapshot staleness against `now`.
    pub async fn run_cycle_at(&self, now: SystemTime) -> Result<CycleOutcome, CycleError> {
        let Ok(mut state) = self.state.try_lock() else {
            debug!("a commit cycle is already running; skipping");
            return Ok(CycleOutcome::Skipped);
        };

        let span = info_span!("commit_cycle", cycle_id = %Uuid::new_v4());
        self.run_locked(&mut state, now).instrument(span).await
    }

    async fn run_locked(
        &self,
        state: &mut OrchestratorState,
        now: SystemTime,
    ) -> Result<CycleOutcome, CycleError> {
        let identity = self
            .identity
            .resolve()
            .map_err(|error| CycleError::Auth { detail: error.to_string() })?;

        if let GuardDecision::Rejected { branch } = self.guard.check(&identity).await {
            info!(branch = %branch, "cycle halted by branch guard");
            return Ok(CycleOutcome::BranchRejected { branch });
        }

        let interval = state.interval;
        let Some(change) = self.capture.capture_at(&mut state.snapshots, interval, now)? else {
            info!("no changes to commit");
            return Ok(CycleOutcome::NoChanges);
        };

        let message = self.messages.provide(state.mode, &change).await?;
        let revision = self.log.append(&identity, &message).await?;
        self.reprime_active_file(&mut state.snapshots);

        info!(
            revision = revision.as_deref().unwrap_or("-"),
            source = change.source_kind.as_str(),
            "commit logged"
        );
        Ok(CycleOutcome::Committed { message, source_kind: change.source_kind, revision })
    }

    fn reprime_active_file(&self, snapshots: &mut SnapshotStore) {
        let Some(path) = self.capture.active_file() else {
            return;
        };
        if let Err(error) = snapshot::reprime(&path, snapshots) {
            warn!(path = %path.display(), %error, "could not refresh snapshot after commit");
        }
    }

    pub async fn mode(&self) -> MessageMode {
        self.state.lock().await.mode
    }

    /// Flip between AI and manual messages. Returns the new mode.
    pub async fn toggle_mode(&self) -> MessageMode {
        let mut state = self.state.lock().await;
        state.mode = state.mode.toggled();
        info!(mode = state.mode.as_str(), "commit message mode changed");
        state.mode
    }

    /// Switch to `mode` unless already in it. Returns whether it changed.
    pub async fn follow_mode(&self, mode: MessageMode) -> bool {
        if self.mode().await == mode {
            return false;
        }
        self.toggle_mode().await;
        true
    }

    pub async fn interval(&self) -> Duration {
        self.state.lock().await.interval
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::RedactionPolicy;
    use crate::git::worker::tests::{failed, ok, MockExecutor};
    use crate::git::worker::GitWorker;
    use crate::identity::{IdentityError, RepositoryIdentity};
    use crate::message::ai::tests::MockClient;
    use crate::message::ai::AiCommitError;
    use crate::message::tests::ScriptedOperator;
    use crate::operator::{Operator, SharedActiveFile};
    use crate::remote::tests::FakeHost;
    use crate::remote::{HostError, RemoteDocument};
    use crate::BoxFuture;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    struct FixedIdentity(Option<RepositoryIdentity>);

    impl IdentityProvider for FixedIdentity {
        fn resolve(&self) -> Result<RepositoryIdentity, IdentityError> {
            self.0.clone().ok_or(IdentityError::MissingToken)
        }
    }

    struct Harness {
        host: Arc<FakeHost>,
        operator: Arc<ScriptedOperator>,
        orchestrator: CommitOrchestrator<MockExecutor>,
    }

    fn harness(
        host: FakeHost,
        git: MockExecutor,
        client: MockClient,
        operator: ScriptedOperator,
        mode: MessageMode,
        active: Option<PathBuf>,
    ) -> Harness {
        let host = Arc::new(host);
        let operator = Arc::new(operator);
        let active: Arc<SharedActiveFile> = Arc::new(SharedActiveFile::new(active));
        let identity = RepositoryIdentity::new("octocat", "auto-log", "ghp_test");

        let orchestrator = CommitOrchestrator::new(
            Arc::new(FixedIdentity(Some(identity))),
            BranchSafetyGuard::new(host.clone(), operator.clone()),
            ChangeCaptureService::new(
                GitWorker::with_executor("/tmp/work", git),
                false,
                active,
            ),
            CommitMessageProvider::new(Arc::new(client), operator.clone(), RedactionPolicy::Full),
            RemoteLogAppender::new(host.clone(), "commit_log.txt", 0),
            OrchestratorState::new(mode, HOUR),
        );
        Harness { host, operator, orchestrator }
    }

    fn not_a_repo() -> MockExecutor {
        MockExecutor::new((0..4).map(|_| failed("fatal: not a git repository\n")).collect())
    }

    /// Answers the manual prompt after rewriting the file being committed.
    struct EditingOperator {
        path: PathBuf,
        text: &'static str,
    }

    impl Operator for EditingOperator {
        fn confirm(&self, _prompt: &str) -> BoxFuture<'_, bool> {
            Box::pin(async { true })
        }

        fn input(&self, _prompt: &str) -> BoxFuture<'_, Option<String>> {
            std::fs::write(&self.path, self.text).unwrap();
            Box::pin(async { Some("Edit a".to_string()) })
        }
    }

    // ── Snapshot scenarios ──

    #[tokio::test]
    async fn snapshot_cycle_commits_full_content_then_reports_no_changes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let h = harness(
            FakeHost::default().with_read(Ok(None)),
            not_a_repo(),
            MockClient::ok("Add greeting"),
            ScriptedOperator::default(),
            MessageMode::Ai,
            Some(path.clone()),
        );

        let outcome = h.orchestrator.run_cycle().await.unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Committed {
                message: "Add greeting".into(),
                source_kind: SourceKind::FileSnapshot,
                revision: Some("new-sha".into()),
            }
        );
        let puts = h.host.put_requests();
        assert_eq!(puts.len(), 1);
        assert!(puts[0].text.ends_with("]\n\nAdd greeting"));

        let second = h.orchestrator.run_cycle().await.unwrap();
        assert_eq!(second, CycleOutcome::NoChanges);
        assert_eq!(h.host.put_requests().len(), 1);
        assert_eq!(h.host.read_count(), 1);
    }

    #[tokio::test]
    async fn successful_cycle_reprimes_the_active_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.txt");
        std::fs::write(&path, "one").unwrap();

        let host = Arc::new(FakeHost::default());
        let operator = Arc::new(EditingOperator { path: path.clone(), text: "one\ntwo" });
        let orchestrator = CommitOrchestrator::new(
            Arc::new(FixedIdentity(Some(RepositoryIdentity::new("o", "auto-log", "t")))),
            BranchSafetyGuard::new(host.clone(), operator.clone()),
            ChangeCaptureService::new(
                GitWorker::with_executor("/tmp/work", not_a_repo()),
                false,
                Arc::new(SharedActiveFile::new(Some(path.clone()))),
            ),
            CommitMessageProvider::new(
                Arc::new(MockClient::ok("unused")),
                operator,
                RedactionPolicy::Full,
            ),
            RemoteLogAppender::new(host, "commit_log.txt", 0),
            OrchestratorState::new(MessageMode::Manual, HOUR),
        );

        let outcome = orchestrator.run_cycle().await.unwrap();
        assert!(matches!(outcome, CycleOutcome::Committed { .. }));

        let state = orchestrator.state.lock().await;
        assert_eq!(state.snapshots.get(&path), Some("one\ntwo"));
    }

    #[tokio::test]
    async fn missing_active_file_fails_the_cycle() {
        let h = harness(
            FakeHost::default(),
            not_a_repo(),
            MockClient::ok("unused"),
            ScriptedOperator::default(),
            MessageMode::Ai,
            None,
        );

        assert_eq!(h.orchestrator.run_cycle().await.unwrap_err(), CycleError::NoActiveFile);
    }

    // ── Version-controlled scenarios ──

    #[tokio::test]
    async fn version_controlled_cycle_appends_ai_message() {
        let git = MockExecutor::new(vec![ok("true\n"), ok("+fn main() {}\n")]);
        let h = harness(
            FakeHost::default().with_read(Ok(Some(RemoteDocument {
                text: "previous".into(),
                revision: Some("T1".into()),
            }))),
            git,
            MockClient::ok("Add entry point"),
            ScriptedOperator::default(),
            MessageMode::Ai,
            None,
        );

        let outcome = h.orchestrator.run_cycle().await.unwrap();

        assert!(matches!(
            outcome,
            CycleOutcome::Committed { source_kind: SourceKind::VersionControlled, .. }
        ));
        assert_eq!(h.host.put_requests()[0].revision.as_deref(), Some("T1"));
    }

    #[tokio::test]
    async fn empty_staged_diff_is_no_changes() {
        let git = MockExecutor::new(vec![ok("true\n"), ok("")]);
        let h = harness(
            FakeHost::default(),
            git,
            MockClient::ok("unused"),
            ScriptedOperator::default(),
            MessageMode::Ai,
            None,
        );

        assert_eq!(h.orchestrator.run_cycle().await.unwrap(), CycleOutcome::NoChanges);
        assert_eq!(h.host.read_count(), 0);
    }

    #[tokio::test]
    async fn ai_failure_still_commits_with_fallback_message() {
        let git = MockExecutor::new(vec![ok("true\n"), ok("+x\n")]);
        let h = harness(
            FakeHost::default(),
            git,
            MockClient::err(AiCommitError::ClientError("connection refused".into())),
            ScriptedOperator::default(),
            MessageMode::Ai,
            None,
        );

        match h.orchestrator.run_cycle().await.unwrap() {
            CycleOutcome::Committed { message, .. } => assert!(message.contains("(fallback)")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    // ── Short circuits ──

    #[tokio::test]
    async fn declined_branch_halts_before_capture() {
        let git = MockExecutor::new(Vec::new());
        let h = harness(
            FakeHost::default().with_branch(Ok("develop".into())),
            git.clone(),
            MockClient::ok("unused"),
            ScriptedOperator::new(false, None),
            MessageMode::Ai,
            None,
        );

        let outcome = h.orchestrator.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::BranchRejected { branch: "develop".into() });
        assert!(git.calls().is_empty());
        assert_eq!(h.operator.prompts().len(), 1);
    }

    #[tokio::test]
    async fn manual_mode_without_input_fails_before_append() {
        let git = MockExecutor::new(vec![ok("true\n"), ok("+x\n")]);
        let h = harness(
            FakeHost::default(),
            git,
            MockClient::ok("unused"),
            ScriptedOperator::new(true, None),
            MessageMode::Manual,
            None,
        );

        assert_eq!(h.orchestrator.run_cycle().await.unwrap_err(), CycleError::MissingMessage);
        assert!(h.host.put_requests().is_empty());
    }

    #[tokio::test]
    async fn missing_credentials_fail_as_auth_error() {
        let h = harness(
            FakeHost::default(),
            MockExecutor::new(Vec::new()),
            MockClient::ok("unused"),
            ScriptedOperator::default(),
            MessageMode::Ai,
            None,
        );
        let orchestrator = CommitOrchestrator {
            identity: Arc::new(FixedIdentity(None)),
            ..h.orchestrator
        };

        let error = orchestrator.run_cycle().await.unwrap_err();
        assert_eq!(error.code(), "AUTH_FAILED");
    }

    #[tokio::test]
    async fn remote_write_failure_surfaces_backend_detail() {
        let git = MockExecutor::new(vec![ok("true\n"), ok("+x\n")]);
        let h = harness(
            FakeHost::default().with_write(Err(HostError::Status {
                status: 403,
                message: Some("Resource not accessible".into()),
            })),
            git,
            MockClient::ok("msg"),
            ScriptedOperator::default(),
            MessageMode::Ai,
            None,
        );

        assert_eq!(
            h.orchestrator.run_cycle().await.unwrap_err(),
            CycleError::RemoteWrite { detail: "Resource not accessible".into() }
        );
    }

    // ── State ──

    #[tokio::test]
    async fn overlapping_cycle_is_skipped() {
        let h = harness(
            FakeHost::default(),
            MockExecutor::new(Vec::new()),
            MockClient::ok("unused"),
            ScriptedOperator::default(),
            MessageMode::Ai,
            None,
        );

        let _held = h.orchestrator.state.try_lock().unwrap();
        assert_eq!(h.orchestrator.run_cycle().await.unwrap(), CycleOutcome::Skipped);
    }

    #[tokio::test]
    async fn toggle_mode_flips_between_ai_and_manual() {
        let h = harness(
            FakeHost::default(),
            MockExecutor::new(Vec::new()),
            MockClient::ok("unused"),
            ScriptedOperator::default(),
            MessageMode::Manual,
            None,
        );

        assert_eq!(h.orchestrator.toggle_mode().await, MessageMode::Ai);
        assert_eq!(h.orchestrator.mode().await, MessageMode::Ai);
        assert_eq!(h.orchestrator.toggle_mode().await, MessageMode::Manual);
        assert_eq!(h.orchestrator.interval().await, HOUR);
    }

    #[tokio::test]
    async fn mode_change_between_cycles_applies_to_the_next_message() {
        let git = MockExecutor::new(vec![ok("true\n"), ok("+x\n"), ok("true\n"), ok("+y\n")]);
        let h = harness(
            FakeHost::default(),
            git,
            MockClient::ok("Add y"),
            ScriptedOperator::new(true, Some("Manual entry")),
            MessageMode::Manual,
            None,
        );

        h.orchestrator.run_cycle().await.unwrap();
        assert!(h.orchestrator.follow_mode(MessageMode::Ai).await);
        assert!(!h.orchestrator.follow_mode(MessageMode::Ai).await);
        h.orchestrator.run_cycle().await.unwrap();

        let puts = h.host.put_requests();
        assert_eq!(puts.len(), 2);
        assert!(puts[0].text.ends_with("Manual entry"), "{}", puts[0].text);
        assert!(puts[1].text.ends_with("Add y"), "{}", puts[1].text);
        assert_eq!(h.operator.prompts().len(), 1);
    }
}
