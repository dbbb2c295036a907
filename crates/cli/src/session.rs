// Effective configuration for one invocation and the engine built from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use autolog_daemon::capture::ChangeCaptureService;
use autolog_daemon::config::{workspace_config_path, GlobalConfig, WorkspaceConfig, AI_TOKEN_ENV};
use autolog_daemon::git::worker::GitWorker;
use autolog_daemon::identity::{IdentityProvider, StoredIdentityProvider};
use autolog_daemon::message::client::ChatCompletionsClient;
use autolog_daemon::message::{CommitMessageProvider, MessageMode};
use autolog_daemon::operator::{Operator, SharedActiveFile};
use autolog_daemon::orchestrator::{CommitOrchestrator, OrchestratorState};
use autolog_daemon::remote::{BranchSafetyGuard, GitHubClient, RemoteLogAppender, RepositoryHost};

pub struct Session {
    pub root: PathBuf,
    pub global: GlobalConfig,
    pub workspace: WorkspaceConfig,
    ai_env_token: Option<String>,
}

impl Session {
    /// Load configuration for `root`, or the current directory.
    pub fn load(root: Option<PathBuf>) -> anyhow::Result<Self> {
        let root = match root {
            Some(root) => root,
            None => std::env::current_dir().context("failed to resolve the current directory")?,
        };
        let global = GlobalConfig::try_load().context("failed to load the global config")?;
        let workspace = WorkspaceConfig::try_load(&root).with_context(|| {
            format!("failed to load {}", workspace_config_path(&root).display())
        })?;
        Ok(Self::from_parts(root, global, workspace, std::env::var(AI_TOKEN_ENV).ok()))
    }

    pub fn from_parts(
        root: PathBuf,
        global: GlobalConfig,
        workspace: WorkspaceConfig,
        ai_env_token: Option<String>,
    ) -> Self {
        Self { root, global, workspace, ai_env_token }
    }

    pub fn ai_token(&self) -> Option<String> {
        self.global.ai.resolve_token(self.ai_env_token.as_deref())
    }

    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        Arc::new(StoredIdentityProvider::new(
            self.global.github_user.clone(),
            self.workspace.repository_name.clone(),
        ))
    }

    pub fn host(&self) -> anyhow::Result<Arc<GitHubClient>> {
        let client = GitHubClient::new(&self.workspace.api_base_url)
            .context("failed to build the hosting API client")?;
        Ok(Arc::new(client))
    }

    /// Resolve an editor-supplied path against the workspace root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Assemble a commit orchestrator wired to the real collaborators.
    /// `interval` is both the cycle period and the snapshot staleness window.
    pub fn orchestrator(
        &self,
        operator: Arc<dyn Operator>,
        active_file: Option<PathBuf>,
        interval: Duration,
    ) -> anyhow::Result<CommitOrchestrator> {
        let host: Arc<dyn RepositoryHost> = self.host()?;
        let ai = ChatCompletionsClient::new(&self.global.ai, self.ai_token())
            .context("failed to build the AI client")?;

        let active_file = active_file.map(|path| self.resolve_path(&path));
        let capture = ChangeCaptureService::new(
            GitWorker::new(self.root.clone()),
            self.workspace.include_unstaged,
            Arc::new(SharedActiveFile::new(active_file)),
        );
        let messages =
            CommitMessageProvider::new(Arc::new(ai), operator.clone(), self.workspace.ai_redaction);
        let log = RemoteLogAppender::new(
            host.clone(),
            self.workspace.log_path.clone(),
            self.workspace.conflict_retries,
        );
        let state = OrchestratorState::new(
            MessageMode::from_auto_commit(self.workspace.auto_commit),
            interval,
        );

        Ok(CommitOrchestrator::new(
            self.identity(),
            BranchSafetyGuard::new(host, operator),
            capture,
            messages,
            log,
            state,
        ))
    }
}
