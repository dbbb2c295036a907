// Local configuration files.
//
// Global config: `~/.autolog/config.toml`
// Workspace config: `<workspace>/.autolog/workspace.toml`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::security::{ensure_owner_only_dir, ensure_owner_only_file};

pub const DEFAULT_REPOSITORY_NAME: &str = "auto-log";
pub const DEFAULT_LOG_PATH: &str = "commit_log.txt";
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_AI_BASE_URL: &str = "https://models.inference.ai.azure.com";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o";
pub const DEFAULT_INTERVAL_MINUTES: u64 = 60;

/// Environment variable holding the primary AI credential.
pub const AI_TOKEN_ENV: &str = "HF_API_TOKEN";

/// Root directory for autolog global state: `~/.autolog/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".autolog"))
}

/// Path to the global config file: `~/.autolog/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

/// Path to the workspace config file: `<root>/.autolog/workspace.toml`.
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".autolog").join("workspace.toml")
}

// ── Global config ──────────────────────────────────────────────────

/// Per-installation configuration at `~/.autolog/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Hosting account that owns the log repository.
    pub github_user: Option<String>,
    /// AI settings.
    pub ai: AiConfig,
}

impl GlobalConfig {
    /// Load from `~/.autolog/config.toml`. Returns defaults if the file
    /// doesn't exist or can't be parsed; the latter is logged.
    pub fn load() -> Self {
        let Some(path) = global_config_path() else {
            return Self::default();
        };
        load_or_warn(&path)
    }

    /// Like [`GlobalConfig::load`], but an unreadable or malformed file is
    /// an error. A missing file or home directory still yields defaults.
    pub fn try_load() -> Result<Self, ConfigError> {
        match global_config_path() {
            Some(path) => load_if_present(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save to `~/.autolog/config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = global_config_path().ok_or_else(|| {
            ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine home directory",
            ))
        })?;
        self.save_to(&path)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        save_toml(self, path)
    }
}

/// AI completion service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AiConfig {
    /// Base URL of the chat-completions compatible endpoint.
    pub base_url: String,
    /// Model to request.
    pub model: String,
    /// Secondary credential source, used when `HF_API_TOKEN` is unset.
    pub api_token: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AI_BASE_URL.into(),
            model: DEFAULT_AI_MODEL.into(),
            api_token: None,
        }
    }
}

impl AiConfig {
    /// Resolve the AI access token: the environment value captured at
    /// process start wins over the configured one. Blank values count as
    /// missing.
    pub fn resolve_token(&self, env_token: Option<&str>) -> Option<String> {
        env_token
            .filter(|token| !token.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.api_token.clone().filter(|token| !token.trim().is_empty()))
    }
}

// ── Workspace config ───────────────────────────────────────────────

/// Per-workspace configuration at `<root>/.autolog/workspace.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Name of the remote repository holding the commit log.
    pub repository_name: String,
    /// Append the unstaged diff after the staged one.
    pub include_unstaged: bool,
    /// Minutes between scheduled cycles; also the staleness window for
    /// snapshot capture.
    pub interval_minutes: u64,
    /// Start in AI message mode instead of manual entry.
    pub auto_commit: bool,
    /// Document path of the journal inside the log repository.
    pub log_path: String,
    /// Hosting API base URL.
    pub api_base_url: String,
    /// How many times a rejected write re-reads and retries (0 = surface).
    pub conflict_retries: u32,
    /// What part of the change text may be sent to the AI service.
    pub ai_redaction: RedactionPolicy,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            repository_name: DEFAULT_REPOSITORY_NAME.into(),
            include_unstaged: false,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            auto_commit: false,
            log_path: DEFAULT_LOG_PATH.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            conflict_retries: 0,
            ai_redaction: RedactionPolicy::Full,
        }
    }
}

impl WorkspaceConfig {
    /// Load from `<root>/.autolog/workspace.toml`. Returns defaults if
    /// the file doesn't exist or can't be parsed; the latter is logged.
    pub fn load(workspace_root: &Path) -> Self {
        load_or_warn(&workspace_config_path(workspace_root))
    }

    /// Like [`WorkspaceConfig::load`], but an unreadable or malformed file
    /// is an error. A missing file still yields defaults.
    pub fn try_load(workspace_root: &Path) -> Result<Self, ConfigError> {
        load_if_present(&workspace_config_path(workspace_root))
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save to `<root>/.autolog/workspace.toml`.
    pub fn save(&self, workspace_root: &Path) -> Result<(), ConfigError> {
        let path = workspace_config_path(workspace_root);
        self.save_to(&path)
    }

    /// Save to a specific path (creates parent directories).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        save_toml(self, path)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

/// Redaction policy for AI commit messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RedactionPolicy {
    /// Send the change text as captured.
    #[default]
    Full,
    /// Strip credentials and keys before sending.
    Redacted,
}

fn load_if_present<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).map_err(ConfigError::Parse),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(error) => Err(ConfigError::Io(error)),
    }
}

fn load_or_warn<T: DeserializeOwned + Default>(path: &Path) -> T {
    load_if_present(path).unwrap_or_else(|error| {
        warn!(path = %path.display(), %error, "ignoring unusable config file; using defaults");
        T::default()
    })
}

fn save_toml<T: Serialize>(value: &T, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        ensure_owner_only_dir(parent)
            .map_err(|error| ConfigError::Io(std::io::Error::other(error.to_string())))?;
    }
    let contents = toml::to_string_pretty(value).map_err(ConfigError::Serialize)?;
    std::fs::write(path, contents).map_err(ConfigError::Io).and_then(|_| {
        ensure_owner_only_file(path)
            .map_err(|error| ConfigError::Io(std::io::Error::other(error.to_string())))
    })
}

// ── Errors ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config I/O error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
            Self::Serialize(e) => write!(f, "config serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
