// `autolog config`: print the effective settings. Tokens are never shown.

use std::path::PathBuf;

use autolog_daemon::config::{global_config_path, workspace_config_path, RedactionPolicy};
use autolog_daemon::message::MessageMode;
use clap::Args;
use serde::Serialize;

use crate::output::{self, OutputFormat};
use crate::session::Session;

#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Workspace root (defaults to the current directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub workspace_root: PathBuf,
    pub global_config: Option<PathBuf>,
    pub workspace_config: PathBuf,
    pub github_user: Option<String>,
    pub repository_name: String,
    pub log_path: String,
    pub api_base_url: String,
    pub include_unstaged: bool,
    pub interval_minutes: u64,
    pub message_mode: MessageMode,
    pub conflict_retries: u32,
    pub ai_redaction: RedactionPolicy,
    pub ai_base_url: String,
    pub ai_model: String,
    pub ai_token_configured: bool,
}

impl EffectiveConfig {
    pub fn from_session(session: &Session) -> Self {
        let workspace = &session.workspace;
        Self {
            workspace_root: session.root.clone(),
            global_config: global_config_path(),
            workspace_config: workspace_config_path(&session.root),
            github_user: session.global.github_user.clone(),
            repository_name: workspace.repository_name.clone(),
            log_path: workspace.log_path.clone(),
            api_base_url: workspace.api_base_url.clone(),
            include_unstaged: workspace.include_unstaged,
            interval_minutes: workspace.interval_minutes,
            message_mode: MessageMode::from_auto_commit(workspace.auto_commit),
            conflict_retries: workspace.conflict_retries,
            ai_redaction: workspace.ai_redaction,
            ai_base_url: session.global.ai.base_url.clone(),
            ai_model: session.global.ai.model.clone(),
            ai_token_configured: session.ai_token().is_some(),
        }
    }
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let session = Session::load(args.root)?;
    let effective = EffectiveConfig::from_session(&session);
    output::print_output(format, &effective, format_human)?;
    Ok(())
}

fn format_human(config: &EffectiveConfig) -> String {
    let optional_path = |path: &Option<PathBuf>| {
        path.as_ref().map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
    };
    let redaction = match config.ai_redaction {
        RedactionPolicy::Full => "full",
        RedactionPolicy::Redacted => "redacted",
    };

    [
        format!("workspace:         {}", config.workspace_root.display()),
        format!("global config:     {}", optional_path(&config.global_config)),
        format!("workspace config:  {}", config.workspace_config.display()),
        format!(
            "github user:       {}",
            config.github_user.as_deref().unwrap_or("(keychain or env)")
        ),
        format!("repository:        {}", config.repository_name),
        format!("log path:          {}", config.log_path),
        format!("api base url:      {}", config.api_base_url),
        format!("include unstaged:  {}", config.include_unstaged),
        format!("interval:          {} min", config.interval_minutes),
        format!("message mode:      {}", config.message_mode.as_str()),
        format!("conflict retries:  {}", config.conflict_retries),
        format!("ai redaction:      {redaction}"),
        format!("ai endpoint:       {} ({})", config.ai_base_url, config.ai_model),
        format!("ai token:          {}", if config.ai_token_configured { "set" } else { "unset" }),
    ]
    .join("\n")
}
