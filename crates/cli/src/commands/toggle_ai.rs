// `autolog toggle-ai`: flip `auto_commit` in the workspace config.

use std::path::{Path, PathBuf};

use anyhow::Context;
use autolog_daemon::config::{workspace_config_path, WorkspaceConfig};
use autolog_daemon::message::MessageMode;
use clap::Args;
use serde::Serialize;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ToggleAiArgs {
    /// Workspace root (defaults to the current directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleResult {
    pub mode: MessageMode,
    pub config_path: PathBuf,
}

pub fn run(args: ToggleAiArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir().context("failed to resolve the current directory")?,
    };

    let result = toggle(&root)?;
    output::print_output(format, &result, |r| match r.mode {
        MessageMode::Ai => "AI commit messages enabled.".to_string(),
        MessageMode::Manual => {
            "AI commit messages disabled; you will be asked for a message.".to_string()
        }
    })?;
    Ok(())
}

pub(crate) fn toggle(root: &Path) -> anyhow::Result<ToggleResult> {
    let path = workspace_config_path(root);
    let mut config = WorkspaceConfig::try_load(root)
        .with_context(|| format!("failed to read {}", path.display()))?;

    config.auto_commit = !config.auto_commit;
    config.save_to(&path).with_context(|| format!("failed to write {}", path.display()))?;

    Ok(ToggleResult { mode: MessageMode::from_auto_commit(config.auto_commit), config_path: path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn toggle_creates_config_with_ai_enabled() {
        let dir = tempdir().unwrap();

        let result = toggle(dir.path()).unwrap();

        assert_eq!(result.mode, MessageMode::Ai);
        assert!(WorkspaceConfig::load(dir.path()).auto_commit);
    }

    #[test]
    fn toggle_twice_restores_manual_and_keeps_other_fields() {
        let dir = tempdir().unwrap();
        let mut config = WorkspaceConfig::default();
        config.repository_name = "journal".into();
        config.save(dir.path()).unwrap();

        toggle(dir.path()).unwrap();
        let result = toggle(dir.path()).unwrap();

        assert_eq!(result.mode, MessageMode::Manual);
        let reloaded = WorkspaceConfig::load(dir.path());
        assert!(!reloaded.auto_commit);
        assert_eq!(reloaded.repository_name, "journal");
    }

    #[test]
    fn unreadable_config_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = workspace_config_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "auto_commit = [").unwrap();

        assert!(toggle(dir.path()).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "auto_commit = [");
    }
}
