// `autolog history`: list recent commits in the log repository.

use std::path::PathBuf;

use anyhow::Context;
use autolog_common::types::CommitSummary;
use autolog_daemon::remote::RepositoryHost;
use clap::Args;

use crate::output::{self, OutputFormat};
use crate::session::Session;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Maximum number of commits to list.
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Workspace root (defaults to the current directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: HistoryArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let session = Session::load(args.root)?;

    let commits = super::block_on(fetch(&session, args.limit))??;
    output::print_output(format, &commits, |c| format_history(c))?;
    Ok(())
}

async fn fetch(session: &Session, limit: usize) -> anyhow::Result<Vec<CommitSummary>> {
    let identity = session.identity().resolve()?;
    let host = session.host()?;
    host.list_commits(&identity, limit).await.context("failed to list commits")
}

fn format_history(commits: &[CommitSummary]) -> String {
    if commits.is_empty() {
        return "No commits yet.".to_string();
    }
    commits
        .iter()
        .map(|c| format!("{} - {} (by {})", c.date, c.message, c.author))
        .collect::<Vec<_>>()
        .join("\n")
}
