// `autolog once`: run a single commit cycle and report the outcome.

use std::path::PathBuf;
use std::sync::Arc;

use autolog_daemon::orchestrator::CycleOutcome;
use clap::Args;

use crate::output::{self, OutputFormat};
use crate::session::Session;
use crate::terminal::TerminalOperator;

#[derive(Debug, Args)]
pub struct OnceArgs {
    /// File open in the editor; used when the workspace is not a git repository.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Workspace root (defaults to the current directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: OnceArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let session = Session::load(args.root)?;
    let orchestrator = session.orchestrator(
        Arc::new(TerminalOperator),
        args.file,
        session.workspace.interval(),
    )?;

    let outcome = super::block_on(orchestrator.run_cycle())??;
    output::print_output(format, &outcome, format_outcome)?;
    Ok(())
}

pub(crate) fn format_outcome(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Committed { message, source_kind, revision } => {
            let mut out = format!("Logged commit from {}:\n{message}", source_kind.as_str());
            if let Some(revision) = revision {
                out.push_str(&format!("\nrevision: {revision}"));
            }
            out
        }
        CycleOutcome::NoChanges => "No changes to commit.".to_string(),
        CycleOutcome::BranchRejected { branch } => {
            format!("Stopped: default branch \"{branch}\" was not confirmed.")
        }
        CycleOutcome::Skipped => "A commit cycle is already running.".to_string(),
    }
}
