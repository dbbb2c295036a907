// `autolog start`: run commit cycles on a timer until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use autolog_daemon::config::WorkspaceConfig;
use autolog_daemon::error::CycleError;
use autolog_daemon::message::MessageMode;
use autolog_daemon::orchestrator::{CommitOrchestrator, CycleOutcome};
use autolog_daemon::scheduler::{CycleRunner, Scheduler};
use autolog_daemon::BoxFuture;
use clap::Args;
use tracing::{info, warn};

use crate::exit_code::UsageError;
use crate::session::Session;
use crate::terminal::TerminalOperator;

#[derive(Debug, Args)]
pub struct StartArgs {
    /// File open in the editor; used when the workspace is not a git repository.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Override the configured cycle interval, in minutes.
    #[arg(long)]
    interval_minutes: Option<u64>,

    /// Run the first cycle immediately instead of after one interval.
    #[arg(long)]
    now: bool,

    /// Workspace root (defaults to the current directory).
    #[arg(long)]
    root: Option<PathBuf>,
}

pub fn run(args: StartArgs) -> anyhow::Result<()> {
    let session = Session::load(args.root)?;
    let (runner, interval) = build_runner(&session, args.file, args.interval_minutes)?;
    super::block_on(serve(runner, interval, args.now))?
}

/// Build the cycle runner and the period it runs at. The override, when
/// given, is also the staleness window the orchestrator judges edits by.
fn build_runner(
    session: &Session,
    file: Option<PathBuf>,
    interval_minutes: Option<u64>,
) -> anyhow::Result<(ConfiguredModeRunner, Duration)> {
    let minutes = interval_minutes.unwrap_or(session.workspace.interval_minutes);
    let interval = validate_interval(minutes)?;

    let orchestrator = session.orchestrator(Arc::new(TerminalOperator), file, interval)?;
    let runner =
        ConfiguredModeRunner { orchestrator: Arc::new(orchestrator), root: session.root.clone() };
    Ok((runner, interval))
}

fn validate_interval(minutes: u64) -> Result<Duration, UsageError> {
    if minutes == 0 {
        return Err(UsageError("interval must be at least one minute".into()));
    }
    Ok(Duration::from_secs(minutes.saturating_mul(60)))
}

/// Re-reads `auto_commit` from the workspace config before every cycle, so
/// `autolog toggle-ai` takes effect in a running session.
struct ConfiguredModeRunner {
    orchestrator: Arc<CommitOrchestrator>,
    root: PathBuf,
}

impl ConfiguredModeRunner {
    async fn sync_mode(&self) {
        match WorkspaceConfig::try_load(&self.root) {
            Ok(config) => {
                let mode = MessageMode::from_auto_commit(config.auto_commit);
                self.orchestrator.follow_mode(mode).await;
            }
            Err(error) => {
                warn!(%error, "could not re-read workspace config; keeping the message mode");
            }
        }
    }
}

impl CycleRunner for ConfiguredModeRunner {
    fn run_cycle(&self) -> BoxFuture<'_, Result<CycleOutcome, CycleError>> {
        Box::pin(async move {
            self.sync_mode().await;
            self.orchestrator.run_cycle().await
        })
    }
}

async fn serve(
    runner: ConfiguredModeRunner,
    interval: Duration,
    run_now: bool,
) -> anyhow::Result<()> {
    let handle = Scheduler::start(Arc::new(runner), interval);
    if run_now {
        handle.trigger();
    }

    info!(interval_minutes = interval.as_secs() / 60, "watching for changes; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;

    info!("stopping after the current cycle");
    handle.shutdown().await;
    Ok(())
}
