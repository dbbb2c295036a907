// Periodic and on-demand commit cycles.
//
// One background task owns the loop. It waits for the next tick, a manual
// trigger, or shutdown, then runs a single cycle to completion before
// waiting again. Ticks missed while a cycle runs are dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::CycleError;
use crate::git::worker::CommandExecutor;
use crate::orchestrator::{CommitOrchestrator, CycleOutcome};
use crate::BoxFuture;

/// Anything that can run one commit cycle.
pub trait CycleRunner: Send + Sync + 'static {
    fn run_cycle(&self) -> BoxFuture<'_, Result<CycleOutcome, CycleError>>;
}

impl<E: CommandExecutor + 'static> CycleRunner for CommitOrchestrator<E> {
    fn run_cycle(&self) -> BoxFuture<'_, Result<CycleOutcome, CycleError>> {
        Box::pin(CommitOrchestrator::run_cycle(self))
    }
}

/// Shortest period the loop accepts.
pub const MIN_INTERVAL: Duration = Duration::from_secs(60);

pub struct Scheduler;

impl Scheduler {
    /// Spawn the cycle loop. The first periodic cycle runs one full
    /// `interval` after start. Periods below [`MIN_INTERVAL`] are raised to it.
    pub fn start<R: CycleRunner>(runner: Arc<R>, interval: Duration) -> SchedulerHandle {
        let interval = interval.max(MIN_INTERVAL);
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            scheduler_loop(runner, interval, trigger_rx, shutdown_rx).await;
        });

        info!(interval_secs = interval.as_secs(), "scheduler started");
        SchedulerHandle { task, trigger_tx, shutdown_tx }
    }
}

/// Handle for the scheduler task. Dropping it stops the loop after the
/// current cycle.
pub struct SchedulerHandle {
    task: JoinHandle<()>,
    trigger_tx: mpsc::Sender<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl SchedulerHandle {
    /// Request an immediate cycle. Returns `false` when one is already
    /// pending, in which case the requests coalesce.
    pub fn trigger(&self) -> bool {
        self.trigger_tx.try_send(()).is_ok()
    }

    /// Stop scheduling and wait for the in-flight cycle, if any, to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(error) = self.task.await {
            warn!(%error, "scheduler task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn scheduler_loop<R: CycleRunner>(
    runner: Arc<R>,
    interval: Duration,
    mut trigger_rx: mpsc::Receiver<()>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => debug!("scheduled cycle"),
            Some(()) = trigger_rx.recv() => debug!("triggered cycle"),
            _ = shutdown_rx.changed() => {
                debug!("scheduler shutting down");
                break;
            }
        }

        if *shutdown_rx.borrow() {
            break;
        }

        match runner.run_cycle().await {
            Ok(outcome) => debug!(?outcome, "cycle finished"),
            Err(error) => warn!(code = error.code(), %error, "cycle failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const INTERVAL: Duration = Duration::from_secs(60);

    /// Reports each cycle on a channel and replays scripted results.
    struct RecordingRunner {
        results: Mutex<VecDeque<Result<CycleOutcome, CycleError>>>,
        ran_tx: mpsc::UnboundedSender<Instant>,
    }

    impl RecordingRunner {
        fn new(
            results: Vec<Result<CycleOutcome, CycleError>>,
        ) -> (Arc<Self>, mpsc::UnboundedReceiver<Instant>) {
            let (ran_tx, ran_rx) = mpsc::unbounded_channel();
            (Arc::new(Self { results: Mutex::new(results.into()), ran_tx }), ran_rx)
        }
    }

    impl CycleRunner for RecordingRunner {
        fn run_cycle(&self) -> BoxFuture<'_, Result<CycleOutcome, CycleError>> {
            let _ = self.ran_tx.send(Instant::now());
            let result =
                self.results.lock().unwrap().pop_front().unwrap_or(Ok(CycleOutcome::NoChanges));
            Box::pin(async move { result })
        }
    }

    #[tokio::test]
    async fn first_periodic_cycle_waits_a_full_interval() {
        time::pause();
        let started = Instant::now();
        let (runner, mut ran_rx) = RecordingRunner::new(Vec::new());
        let handle = Scheduler::start(runner, INTERVAL);

        let first = ran_rx.recv().await.unwrap();
        assert!(first - started >= INTERVAL);

        let second = ran_rx.recv().await.unwrap();
        assert!(second - first >= INTERVAL);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn trigger_runs_a_cycle_before_the_next_tick() {
        time::pause();
        let started = Instant::now();
        let (runner, mut ran_rx) = RecordingRunner::new(Vec::new());
        let handle = Scheduler::start(runner, INTERVAL);

        assert!(handle.trigger());
        let ran = ran_rx.recv().await.unwrap();
        assert!(ran - started < INTERVAL);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn short_intervals_are_raised_to_the_minimum() {
        time::pause();
        let started = Instant::now();
        let (runner, mut ran_rx) = RecordingRunner::new(Vec::new());
        let handle = Scheduler::start(runner, Duration::ZERO);

        let first = ran_rx.recv().await.unwrap();
        assert!(first - started >= MIN_INTERVAL);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn pending_triggers_coalesce() {
        time::pause();
        let (runner, _ran_rx) = RecordingRunner::new(Vec::new());
        let handle = Scheduler::start(runner, INTERVAL);

        assert!(handle.trigger());
        assert!(!handle.trigger());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn failed_cycle_does_not_stop_the_loop() {
        time::pause();
        let (runner, mut ran_rx) = RecordingRunner::new(vec![
            Err(CycleError::RemoteRead { detail: "503".into() }),
            Ok(CycleOutcome::NoChanges),
        ]);
        let handle = Scheduler::start(runner, INTERVAL);

        ran_rx.recv().await.unwrap();
        ran_rx.recv().await.unwrap();
        assert!(!handle.is_finished());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_prevents_further_cycles() {
        time::pause();
        let (runner, mut ran_rx) = RecordingRunner::new(Vec::new());
        let handle = Scheduler::start(runner, INTERVAL);

        handle.shutdown().await;
        time::advance(INTERVAL * 3).await;

        assert!(ran_rx.try_recv().is_err());
    }
}
