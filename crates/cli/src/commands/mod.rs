// CLI subcommand dispatch.

use std::future::Future;

use anyhow::Context;
use clap::Subcommand;

use crate::output::{self, OutputFormat};

pub mod config;
pub mod history;
pub mod login;
pub mod logout;
pub mod once;
pub mod start;
pub mod toggle_ai;

#[derive(Subcommand)]
pub enum Command {
    /// Run commit cycles on the configured interval until interrupted
    Start(start::StartArgs),
    /// Run a single commit cycle now
    Once(once::OnceArgs),
    /// Switch between AI-generated and typed commit messages
    ToggleAi(toggle_ai::ToggleAiArgs),
    /// Show recent commits in the log repository
    History(history::HistoryArgs),
    /// Store hosting credentials in the OS keychain
    Login(login::LoginArgs),
    /// Remove hosting credentials from the OS keychain
    Logout(logout::LogoutArgs),
    /// Print the effective settings
    Config(config::ConfigArgs),
}

impl Command {
    fn json_flag(&self) -> bool {
        match self {
            Self::Start(_) => false,
            Self::Once(args) => args.json,
            Self::ToggleAi(args) => args.json,
            Self::History(args) => args.json,
            Self::Login(args) => args.json,
            Self::Logout(args) => args.json,
            Self::Config(args) => args.json,
        }
    }
}

/// Run a subcommand. Failures are reported on stderr before returning.
pub fn run(cmd: Command) -> anyhow::Result<()> {
    let format = OutputFormat::detect(cmd.json_flag());
    let result = match cmd {
        Command::Start(args) => start::run(args),
        Command::Once(args) => once::run(args),
        Command::ToggleAi(args) => toggle_ai::run(args),
        Command::History(args) => history::run(args),
        Command::Login(args) => login::run(args),
        Command::Logout(args) => logout::run(args),
        Command::Config(args) => config::run(args),
    };
    if let Err(error) = &result {
        output::print_anyhow_error(format, error);
    }
    result
}

/// Drive `future` on a fresh current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    Ok(runtime.block_on(future))
}
