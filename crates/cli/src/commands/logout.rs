// `autolog logout`: clear stored hosting credentials.

use autolog_daemon::security::{delete_secret, SecretSlot};
use clap::Args;
use serde::Serialize;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct LogoutArgs {
    /// Force JSON output.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutResult {
    pub cleared: bool,
}

pub fn run(args: LogoutArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);

    delete_secret(SecretSlot::GithubToken)?;
    delete_secret(SecretSlot::GithubUser)?;

    output::print_output(format, &LogoutResult { cleared: true }, |_| {
        "Stored credentials removed.".to_string()
    })?;
    Ok(())
}
