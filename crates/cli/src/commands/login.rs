// `autolog login`: store the hosting account and token in the OS keychain.
//
// The token is read from stdin, never from argv.

use anyhow::Context;
use autolog_daemon::identity::{FALLBACK_TOKEN_ENV, TOKEN_ENV, USER_ENV};
use autolog_daemon::security::{set_secret, SecretSlot};
use clap::Args;
use serde::Serialize;

use crate::exit_code::UsageError;
use crate::output::{self, OutputFormat};
use crate::terminal;

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Hosting account that owns the log repository.
    #[arg(long)]
    user: String,

    /// Force JSON output.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: String,
    pub stored: bool,
}

pub fn run(args: LoginArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let user = normalize_user(&args.user)?;
    let token = normalize_token(super::block_on(terminal::read_line(
        "Access token:".to_string(),
    ))?)?;

    set_secret(SecretSlot::GithubUser, &user).context("failed to store the account name")?;
    set_secret(SecretSlot::GithubToken, &token).context("failed to store the access token")?;

    for name in [USER_ENV, TOKEN_ENV, FALLBACK_TOKEN_ENV] {
        if std::env::var_os(name).is_some() {
            output::print_warning(
                format,
                "ENV_OVERRIDE",
                &format!("{name} is set and takes precedence over the keychain"),
            );
        }
    }

    let result = LoginResult { user, stored: true };
    output::print_output(format, &result, |r| format!("Logged in as {}.", r.user))?;
    Ok(())
}

fn normalize_user(user: &str) -> Result<String, UsageError> {
    let user = user.trim();
    if user.is_empty() {
        return Err(UsageError("--user must not be empty".into()));
    }
    Ok(user.to_string())
}

fn normalize_token(line: Option<String>) -> Result<String, UsageError> {
    line.map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| UsageError("no access token was provided".into()))
}
