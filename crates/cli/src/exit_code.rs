// Consistent exit codes for the autolog CLI.
//
//   0  = success
//   1  = general error
//   2  = usage/argument error
//   11 = authentication error
//   12 = commit log changed concurrently
//   13 = hosting API read/write failure

use std::process;

use autolog_daemon::error::CycleError;
use autolog_daemon::identity::IdentityError;
use autolog_daemon::remote::HostError;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    Auth = 11,
    Conflict = 12,
    Network = 13,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(cycle_err) = cause.downcast_ref::<CycleError>() {
                return Self::from_cycle_code(cycle_err.code());
            }
            if cause.downcast_ref::<IdentityError>().is_some() {
                return Self::Auth;
            }
            if let Some(host_err) = cause.downcast_ref::<HostError>() {
                return match host_err.status() {
                    Some(401 | 403) => Self::Auth,
                    Some(409) => Self::Conflict,
                    _ => Self::Network,
                };
            }
            if cause.downcast_ref::<UsageError>().is_some() {
                return Self::Usage;
            }
        }

        Self::Error
    }

    /// Map a cycle error code to an exit code.
    pub fn from_cycle_code(code: &str) -> Self {
        match code {
            "AUTH_FAILED" => Self::Auth,
            "REMOTE_WRITE_CONFLICT" => Self::Conflict,
            "REMOTE_READ_FAILED" | "REMOTE_WRITE_FAILED" => Self::Network,
            _ => Self::Error,
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}

/// An argument or configuration value the command refuses to run with.
#[derive(Debug)]
pub struct UsageError(pub String);

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UsageError {}
