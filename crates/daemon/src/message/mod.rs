// Commit message selection: AI-generated or typed by the operator.

pub mod ai;
pub mod client;

use std::fmt::Display;
use std::sync::Arc;

use autolog_common::types::ChangeSet;
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use self::ai::{generate_commit_message_with_fallback, AiCommitClient};
use crate::config::RedactionPolicy;
use crate::error::CycleError;
use crate::operator::Operator;

pub const MANUAL_PROMPT: &str = "Commit message:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageMode {
    Ai,
    Manual,
}

impl MessageMode {
    pub fn from_auto_commit(auto_commit: bool) -> Self {
        if auto_commit {
            Self::Ai
        } else {
            Self::Manual
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Ai => Self::Manual,
            Self::Manual => Self::Ai,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Manual => "manual",
        }
    }
}

pub struct CommitMessageProvider {
    ai: Arc<dyn AiCommitClient>,
    operator: Arc<dyn Operator>,
    redaction: RedactionPolicy,
}

impl CommitMessageProvider {
    pub fn new(
        ai: Arc<dyn AiCommitClient>,
        operator: Arc<dyn Operator>,
        redaction: RedactionPolicy,
    ) -> Self {
        Self { ai, operator, redaction }
    }

    pub async fn provide(
        &self,
        mode: MessageMode,
        change: &ChangeSet,
    ) -> Result<String, CycleError> {
        self.provide_at(mode, change, &Local::now()).await
    }

    /// AI mode never fails; manual mode fails with `MissingMessage` when the
    /// operator cancels or enters nothing.
    pub async fn provide_at<Tz: TimeZone>(
        &self,
        mode: MessageMode,
        change: &ChangeSet,
        at: &DateTime<Tz>,
    ) -> Result<String, CycleError>
    where
        Tz::Offset: Display,
    {
        debug!(mode = mode.as_str(), "obtaining commit message");
        match mode {
            MessageMode::Ai => Ok(generate_commit_message_with_fallback(
                self.ai.as_ref(),
                &change.prompt_text(),
                self.redaction,
                at,
            )
            .await),
            MessageMode::Manual => self
                .operator
                .input(MANUAL_PROMPT)
                .await
                .map(|message| message.trim().to_string())
                .filter(|message| !message.is_empty())
                .ok_or(CycleError::MissingMessage),
        }
    }
}
