// Chat-completions client used for AI commit messages.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::ai::{AiCommitClient, AiCommitError};
use crate::config::AiConfig;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f32 = 1.0;
const TOP_P: f32 = 1.0;
const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    model: &'a str,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    model: String,
    token: Option<String>,
}

impl ChatCompletionsClient {
    /// `token` is the resolved credential; `None` makes every call fail with
    /// [`AiCommitError::MissingToken`].
    pub fn new(config: &AiConfig, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build AI HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl AiCommitClient for ChatCompletionsClient {
    fn generate(
        &self,
        system: &str,
        user_prompt: &str,
    ) -> Pin<Box<dyn Future<Output = Result<String, AiCommitError>> + Send>> {
        let Some(token) = self.token.clone() else {
            return Box::pin(async { Err(AiCommitError::MissingToken) });
        };

        let request = ChatRequest {
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "developer", content: user_prompt },
            ],
            model: &self.model,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            max_tokens: MAX_TOKENS,
        };
        let body = match serde_json::to_vec(&request) {
            Ok(body) => body,
            Err(error) => {
                let error = AiCommitError::ClientError(error.to_string());
                return Box::pin(async move { Err(error) });
            }
        };

        let pending = self
            .client
            .post(self.endpoint.as_str())
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send();

        Box::pin(async move {
            let response =
                pending.await.map_err(|error| AiCommitError::ClientError(error.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(AiCommitError::ClientError(format!("HTTP {status}: {}", text.trim())));
            }

            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|error| {
                    AiCommitError::ClientError(format!("malformed response: {error}"))
                })?;

            reply_content(parsed)
        })
    }
}

/// Content of the first choice. A missing choice or message is malformed;
/// a null content is an empty reply.
fn reply_content(response: ChatResponse) -> Result<String, AiCommitError> {
    let reply = response.choices.into_iter().next().and_then(|choice| choice.message).ok_or_else(
        || AiCommitError::ClientError("malformed response: no choices[0].message".to_string()),
    )?;
    Ok(reply.content.unwrap_or_default())
}
