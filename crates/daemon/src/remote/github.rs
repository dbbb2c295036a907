// GitHub REST adapter for `RepositoryHost`.

use std::time::Duration;

use anyhow::{Context, Result};
use autolog_common::types::CommitSummary;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{HostError, PutContent, RemoteDocument, RepositoryHost};
use crate::identity::RepositoryIdentity;
use crate::BoxFuture;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const USER_AGENT_VALUE: &str = "autolog";
const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: Option<PutResponseContent>,
}

#[derive(Debug, Deserialize)]
struct PutResponseContent {
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    author: Option<CommitAuthor>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    date: Option<String>,
    name: Option<String>,
}

impl From<CommitItem> for CommitSummary {
    fn from(item: CommitItem) -> Self {
        let (date, author) = match item.commit.author {
            Some(author) => (author.date.unwrap_or_default(), author.name.unwrap_or_default()),
            None => (String::new(), String::new()),
        };
        CommitSummary { date, author, message: item.commit.message }
    }
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_base: Url,
}

impl GitHubClient {
    pub fn new(api_base_url: &str) -> Result<Self> {
        let api_base = Url::parse(api_base_url)
            .with_context(|| format!("invalid API base URL `{api_base_url}`"))?;
        if api_base.cannot_be_a_base() {
            anyhow::bail!("API base URL `{api_base_url}` cannot carry a path");
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GITHUB_JSON));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .context("failed to build GitHub HTTP client")?;

        Ok(Self { client, api_base })
    }

    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn repository_url(&self, identity: &RepositoryIdentity) -> Url {
        self.endpoint(["repos", identity.owner.as_str(), identity.repository.as_str()])
    }

    fn contents_url(&self, identity: &RepositoryIdentity, path: &str) -> Url {
        let segments = ["repos", identity.owner.as_str(), identity.repository.as_str(), "contents"]
            .into_iter()
            .chain(path.split('/').filter(|segment| !segment.is_empty()));
        self.endpoint(segments)
    }
}

impl RepositoryHost for GitHubClient {
    fn default_branch<'a>(
        &'a self,
        identity: &'a RepositoryIdentity,
    ) -> BoxFuture<'a, Result<String, HostError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.repository_url(identity))
                .bearer_auth(&identity.token)
                .send()
                .await
                .map_err(transport)?;
            let repository: RepositoryResponse = parse(ensure_success(response).await?).await?;
            Ok(repository.default_branch)
        })
    }

    fn get_content<'a>(
        &'a self,
        identity: &'a RepositoryIdentity,
        path: &'a str,
    ) -> BoxFuture<'a, Result<Option<RemoteDocument>, HostError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.contents_url(identity, path))
                .bearer_auth(&identity.token)
                .send()
                .await
                .map_err(transport)?;
            if response.status() == StatusCode::NOT_FOUND {
                debug!(path, "remote document does not exist yet");
                return Ok(None);
            }

            let content: ContentResponse = parse(ensure_success(response).await?).await?;
            let text = decode_content(&content.content)?;
            Ok(Some(RemoteDocument { text, revision: Some(content.sha) }))
        })
    }

    fn put_content<'a>(
        &'a self,
        identity: &'a RepositoryIdentity,
        path: &'a str,
        content: PutContent,
    ) -> BoxFuture<'a, Result<Option<String>, HostError>> {
        Box::pin(async move {
            let request = PutRequest {
                message: &content.message,
                content: STANDARD.encode(content.text.as_bytes()),
                sha: content.revision.as_deref(),
            };
            let response = self
                .client
                .put(self.contents_url(identity, path))
                .bearer_auth(&identity.token)
                .json(&request)
                .send()
                .await
                .map_err(transport)?;

            let written: PutResponse = parse(ensure_success(response).await?).await?;
            Ok(written.content.and_then(|content| content.sha))
        })
    }

    fn list_commits<'a>(
        &'a self,
        identity: &'a RepositoryIdentity,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<CommitSummary>, HostError>> {
        Box::pin(async move {
            let mut url = self.repository_url(identity);
            if let Ok(mut path) = url.path_segments_mut() {
                path.push("commits");
            }
            let per_page = limit.clamp(1, MAX_PER_PAGE).to_string();
            url.query_pairs_mut().append_pair("per_page", &per_page);

            let response = self
                .client
                .get(url)
                .bearer_auth(&identity.token)
                .send()
                .await
                .map_err(transport)?;
            let items: Vec<CommitItem> = parse(ensure_success(response).await?).await?;
            Ok(items.into_iter().take(limit).map(CommitSummary::from).collect())
        })
    }
}

/// Decode a contents payload. GitHub wraps the base64 text with newlines.
pub fn decode_content(encoded: &str) -> Result<String, HostError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|error| HostError::Decode(format!("invalid base64 content: {error}")))?;
    String::from_utf8(bytes)
        .map_err(|error| HostError::Decode(format!("content is not UTF-8: {error}")))
}

fn transport(error: reqwest::Error) -> HostError {
    HostError::Transport(error.to_string())
}

async fn ensure_success(response: Response) -> Result<Response, HostError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorPayload>(&body)
        .ok()
        .and_then(|payload| payload.message)
        .filter(|message| !message.trim().is_empty());
    Err(HostError::Status { status: status.as_u16(), message })
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, HostError> {
    response.json::<T>().await.map_err(|error| HostError::Decode(error.to_string()))
}
