// Repository identity: who owns the log repository and how to authenticate.
//
// Resolution order for the owner: `AUTOLOG_GITHUB_USER`, keychain, global
// config. For the token: `AUTOLOG_GITHUB_TOKEN`, `GITHUB_TOKEN`, keychain.
// Environment values are captured once when the provider is built.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::security::{get_secret_with_store, KeyringSecretStore, SecretSlot, SecretStore};

pub const USER_ENV: &str = "AUTOLOG_GITHUB_USER";
pub const TOKEN_ENV: &str = "AUTOLOG_GITHUB_TOKEN";
pub const FALLBACK_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Owner, repository and credential for the remote log.
#[derive(Clone, PartialEq, Eq)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub repository: String,
    pub token: String,
}

impl RepositoryIdentity {
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self { owner: owner.into(), repository: repository.into(), token: token.into() }
    }
}

impl fmt::Debug for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryIdentity")
            .field("owner", &self.owner)
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("no hosting account configured; run `autolog login`")]
    MissingOwner,
    #[error("no access token configured; run `autolog login`")]
    MissingToken,
    #[error("credential store unavailable: {0}")]
    Store(String),
}

pub trait IdentityProvider: Send + Sync {
    fn resolve(&self) -> Result<RepositoryIdentity, IdentityError>;
}

/// Values read from the process environment at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    pub user: Option<String>,
    pub token: Option<String>,
}

impl EnvCredentials {
    pub fn capture() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|value| !value.trim().is_empty());
        Self { user: read(USER_ENV), token: read(TOKEN_ENV).or_else(|| read(FALLBACK_TOKEN_ENV)) }
    }
}

pub struct StoredIdentityProvider {
    env: EnvCredentials,
    config_user: Option<String>,
    repository: String,
    store: Arc<dyn SecretStore>,
}

impl StoredIdentityProvider {
    pub fn new(config_user: Option<String>, repository: impl Into<String>) -> Self {
        Self::with_sources(
            EnvCredentials::capture(),
            config_user,
            repository,
            Arc::new(KeyringSecretStore),
        )
    }

    pub fn with_sources(
        env: EnvCredentials,
        config_user: Option<String>,
        repository: impl Into<String>,
        store: Arc<dyn SecretStore>,
    ) -> Self {
        Self { env, config_user, repository: repository.into(), store }
    }

    fn stored(&self, slot: SecretSlot) -> Result<Option<String>, IdentityError> {
        get_secret_with_store(self.store.as_ref(), slot)
            .map(|value| value.filter(|v| !v.trim().is_empty()))
            .map_err(|error| IdentityError::Store(format!("{error:#}")))
    }
}

impl IdentityProvider for StoredIdentityProvider {
    fn resolve(&self) -> Result<RepositoryIdentity, IdentityError> {
        let owner = match self.env.user.clone() {
            Some(user) => Some(user),
            None => self.stored(SecretSlot::GithubUser)?.or_else(|| self.config_user.clone()),
        }
        .ok_or(IdentityError::MissingOwner)?;

        let token = match self.env.token.clone() {
            Some(token) => token,
            None => self.stored(SecretSlot::GithubToken)?.ok_or(IdentityError::MissingToken)?,
        };

        debug!(owner = %owner, repository = %self.repository, "resolved repository identity");
        Ok(RepositoryIdentity { owner, repository: self.repository.clone(), token })
    }
}
