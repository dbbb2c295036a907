// Hosting credentials in the OS keychain, plus owner-only permissions for
// the config files that sit next to them.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

const KEYRING_SERVICE: &str = "dev.autolog";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSlot {
    GithubUser,
    GithubToken,
}

impl SecretSlot {
    fn account(self) -> &'static str {
        match self {
            Self::GithubUser => "github_user",
            Self::GithubToken => "github_token",
        }
    }
}

pub fn set_secret(slot: SecretSlot, value: &str) -> Result<()> {
    set_secret_with_store(&KeyringSecretStore, slot, value)
}

pub fn get_secret(slot: SecretSlot) -> Result<Option<String>> {
    get_secret_with_store(&KeyringSecretStore, slot)
}

pub fn delete_secret(slot: SecretSlot) -> Result<()> {
    delete_secret_with_store(&KeyringSecretStore, slot)
}

/// Tighten a config file to `0600`. Missing files are left alone.
pub fn ensure_owner_only_file(path: &Path) -> Result<()> {
    restrict_mode(path, 0o600)
}

/// Tighten a config directory to `0700`. Missing directories are left alone.
pub fn ensure_owner_only_dir(path: &Path) -> Result<()> {
    restrict_mode(path, 0o700)
}

#[cfg(unix)]
fn restrict_mode(path: &Path, wanted: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read metadata for `{}`", path.display()))
        }
    };
    if metadata.permissions().mode() & 0o777 != wanted {
        fs::set_permissions(path, fs::Permissions::from_mode(wanted))
            .with_context(|| format!("failed to set owner-only mode on `{}`", path.display()))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_mode(_path: &Path, _wanted: u32) -> Result<()> {
    Ok(())
}

/// Backing store for named secrets. The OS keychain in production.
pub trait SecretStore: Send + Sync {
    fn set_secret(&self, service: &str, account: &str, value: &str) -> Result<()>;
    fn get_secret(&self, service: &str, account: &str) -> Result<Option<String>>;
    fn delete_secret(&self, service: &str, account: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringSecretStore;

impl SecretStore for KeyringSecretStore {
    fn set_secret(&self, service: &str, account: &str, value: &str) -> Result<()> {
        let entry = keyring::Entry::new(service, account)
            .context("failed to initialize keychain entry")?;
        entry
            .set_password(value)
            .context("failed to write keychain entry")?;
        Ok(())
    }

    fn get_secret(&self, service: &str, account: &str) -> Result<Option<String>> {
        let entry = keyring::Entry::new(service, account)
            .context("failed to initialize keychain entry")?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(error).context("failed to read keychain entry"),
        }
    }

    fn delete_secret(&self, service: &str, account: &str) -> Result<()> {
        let entry = keyring::Entry::new(service, account)
            .context("failed to initialize keychain entry")?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(error).context("failed to delete keychain entry"),
        }
    }
}

pub fn set_secret_with_store(store: &dyn SecretStore, slot: SecretSlot, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("secret value must not be empty");
    }
    store
        .set_secret(KEYRING_SERVICE, slot.account(), value)
        .with_context(|| format!("failed to persist `{}` in keychain", slot.account()))
}

pub fn get_secret_with_store(store: &dyn SecretStore, slot: SecretSlot) -> Result<Option<String>> {
    store
        .get_secret(KEYRING_SERVICE, slot.account())
        .with_context(|| format!("failed to read `{}` from keychain", slot.account()))
}

pub fn delete_secret_with_store(store: &dyn SecretStore, slot: SecretSlot) -> Result<()> {
    store
        .delete_secret(KEYRING_SERVICE, slot.account())
        .with_context(|| format!("failed to clear `{}` from keychain", slot.account()))
}
