//! Credential storage for access and refresh tokens.
//!
//! The backing store is selected once at startup ([`store_from_env`]) and
//! handed to the client as a trait object, so environment branching never
//! reaches the request path.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, RetokenError};

/// Stored session credentials.
///
/// The refresh token is optional: a session established from a
/// pre-provisioned access token has nothing to refresh with, and the first
/// 401 on such a session ends it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
        }
    }

    pub fn with_refresh(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

/// Persistence seam for session credentials.
///
/// Implementations must be internally synchronized: concurrent refreshes
/// write whole [`Credentials`] values and the last writer wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credentials, or `None` when logged out.
    async fn load(&self) -> Result<Option<Credentials>>;
    /// Replaces the stored credentials.
    async fn save(&self, credentials: &Credentials) -> Result<()>;
    /// Removes the stored credentials.
    async fn clear(&self) -> Result<()>;
}

/// In-memory store; credentials live for the lifetime of the process.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credentials>> {
        Ok(self.inner.read().map_err(|_| poisoned())?.clone())
    }

    async fn save(&self, credentials: &Credentials) -> Result<()> {
        *self.inner.write().map_err(|_| poisoned())? = Some(credentials.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.inner.write().map_err(|_| poisoned())? = None;
        Ok(())
    }
}

fn poisoned() -> RetokenError {
    RetokenError::Credentials("credential lock poisoned".to_owned())
}

/// JSON-file-backed store.
///
/// `save` replaces the whole file; a missing file reads as logged out.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credentials>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(RetokenError::Credentials(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_str(&content).map(Some).map_err(|err| {
            RetokenError::Credentials(format!(
                "invalid credentials file {}: {err}",
                self.path.display()
            ))
        })
    }

    async fn save(&self, credentials: &Credentials) -> Result<()> {
        let content = serde_json::to_string_pretty(credentials).map_err(|err| {
            RetokenError::Credentials(format!("failed to encode credentials: {err}"))
        })?;
        tokio::fs::write(&self.path, content).await.map_err(|err| {
            RetokenError::Credentials(format!(
                "failed to write {}: {err}",
                self.path.display()
            ))
        })
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(RetokenError::Credentials(format!(
                "failed to remove {}: {err}",
                self.path.display()
            ))),
        }
    }
}

/// Selects the credential store from the environment.
///
/// Reads `RETOKEN_CREDENTIALS_FILE`: set and non-empty, credentials are
/// persisted as JSON at that path; otherwise they are held in memory and
/// die with the process.
pub fn store_from_env() -> Arc<dyn CredentialStore> {
    match std::env::var("RETOKEN_CREDENTIALS_FILE") {
        Ok(path) if !path.trim().is_empty() => Arc::new(FileCredentialStore::new(path.trim())),
        _ => Arc::new(MemoryCredentialStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("retoken-{}-{name}.json", std::process::id()))
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        let credentials = Credentials::new("at1").with_refresh("rt1");
        store.save(&credentials).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(credentials));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_missing_file_reads_as_logged_out() {
        let store = FileCredentialStore::new(temp_path("missing"));
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn file_store_round_trips() {
        let store = FileCredentialStore::new(temp_path("round-trip"));
        let credentials = Credentials::new("at1").with_refresh("rt1");

        store.save(&credentials).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(credentials));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_rejects_corrupt_file() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = FileCredentialStore::new(&path);
        let err = store.load().await.unwrap_err();
        assert!(err.to_string().contains("invalid credentials file"));

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
