//! Secret store token files
//!
//! The secret store writes the response of its init and token-creation calls
//! to disk as JSON. Services read their bearer token from that file on every
//! use since the token provider may rewrite it at any time.

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// `auth` block of a token-creation response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAuth {
    #[serde(default)]
    pub client_token: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
}

/// On-disk token artifact
///
/// Unknown fields (lease durations, policies, key shares) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretStoreTokenFile {
    #[serde(default)]
    pub auth: Option<TokenAuth>,
    #[serde(default)]
    pub root_token: Option<String>,
}

impl SecretStoreTokenFile {
    /// Client token if present, falling back to the root token
    pub fn token(&self) -> Option<&str> {
        self.auth
            .as_ref()
            .and_then(|auth| non_empty(auth.client_token.as_deref()))
            .or_else(|| non_empty(self.root_token.as_deref()))
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.auth
            .as_ref()
            .and_then(|auth| non_empty(auth.entity_id.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Reads tokens and entity identifiers out of token files
#[async_trait]
pub trait AuthTokenLoader: Send + Sync {
    /// Load the bearer token, preferring `auth.client_token` over `root_token`
    async fn load(&self, path: &Path) -> Result<String>;

    /// Load `auth.entity_id`
    async fn read_entity_id(&self, path: &Path) -> Result<String>;
}

/// Loader backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTokenLoader;

impl FileTokenLoader {
    pub fn new() -> Self {
        Self
    }

    async fn read(&self, path: &Path) -> Result<SecretStoreTokenFile> {
        debug!("Reading token file {}", path.display());
        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| Error::TokenFileIo {
                path: path.display().to_string(),
                source,
            })?;

        serde_json::from_slice(&contents).map_err(|source| Error::TokenFileParse {
            path: path.display().to_string(),
            source,
        })
    }
}

#[async_trait]
impl AuthTokenLoader for FileTokenLoader {
    async fn load(&self, path: &Path) -> Result<String> {
        let file = self.read(path).await?;
        file.token()
            .map(str::to_string)
            .ok_or_else(|| Error::MissingAuthToken(path.display().to_string()))
    }

    async fn read_entity_id(&self, path: &Path) -> Result<String> {
        let file = self.read(path).await?;
        file.entity_id()
            .map(str::to_string)
            .ok_or_else(|| Error::MissingEntityId(path.display().to_string()))
    }
}
