//! Secret store client abstraction used by the credential bootstrapper

use crate::types::SecretStoreInfo;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Authentication type for bearer-token access
pub const AUTH_TYPE_TOKEN: &str = "token";

/// Transport used for secret store access outside of tests
pub const SECURE_PROTOCOL: &str = "https";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretStoreError {
    #[error("invalid secret store client configuration: {0}")]
    Configuration(String),

    #[error("secret store request for {path} failed: {message}")]
    Request { path: String, message: String },

    #[error("secret store returned status {status} for {path}: {message}")]
    Status {
        path: String,
        status: u16,
        message: String,
    },

    #[error("no value for the keys {keys:?} exists at {path}")]
    MissingKeys { path: String, keys: Vec<String> },
}

#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticationInfo {
    pub auth_type: String,
    pub auth_token: String,
}

impl fmt::Debug for AuthenticationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationInfo")
            .field("auth_type", &self.auth_type)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Everything needed to construct a secret store client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretClientConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub protocol: String,
    pub root_ca_cert_path: String,
    pub server_name: String,
    pub authentication: AuthenticationInfo,
}

impl SecretClientConfig {
    /// Token-authenticated HTTPS configuration for `info`
    pub fn with_token(info: &SecretStoreInfo, token: impl Into<String>) -> Self {
        Self {
            host: info.host.clone(),
            port: info.port,
            path: info.path.clone(),
            protocol: SECURE_PROTOCOL.to_string(),
            root_ca_cert_path: info.root_ca_cert_path.clone(),
            server_name: info.server_name.clone(),
            authentication: AuthenticationInfo {
                auth_type: AUTH_TYPE_TOKEN.to_string(),
                auth_token: token.into(),
            },
        }
    }
}

/// Read access to secrets
#[async_trait]
pub trait SecretClient: Send + Sync {
    /// Fetch `keys` from `sub_path`; an empty `keys` returns every key
    async fn get_secrets(
        &self,
        sub_path: &str,
        keys: &[String],
    ) -> Result<HashMap<String, String>, SecretStoreError>;
}

/// Builds secret clients once a token is known
pub trait SecretClientFactory: Send + Sync {
    fn create(
        &self,
        config: SecretClientConfig,
    ) -> Result<Arc<dyn SecretClient>, SecretStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_token_forces_https() {
        let info = SecretStoreInfo {
            host: "edgex-secret-store".to_string(),
            port: 8200,
            path: "/v1/secret/edgex/core-data".to_string(),
            server_name: "secret-store.local".to_string(),
            root_ca_cert_path: "/tmp/ca.pem".to_string(),
            ..SecretStoreInfo::default()
        };

        let config = SecretClientConfig::with_token(&info, "s.abc");
        assert_eq!(config.protocol, "https");
        assert_eq!(config.host, "edgex-secret-store");
        assert_eq!(config.path, "/v1/secret/edgex/core-data");
        assert_eq!(config.server_name, "secret-store.local");
        assert_eq!(config.authentication.auth_type, "token");
        assert_eq!(config.authentication.auth_token, "s.abc");
        assert!(!format!("{config:?}").contains("s.abc"));
    }
}
