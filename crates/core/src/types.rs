//! Configuration shapes shared by the token provider and the credential bootstrapper

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Connection and token-provider settings for the secret store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretStoreInfo {
    /// Secret store host name or IP address
    pub host: String,
    /// Secret store port
    pub port: u16,
    /// Base path prepended to every secret sub-path, e.g. `/v1/secret/edgex/core-data`
    pub path: String,
    /// TLS server name to verify, when it differs from `host`
    pub server_name: String,
    /// PEM bundle used to verify the secret store certificate
    pub root_ca_cert_path: String,
    /// Token file holding this service's secret store token
    pub token_file: PathBuf,
    /// Launch strategy for the token provider; only `oneshot` is supported
    pub token_provider_type: String,
    /// Executable name or path of the token provider
    pub token_provider: String,
    /// Arguments passed on normal launches; a single string is split on commas
    #[serde(deserialize_with = "list_or_comma_separated")]
    pub token_provider_args: Vec<String>,
}

impl Default for SecretStoreInfo {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8200,
            path: "/v1/secret".to_string(),
            server_name: String::new(),
            root_ca_cert_path: String::new(),
            token_file: PathBuf::from("/tmp/edgex/secrets/secrets-token.json"),
            token_provider_type: String::new(),
            token_provider: String::new(),
            token_provider_args: Vec::new(),
        }
    }
}

fn list_or_comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Args {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Args::deserialize(deserializer)? {
        Args::List(args) => args,
        Args::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Username/password pair for one logical database
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl DatabaseInfo {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for DatabaseInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseInfo")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings that may change while the service runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WritableInfo {
    /// Log level filter, e.g. "info" or "warden=debug"
    pub log_level: String,
}

impl Default for WritableInfo {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Where this service listens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    pub host: String,
    pub port: u16,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 59842,
        }
    }
}

/// Input to the credential bootstrapper
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub writable: WritableInfo,
    pub service: ServiceInfo,
    pub secret_store: SecretStoreInfo,
    /// Databases needing credentials, keyed by logical name
    pub databases: HashMap<String, DatabaseInfo>,
    /// Skip the secret store and hand back `databases` unchanged
    pub security_disabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_info_debug_redacts_password() {
        let info = DatabaseInfo::new("admin", "hunter2");
        let rendered = format!("{info:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_secret_store_info_partial_deserialize() {
        let info: SecretStoreInfo = serde_json::from_str(
            r#"{"host": "vault", "token_provider": "security-file-token-provider"}"#,
        )
        .unwrap();
        assert_eq!(info.host, "vault");
        assert_eq!(info.port, 8200);
        assert_eq!(info.token_provider, "security-file-token-provider");
        assert!(info.token_provider_args.is_empty());
    }

    #[test]
    fn test_token_provider_args_from_joined_string() {
        let info: SecretStoreInfo =
            serde_json::from_str(r#"{"token_provider_args": "-confdir, res,"}"#).unwrap();
        assert_eq!(info.token_provider_args, vec!["-confdir", "res"]);

        let info: SecretStoreInfo =
            serde_json::from_str(r#"{"token_provider_args": ["-a,b"]}"#).unwrap();
        assert_eq!(info.token_provider_args, vec!["-a,b"]);
    }
}
