//! Secret store HTTP client
//!
//! Reads key/value secrets from a Vault/OpenBao compatible secret store using
//! token authentication.

pub mod error;

use async_trait::async_trait;
use error::ClientError;
use reqwest::{Certificate, Client, ClientBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use warden_core::secrets::{
    AUTH_TYPE_TOKEN, SECURE_PROTOCOL, SecretClient, SecretClientConfig, SecretClientFactory,
    SecretStoreError,
};

/// Header carrying the secret store token
pub const TOKEN_HEADER: &str = "X-Vault-Token";

const DEFAULT_PORT: u16 = 8200;

/// Body of a key/value read
#[derive(Debug, Deserialize)]
struct SecretsResponse {
    #[serde(default)]
    data: HashMap<String, serde_json::Value>,
}

/// Token-authenticated secret store client
#[derive(Clone)]
pub struct SecretStoreClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SecretStoreClient {
    /// Create a client from a bootstrap configuration
    pub fn new(config: &SecretClientConfig) -> Result<Self, ClientError> {
        Self::builder().config(config).build()
    }

    /// Create a new client builder
    pub fn builder() -> SecretStoreClientBuilder {
        SecretStoreClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Read `keys` from `sub_path` below the base URL
    ///
    /// Every requested key must be present. With no keys requested the whole
    /// secret is returned.
    pub async fn read_secrets(
        &self,
        sub_path: &str,
        keys: &[String],
    ) -> Result<HashMap<String, String>, ClientError> {
        let url = format!("{}{}", self.base_url, sub_path);
        tracing::debug!(%url, "reading secrets");

        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(ClientError::from_status(status, message));
        }

        let body: SecretsResponse = serde_json::from_slice(&response.bytes().await?)?;
        let mut data: HashMap<String, String> = body
            .data
            .into_iter()
            .map(|(key, value)| (key, value_to_string(value)))
            .collect();

        if keys.is_empty() {
            return Ok(data);
        }

        let missing: Vec<String> = keys
            .iter()
            .filter(|key| !data.contains_key(key.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ClientError::MissingKeys { keys: missing });
        }

        Ok(keys
            .iter()
            .filter_map(|key| data.remove_entry(key.as_str()))
            .collect())
    }
}

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait]
impl SecretClient for SecretStoreClient {
    async fn get_secrets(
        &self,
        sub_path: &str,
        keys: &[String],
    ) -> Result<HashMap<String, String>, SecretStoreError> {
        self.read_secrets(sub_path, keys)
            .await
            .map_err(|err| err.into_secret_store_error(sub_path))
    }
}

/// Builder for SecretStoreClient
#[derive(Default)]
pub struct SecretStoreClientBuilder {
    protocol: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: Option<String>,
    server_name: Option<String>,
    root_ca_cert_path: Option<String>,
    auth_type: Option<String>,
    token: Option<String>,
    timeout: Option<Duration>,
}

impl SecretStoreClientBuilder {
    /// Take every setting from a bootstrap configuration
    pub fn config(self, config: &SecretClientConfig) -> Self {
        self.protocol(&config.protocol)
            .host(&config.host)
            .port(config.port)
            .path(&config.path)
            .server_name(&config.server_name)
            .root_ca_cert_path(&config.root_ca_cert_path)
            .auth_type(&config.authentication.auth_type)
            .token(&config.authentication.auth_token)
    }

    /// Set the protocol, `https` unless overridden
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the base path every sub-path is appended to
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the TLS server name; only honoured when the host is an IP address
    pub fn server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    /// Set a PEM file with additional trusted roots
    pub fn root_ca_cert_path(mut self, path: impl Into<String>) -> Self {
        self.root_ca_cert_path = Some(path.into());
        self
    }

    pub fn auth_type(mut self, auth_type: impl Into<String>) -> Self {
        self.auth_type = Some(auth_type.into());
        self
    }

    /// Set the secret store token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<SecretStoreClient, ClientError> {
        let host = non_empty(self.host)
            .ok_or_else(|| ClientError::Configuration("host is required".into()))?;
        let token = non_empty(self.token)
            .ok_or_else(|| ClientError::Configuration("auth token is required".into()))?;

        if let Some(auth_type) = non_empty(self.auth_type)
            && auth_type != AUTH_TYPE_TOKEN
        {
            return Err(ClientError::Configuration(format!(
                "unsupported authentication type {auth_type}"
            )));
        }

        let protocol = non_empty(self.protocol).unwrap_or_else(|| SECURE_PROTOCOL.to_string());
        if protocol != "https" && protocol != "http" {
            return Err(ClientError::Configuration(format!(
                "unsupported protocol {protocol}"
            )));
        }

        let port = self.port.filter(|p| *p != 0).unwrap_or(DEFAULT_PORT);

        let mut client_builder = ClientBuilder::new()
            .user_agent(concat!("warden/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(ca_path) = non_empty(self.root_ca_cert_path) {
            let pem = std::fs::read(&ca_path).map_err(|e| {
                ClientError::Configuration(format!(
                    "failed to read root CA certificate {ca_path}: {e}"
                ))
            })?;
            client_builder = client_builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }

        let ip = host.parse::<IpAddr>().ok();
        let url_host = match (non_empty(self.server_name), ip) {
            (Some(server_name), Some(ip)) => {
                // Connect to the IP but present and verify `server_name`
                client_builder = client_builder.resolve(&server_name, SocketAddr::new(ip, port));
                server_name
            }
            (Some(server_name), None) => {
                tracing::warn!(
                    "server name {} ignored, host {} is not an IP address",
                    server_name,
                    host
                );
                host
            }
            (None, Some(IpAddr::V6(ip))) => format!("[{ip}]"),
            (None, _) => host,
        };

        let path = self.path.unwrap_or_default();
        let path = path.trim_end_matches('/');
        let base_url = if path.is_empty() || path.starts_with('/') {
            format!("{protocol}://{url_host}:{port}{path}")
        } else {
            format!("{protocol}://{url_host}:{port}/{path}")
        };

        Ok(SecretStoreClient {
            client: client_builder.build()?,
            base_url,
            token,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Creates [`SecretStoreClient`]s for the credential bootstrapper
#[derive(Debug, Clone, Default)]
pub struct SecretStoreClientFactory {
    timeout: Option<Duration>,
}

impl SecretStoreClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a request timeout to every client created
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl SecretClientFactory for SecretStoreClientFactory {
    fn create(
        &self,
        config: SecretClientConfig,
    ) -> Result<Arc<dyn SecretClient>, SecretStoreError> {
        let mut builder = SecretStoreClient::builder().config(&config);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|err| err.into_secret_store_error(&config.path))?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_host() {
        let result = SecretStoreClient::builder().token("s.abc").build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_builder_requires_token() {
        let result = SecretStoreClient::builder().host("localhost").build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_builder_defaults_to_https() {
        let client = SecretStoreClient::builder()
            .host("edgex-secret-store")
            .path("/v1/secret/edgex/core-data/")
            .token("s.abc")
            .build()
            .unwrap();
        assert_eq!(
            client.base_url(),
            "https://edgex-secret-store:8200/v1/secret/edgex/core-data"
        );
    }

    #[test]
    fn test_server_name_replaces_ip_host() {
        let client = SecretStoreClient::builder()
            .host("10.0.0.5")
            .port(8201)
            .server_name("secret-store.local")
            .token("s.abc")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://secret-store.local:8201");
    }

    #[test]
    fn test_ipv6_host_is_bracketed() {
        let client = SecretStoreClient::builder()
            .host("::1")
            .path("v1/secret")
            .token("s.abc")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://[::1]:8200/v1/secret");
    }

    #[test]
    fn test_rejects_non_token_auth() {
        let result = SecretStoreClient::builder()
            .host("localhost")
            .auth_type("approle")
            .token("s.abc")
            .build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_missing_root_ca_file() {
        let result = SecretStoreClient::builder()
            .host("localhost")
            .token("s.abc")
            .root_ca_cert_path("/nonexistent/ca.pem")
            .build();
        let err = result.err().unwrap();
        assert!(err.to_string().contains("/nonexistent/ca.pem"));
    }
}
