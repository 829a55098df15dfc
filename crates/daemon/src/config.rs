//! Configuration management for the warden daemon

use crate::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use warden_core::{BootstrapConfig, DatabaseInfo, SecretStoreInfo, ServiceInfo, WritableInfo};

/// Prefix for environment overrides, e.g. `WARDEN_SECRET_STORE__HOST`
pub const ENV_PREFIX: &str = "WARDEN";

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub writable: WritableInfo,
    /// Address the HTTP server binds to
    pub service: ServiceInfo,
    pub secret_store: SecretStoreInfo,
    /// Databases needing credentials, keyed by logical name
    pub databases: HashMap<String, DatabaseInfo>,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// When false, database credentials come straight from `databases`
    pub secret_store: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self { secret_store: true }
    }
}

impl Settings {
    /// Load configuration from a specific config file, with environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the merged values do not
    /// deserialize
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(Some(path.as_ref()), environment())
    }

    /// Load configuration from defaults and environment variables only
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables cannot be parsed
    pub fn from_env() -> Result<Self> {
        Self::load(None, environment())
    }

    fn load(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder.add_source(env).build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Input for the credential bootstrapper
    pub fn bootstrap_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            writable: self.writable.clone(),
            service: self.service.clone(),
            secret_store: self.secret_store.clone(),
            databases: self.databases.clone(),
            security_disabled: !self.security.secret_store,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.port)
    }
}

/// Values stay strings; numeric and bool fields are converted on deserialize
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_from(vars: &[(&str, &str)]) -> Environment {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(source))
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load(None, env_from(&[])).unwrap();
        assert_eq!(settings.service.port, 59842);
        assert_eq!(settings.secret_store.port, 8200);
        assert!(settings.security.secret_store);
        assert!(settings.databases.is_empty());
        assert!(!settings.bootstrap_config().security_disabled);
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
[secret_store]
host = "edgex-secret-store"
path = "/v1/secret/edgex/core-data"
token_file = "/run/secrets/core-data/secrets-token.json"
token_provider_type = "oneshot"
token_provider = "security-file-token-provider"
token_provider_args = ["-confdir", "res"]

[databases.redisdb]
username = "redis"

[databases.postgres]
username = "postgres"
"#,
        );

        let settings = Settings::load(Some(file.path()), env_from(&[])).unwrap();
        assert_eq!(settings.secret_store.host, "edgex-secret-store");
        assert_eq!(settings.secret_store.port, 8200);
        assert_eq!(settings.secret_store.token_provider_type, "oneshot");
        assert_eq!(settings.secret_store.token_provider_args, vec!["-confdir", "res"]);
        assert_eq!(settings.databases.len(), 2);
        assert_eq!(settings.databases["redisdb"].username, "redis");
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = write_config(
            r#"
[secret_store]
host = "edgex-secret-store"
"#,
        );

        let settings = Settings::load(
            Some(file.path()),
            env_from(&[
                ("WARDEN_SECRET_STORE__HOST", "10.0.0.5"),
                ("WARDEN_SECRET_STORE__PORT", "8201"),
                ("WARDEN_SECRET_STORE__TOKEN_PROVIDER_ARGS", "-a,-b"),
                ("WARDEN_SECURITY__SECRET_STORE", "false"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.secret_store.host, "10.0.0.5");
        assert_eq!(settings.secret_store.port, 8201);
        assert_eq!(settings.secret_store.token_provider_args, vec!["-a", "-b"]);
        assert!(settings.bootstrap_config().security_disabled);
    }

    #[test]
    fn test_environment_values_are_not_coerced() {
        let settings = Settings::load(
            None,
            env_from(&[
                ("WARDEN_DATABASES__REDISDB__USERNAME", "1e3"),
                ("WARDEN_DATABASES__REDISDB__PASSWORD", "0123"),
                ("WARDEN_SECRET_STORE__TOKEN_PROVIDER_ARGS", "007"),
            ]),
        )
        .unwrap();

        let redis = &settings.databases["redisdb"];
        assert_eq!(redis.username, "1e3");
        assert_eq!(redis.password, "0123");
        assert_eq!(settings.secret_store.token_provider_args, vec!["007"]);

        let config = settings.bootstrap_config();
        assert_eq!(config.databases["redisdb"].password, "0123");
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = Settings::load(Some(Path::new("/nonexistent/warden.toml")), env_from(&[]));
        assert!(result.is_err());
    }

    #[test]
    fn test_bind_address() {
        let settings = Settings::default();
        assert_eq!(settings.bind_address(), "127.0.0.1:59842");
    }
}
