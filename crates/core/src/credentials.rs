//! Database credential bootstrap
//!
//! At startup a service exchanges its secret store token for the username and
//! password of every database it uses. Either every database gets credentials
//! or the whole bootstrap fails.

use crate::secrets::{SecretClientConfig, SecretClientFactory, SecretStoreError};
use crate::token_file::AuthTokenLoader;
use crate::types::{BootstrapConfig, DatabaseInfo};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";

pub struct CredentialBootstrapper {
    loader: Arc<dyn AuthTokenLoader>,
    clients: Arc<dyn SecretClientFactory>,
}

impl CredentialBootstrapper {
    pub fn new(loader: Arc<dyn AuthTokenLoader>, clients: Arc<dyn SecretClientFactory>) -> Self {
        Self { loader, clients }
    }

    /// Resolve credentials for every database in `config.databases`
    ///
    /// On success the returned map also replaces `config.databases`. With
    /// `security_disabled` set the configured values are returned as-is and
    /// neither the token file nor the secret store is touched.
    pub async fn get_credentials(
        &self,
        config: &mut BootstrapConfig,
    ) -> Result<HashMap<String, DatabaseInfo>> {
        if config.security_disabled {
            info!("Secret store disabled, using configured database credentials");
            return Ok(config.databases.clone());
        }

        let token = self.loader.load(&config.secret_store.token_file).await?;

        let client = self
            .clients
            .create(SecretClientConfig::with_token(&config.secret_store, token))
            .map_err(Error::SecretClient)?;

        let keys = [USERNAME_KEY.to_string(), PASSWORD_KEY.to_string()];
        let mut credentials = HashMap::with_capacity(config.databases.len());

        for name in config.databases.keys() {
            let sub_path = format!("/{name}");
            debug!("Fetching credentials for database {} from {}", name, sub_path);

            let wrap = |source| Error::Credentials {
                database: name.clone(),
                source,
            };

            let mut secrets = client.get_secrets(&sub_path, &keys).await.map_err(wrap)?;

            let (Some(username), Some(password)) =
                (secrets.remove(USERNAME_KEY), secrets.remove(PASSWORD_KEY))
            else {
                return Err(wrap(SecretStoreError::MissingKeys {
                    path: sub_path,
                    keys: keys.to_vec(),
                }));
            };

            credentials.insert(name.clone(), DatabaseInfo { username, password });
        }

        info!("Retrieved credentials for {} database(s)", credentials.len());
        config.databases = credentials.clone();
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::SecretClient;
    use crate::types::SecretStoreInfo;
    use async_trait::async_trait;
    use mockall::mock;
    use mockall::predicate::eq;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    mock! {
        pub Client {}

        #[async_trait]
        impl SecretClient for Client {
            async fn get_secrets(
                &self,
                sub_path: &str,
                keys: &[String],
            ) -> std::result::Result<HashMap<String, String>, SecretStoreError>;
        }
    }

    mock! {
        pub Loader {}

        #[async_trait]
        impl AuthTokenLoader for Loader {
            async fn load(&self, path: &Path) -> Result<String>;
            async fn read_entity_id(&self, path: &Path) -> Result<String>;
        }
    }

    /// Hands out a single prepared client and records the configs it saw
    struct StubFactory {
        client: Option<Arc<dyn SecretClient>>,
        configs: Mutex<Vec<SecretClientConfig>>,
    }

    impl StubFactory {
        fn new(client: Option<Arc<dyn SecretClient>>) -> Arc<Self> {
            Arc::new(Self {
                client,
                configs: Mutex::new(Vec::new()),
            })
        }

        fn created(&self) -> usize {
            self.configs.lock().unwrap().len()
        }
    }

    impl SecretClientFactory for StubFactory {
        fn create(
            &self,
            config: SecretClientConfig,
        ) -> std::result::Result<Arc<dyn SecretClient>, SecretStoreError> {
            self.configs.lock().unwrap().push(config);
            self.client
                .clone()
                .ok_or_else(|| SecretStoreError::Configuration("no client".to_string()))
        }
    }

    fn secrets(username: &str, password: &str) -> HashMap<String, String> {
        HashMap::from([
            (USERNAME_KEY.to_string(), username.to_string()),
            (PASSWORD_KEY.to_string(), password.to_string()),
        ])
    }

    fn config(names: &[&str]) -> BootstrapConfig {
        BootstrapConfig {
            secret_store: SecretStoreInfo {
                token_file: PathBuf::from("/run/secrets/core-data/secrets-token.json"),
                ..SecretStoreInfo::default()
            },
            databases: names
                .iter()
                .map(|name| ((*name).to_string(), DatabaseInfo::default()))
                .collect(),
            ..BootstrapConfig::default()
        }
    }

    fn loader_returning(token: &'static str) -> Arc<MockLoader> {
        let mut loader = MockLoader::new();
        loader
            .expect_load()
            .with(eq(Path::new(
                "/run/secrets/core-data/secrets-token.json",
            )))
            .times(1)
            .returning(move |_| Ok(token.to_string()));
        Arc::new(loader)
    }

    #[tokio::test]
    async fn test_security_disabled_returns_configured_values() {
        let mut loader = MockLoader::new();
        loader.expect_load().never();
        let factory = StubFactory::new(None);

        let mut config = config(&[]);
        config.security_disabled = true;
        config
            .databases
            .insert("redisdb".to_string(), DatabaseInfo::new("u0", "p0"));

        let bootstrapper = CredentialBootstrapper::new(Arc::new(loader), factory.clone());
        let credentials = bootstrapper.get_credentials(&mut config).await.unwrap();

        assert_eq!(
            credentials,
            HashMap::from([("redisdb".to_string(), DatabaseInfo::new("u0", "p0"))])
        );
        assert_eq!(factory.created(), 0);
    }

    #[tokio::test]
    async fn test_fetches_every_database() {
        let mut client = MockClient::new();
        for path in ["/redisdb", "/postgres"] {
            client
                .expect_get_secrets()
                .withf(move |sub_path, keys| {
                    sub_path.to_string() == path
                        && keys.len() == 2
                        && keys[0] == USERNAME_KEY
                        && keys[1] == PASSWORD_KEY
                })
                .times(1)
                .returning(|_, _| Ok(secrets("u", "p")));
        }
        let factory = StubFactory::new(Some(Arc::new(client)));

        let mut config = config(&["redisdb", "postgres"]);
        let bootstrapper = CredentialBootstrapper::new(loader_returning("s.token"), factory.clone());
        let credentials = bootstrapper.get_credentials(&mut config).await.unwrap();

        assert_eq!(credentials.len(), 2);
        assert_eq!(credentials["redisdb"], DatabaseInfo::new("u", "p"));
        assert_eq!(credentials["postgres"], DatabaseInfo::new("u", "p"));
        assert_eq!(config.databases, credentials);

        let configs = factory.configs.lock().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].protocol, "https");
        assert_eq!(configs[0].authentication.auth_token, "s.token");
    }

    #[tokio::test]
    async fn test_single_failure_aborts_everything() {
        let mut client = MockClient::new();
        client
            .expect_get_secrets()
            .withf(|sub_path, _| sub_path.to_string() == "/redisdb")
            .returning(|_, _| Ok(secrets("u", "p")));
        client
            .expect_get_secrets()
            .withf(|sub_path, _| sub_path.to_string() == "/postgres")
            .times(1)
            .returning(|sub_path, _| {
                Err(SecretStoreError::Status {
                    path: sub_path.to_string(),
                    status: 403,
                    message: "permission denied".to_string(),
                })
            });
        let factory = StubFactory::new(Some(Arc::new(client)));

        let mut config = config(&["redisdb", "postgres"]);
        let original = config.databases.clone();
        let bootstrapper = CredentialBootstrapper::new(loader_returning("s.token"), factory);
        let err = bootstrapper.get_credentials(&mut config).await.unwrap_err();

        assert!(matches!(err, Error::Credentials { ref database, .. } if database == "postgres"));
        assert!(err.to_string().contains("postgres"));
        assert_eq!(config.databases, original);
    }

    #[tokio::test]
    async fn test_missing_keys_is_an_error() {
        let mut client = MockClient::new();
        client.expect_get_secrets().returning(|_, _| {
            Ok(HashMap::from([(USERNAME_KEY.to_string(), "u".to_string())]))
        });
        let factory = StubFactory::new(Some(Arc::new(client)));

        let mut config = config(&["redisdb"]);
        let bootstrapper = CredentialBootstrapper::new(loader_returning("s.token"), factory);
        let err = bootstrapper.get_credentials(&mut config).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Credentials {
                source: SecretStoreError::MissingKeys { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_token_load_failure_propagates() {
        let mut loader = MockLoader::new();
        loader
            .expect_load()
            .returning(|path| Err(Error::MissingAuthToken(path.display().to_string())));
        let factory = StubFactory::new(None);

        let mut config = config(&["redisdb"]);
        let bootstrapper = CredentialBootstrapper::new(Arc::new(loader), factory.clone());
        let err = bootstrapper.get_credentials(&mut config).await.unwrap_err();

        assert!(matches!(err, Error::MissingAuthToken(_)));
        assert_eq!(factory.created(), 0);
    }

    #[tokio::test]
    async fn test_client_construction_failure() {
        let factory = StubFactory::new(None);

        let mut config = config(&["redisdb"]);
        let bootstrapper = CredentialBootstrapper::new(loader_returning("s.token"), factory);
        let err = bootstrapper.get_credentials(&mut config).await.unwrap_err();

        assert!(matches!(err, Error::SecretClient(_)));
    }
}
