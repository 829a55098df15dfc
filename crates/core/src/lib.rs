//! Warden core types and utilities
//!
//! Token-file parsing, the token provider process lifecycle and the
//! credential bootstrap used by services at startup.

pub mod credentials;
pub mod error;
pub mod exec;
pub mod secrets;
pub mod telemetry;
pub mod token_file;
pub mod token_provider;
pub mod types;

#[cfg(any(test, feature = "tests"))]
pub mod testing;

pub use credentials::CredentialBootstrapper;
pub use error::{Error, Result};
pub use exec::{ExecutionRunner, OsExecutionRunner, ProcessError};
pub use secrets::{SecretClient, SecretClientConfig, SecretClientFactory, SecretStoreError};
pub use token_file::{AuthTokenLoader, FileTokenLoader, SecretStoreTokenFile};
pub use token_provider::TokenProvider;
pub use types::{BootstrapConfig, DatabaseInfo, SecretStoreInfo, ServiceInfo, WritableInfo};
