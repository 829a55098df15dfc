use crate::secrets::SecretStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} is not a supported TokenProviderType")]
    UnsupportedProviderType(String),

    #[error("failed to locate {name} on PATH: {source}")]
    ProviderNotFound {
        name: String,
        source: std::io::Error,
    },

    #[error("TokenProvider object not initialized; call SetConfiguration() first")]
    NotInitialized,

    #[error("{path} failed to launch: {source}")]
    Launch {
        path: String,
        source: std::io::Error,
    },

    #[error("{path} terminated with non-zero exit code {code}")]
    Exit { path: String, code: i32 },

    #[error("{path} failed with unexpected error: {message}")]
    Unexpected { path: String, message: String },

    #[error("failed to read token file {path}: {source}")]
    TokenFileIo {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse token file {path}: {source}")]
    TokenFileParse {
        path: String,
        source: serde_json::Error,
    },

    #[error("unable to find authentication token in {0}")]
    MissingAuthToken(String),

    #[error("unable to find entity id in {0}")]
    MissingEntityId(String),

    #[error("failed to create secret store client: {0}")]
    SecretClient(#[source] SecretStoreError),

    #[error("failed to get credentials for database {database}: {source}")]
    Credentials {
        database: String,
        source: SecretStoreError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
