//! Client error types

use thiserror::Error;
use warden_core::SecretStoreError;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Token rejected or missing
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Token lacks a policy for the path
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Nothing stored at the path
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested keys absent from the secret
    #[error("No value for the keys: {keys:?}")]
    MissingKeys { keys: Vec<String> },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Convert into the transport-neutral error for a request against `path`
    pub fn into_secret_store_error(self, path: &str) -> SecretStoreError {
        let path = path.to_string();
        match self {
            ClientError::Configuration(message) => SecretStoreError::Configuration(message),
            ClientError::MissingKeys { keys } => SecretStoreError::MissingKeys { path, keys },
            ClientError::AuthenticationFailed(message) => SecretStoreError::Status {
                path,
                status: 401,
                message,
            },
            ClientError::Forbidden(message) => SecretStoreError::Status {
                path,
                status: 403,
                message,
            },
            ClientError::NotFound(message) => SecretStoreError::Status {
                path,
                status: 404,
                message,
            },
            ClientError::ServerError { status, message } => SecretStoreError::Status {
                path,
                status,
                message,
            },
            other => SecretStoreError::Request {
                path,
                message: other.to_string(),
            },
        }
    }
}
