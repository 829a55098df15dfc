//! Application state management

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warden_core::{ExecutionRunner, OsExecutionRunner, SecretStoreInfo};

/// Shared application state
///
/// Handlers resolve their collaborators from here. Nothing in it is mutated
/// after startup, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Secret store and token provider settings
    pub secret_store: Arc<SecretStoreInfo>,
    /// Backend used to resolve and spawn the token provider
    pub runner: Arc<dyn ExecutionRunner>,
    /// Cancelled on server shutdown; request-scoped tokens are children of it
    pub shutdown: CancellationToken,
    /// Name reported by the ping route
    pub service_name: String,
}

impl AppState {
    /// Create a new AppState backed by real OS processes
    pub fn new(secret_store: SecretStoreInfo) -> Self {
        Self {
            secret_store: Arc::new(secret_store),
            runner: Arc::new(OsExecutionRunner::new()),
            shutdown: CancellationToken::new(),
            service_name: "warden".to_string(),
        }
    }

    /// Set the execution backend
    pub fn with_runner(mut self, runner: Arc<dyn ExecutionRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Tie request cancellation to an existing shutdown token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }
}
