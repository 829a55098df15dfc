//! Token provider process lifecycle
//!
//! A [`TokenProvider`] wraps the external executable that issues secret store
//! tokens. It starts out unconfigured, becomes usable once
//! [`TokenProvider::set_configuration`] succeeds, and then runs the executable
//! to completion on every launch. Instances are cheap and meant to be created
//! per operation rather than shared.

use crate::exec::{ExecutionRunner, ProcessError};
use crate::types::SecretStoreInfo;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// The only supported launch strategy: run the provider once and wait for it
pub const ONESHOT_PROVIDER: &str = "oneshot";

/// Configuration directory handed to the provider when regenerating a token
pub const REGEN_CONFIG_DIR: &str = "res-file-token-provider";

#[derive(Debug)]
enum State {
    Uninitialized,
    Configured {
        resolved_path: PathBuf,
        info: SecretStoreInfo,
    },
}

pub struct TokenProvider {
    cancel: CancellationToken,
    runner: Arc<dyn ExecutionRunner>,
    state: State,
}

impl TokenProvider {
    /// Create an unconfigured provider whose launches are bound to `cancel`
    pub fn new(cancel: CancellationToken, runner: Arc<dyn ExecutionRunner>) -> Self {
        Self {
            cancel,
            runner,
            state: State::Uninitialized,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.state, State::Configured { .. })
    }

    /// Absolute path of the provider executable, once configured
    pub fn resolved_path(&self) -> Option<&Path> {
        match &self.state {
            State::Configured { resolved_path, .. } => Some(resolved_path),
            State::Uninitialized => None,
        }
    }

    /// Validate `info` and resolve the provider executable
    ///
    /// On failure the provider stays unconfigured.
    pub fn set_configuration(&mut self, info: &SecretStoreInfo) -> Result<()> {
        if info.token_provider_type != ONESHOT_PROVIDER {
            return Err(Error::UnsupportedProviderType(
                info.token_provider_type.clone(),
            ));
        }

        let resolved_path =
            self.runner
                .look_path(&info.token_provider)
                .map_err(|source| Error::ProviderNotFound {
                    name: info.token_provider.clone(),
                    source,
                })?;

        debug!(
            "Resolved token provider {} to {}",
            info.token_provider,
            resolved_path.display()
        );

        self.state = State::Configured {
            resolved_path,
            info: info.clone(),
        };
        Ok(())
    }

    /// Run the provider with its configured arguments
    pub async fn launch(&self) -> Result<()> {
        let (path, info) = self.configured()?;

        info!("Launching token provider {}", path.display());
        self.execute(path, &info.token_provider_args).await?;
        info!("Token provider {} completed", path.display());
        Ok(())
    }

    /// Run the provider to issue a fresh token for `entity_id`
    pub async fn launch_regen_token(&self, entity_id: &str) -> Result<()> {
        let (path, _) = self.configured()?;

        info!(
            "Launching token provider {} to regenerate token for entity {}",
            path.display(),
            entity_id
        );
        self.execute(path, &regen_token_args(entity_id)).await?;
        info!("Token regenerated for entity {}", entity_id);
        Ok(())
    }

    fn configured(&self) -> Result<(&Path, &SecretStoreInfo)> {
        match &self.state {
            State::Configured {
                resolved_path,
                info,
            } => Ok((resolved_path, info)),
            State::Uninitialized => Err(Error::NotInitialized),
        }
    }

    async fn execute(&self, path: &Path, args: &[String]) -> Result<()> {
        let display = path.display().to_string();

        self.runner
            .run(&self.cancel, path, args)
            .await
            .map_err(|err| match err {
                ProcessError::Start(source) => Error::Launch {
                    path: display,
                    source,
                },
                ProcessError::Exit(code) => Error::Exit {
                    path: display,
                    code,
                },
                ProcessError::Wait(message) => Error::Unexpected {
                    path: display,
                    message,
                },
            })
    }
}

/// Arguments for a single-entity token regeneration run
pub fn regen_token_args(entity_id: &str) -> Vec<String> {
    vec![
        "-configDir".to_string(),
        REGEN_CONFIG_DIR.to_string(),
        "createToken".to_string(),
        "-entityId".to_string(),
        entity_id.to_string(),
    ]
}
