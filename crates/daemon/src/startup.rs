//! Token provider launch performed before the server accepts requests

use crate::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warden_core::{ExecutionRunner, SecretStoreInfo, TokenProvider};

/// Run the configured token provider once and wait for it to finish
///
/// An empty `token_provider` is not an error; there is simply nothing to run.
pub async fn launch_token_provider(
    secret_store: &SecretStoreInfo,
    runner: Arc<dyn ExecutionRunner>,
    cancel: CancellationToken,
) -> Result<()> {
    if secret_store.token_provider.is_empty() {
        info!("no token provider configured");
        return Ok(());
    }

    let mut provider = TokenProvider::new(cancel, runner);
    provider.set_configuration(secret_store)?;
    provider.launch().await?;
    Ok(())
}
