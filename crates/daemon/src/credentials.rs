//! Database credential retrieval and persistence
//!
//! Backs the `credentials` command: resolves credentials for every configured
//! database and optionally writes each password to
//! `<dir>/<database>/password`, readable only by the owner.

use crate::config::Settings;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};
use warden_core::{CredentialBootstrapper, DatabaseInfo, FileTokenLoader};
use warden_http::client::SecretStoreClientFactory;

pub const PASSWORD_FILE: &str = "password";

/// Resolve credentials for every database in `settings`
pub async fn fetch_credentials(settings: &Settings) -> Result<HashMap<String, DatabaseInfo>> {
    let bootstrapper = CredentialBootstrapper::new(
        Arc::new(FileTokenLoader::new()),
        Arc::new(SecretStoreClientFactory::new()),
    );

    let mut config = settings.bootstrap_config();
    let credentials = bootstrapper.get_credentials(&mut config).await?;
    Ok(credentials)
}

/// Write each password to `<dir>/<database>/password`
///
/// Directories are created with mode 0700 and files with mode 0600. Every
/// name is checked before anything is written.
pub async fn write_password_files(
    dir: &Path,
    credentials: &HashMap<String, DatabaseInfo>,
) -> Result<Vec<PathBuf>> {
    if let Some(name) = credentials.keys().find(|name| !is_plain_name(name)) {
        anyhow::bail!("database name {name:?} cannot be used as a directory name");
    }

    let mut written = Vec::with_capacity(credentials.len());

    for (name, info) in credentials {
        let db_dir = dir.join(name);
        fs::create_dir_all(&db_dir)
            .await
            .with_context(|| format!("Failed to create directory {}", db_dir.display()))?;
        set_mode(&db_dir, 0o700).await?;

        let path = db_dir.join(PASSWORD_FILE);
        debug!("Writing password for database {} to {}", name, path.display());
        fs::write(&path, &info.password)
            .await
            .with_context(|| format!("Failed to write password to {}", path.display()))?;
        set_mode(&path, 0o600).await?;

        written.push(path);
    }

    info!("Wrote {} password file(s) under {}", written.len(), dir.display());
    Ok(written)
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
