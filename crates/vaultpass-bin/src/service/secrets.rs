//! Active secret directories.

use crate::output;
use serde::Serialize;
use std::fmt;
use tracing::info;
use vault_kv_client::{VaultClient, VaultResult};
use vaultpass_config::Settings;

/// Directories under the store root and which of them are active.
#[derive(Debug, Serialize)]
pub struct DirectoryListing {
    pub available: Vec<String>,
    pub active: Vec<String>,
    /// Active directories dropped because the server no longer lists them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pruned: Vec<String>,
}

impl fmt::Display for DirectoryListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", output::heading("Secret directories"))?;
        for dir in &self.available {
            let state = if self.active.contains(dir) {
                "active"
            } else {
                "inactive"
            };
            writeln!(f, "{}", output::row(dir, state))?;
        }
        if !self.pruned.is_empty() {
            writeln!(f, "Removed missing directories: {}", self.pruned.join(", "))?;
        }
        Ok(())
    }
}

/// Directory name as stored in settings: trimmed, with a trailing `/`.
pub fn normalize_dir(dir: &str) -> String {
    let dir = dir.trim().trim_start_matches('/');
    if dir.is_empty() || dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{}/", dir)
    }
}

/// LIST the store root and prune active directories that are gone.
pub async fn refresh_directories(
    client: &VaultClient,
    settings: &mut Settings,
) -> VaultResult<DirectoryListing> {
    let available = client.list("").await?;
    let pruned = settings.prune(&available);
    if !pruned.is_empty() {
        info!(pruned = ?pruned, "Dropped secret directories missing on the server");
    }
    Ok(DirectoryListing {
        available,
        active: settings.secrets.clone(),
        pruned,
    })
}

/// Activate `dir` once the server lets us list it.
///
/// Returns the stored name and whether it was newly activated.
pub async fn enable_directory(
    client: &VaultClient,
    settings: &mut Settings,
    dir: &str,
) -> VaultResult<(String, bool)> {
    let dir = normalize_dir(dir);
    client.list(&dir).await?;
    let added = settings.activate(&dir);
    info!(dir = %dir, added, "Enabled secret directory");
    Ok((dir, added))
}

/// Deactivate `dir`. Returns how many entries were removed.
pub fn disable_directory(settings: &mut Settings, dir: &str) -> usize {
    let dir = normalize_dir(dir);
    let removed = settings.deactivate(&dir);
    info!(dir = %dir, removed, "Disabled secret directory");
    removed
}
