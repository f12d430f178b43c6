//! File system paths for VaultPass.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Token storage filename under the base directory.
const TOKEN_STORE_NAME: &str = "token.json";

/// Manages file system paths for the CLI and native-messaging host.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.vaultpass)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.vaultpass`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".vaultpass"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.vaultpass).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.vaultpass/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the settings file path (~/.vaultpass/settings.json).
    ///
    /// Holds the server address, username, auth method, store path and the
    /// active secret directories.
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    /// Get the token storage file path (~/.vaultpass/token.json).
    pub fn token_store_file(&self) -> PathBuf {
        self.base_dir.join(TOKEN_STORE_NAME)
    }

    /// Get the logs directory (~/.vaultpass/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the central log file path (~/.vaultpass/logs/vaultpass.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("vaultpass.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
