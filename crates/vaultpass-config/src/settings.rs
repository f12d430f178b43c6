//! User settings: server address, login details, store path and the set of
//! active secret directories.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Auth mount used when none has been configured.
pub const DEFAULT_AUTH_METHOD: &str = "userpass";

/// Persisted user settings (`~/.vaultpass/settings.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Secrets server base address, e.g. `https://vault.example.com`.
    #[serde(default)]
    pub vault_address: Option<String>,
    /// Last username used to log in.
    #[serde(default)]
    pub username: Option<String>,
    /// Auth mount name (`userpass`, `ldap`, ...).
    #[serde(default)]
    pub auth_method: Option<String>,
    /// KV store path; first component is the mount root. Empty selects
    /// the client's default store.
    #[serde(default)]
    pub store_path: String,
    /// Active secret directories, in the order they were enabled.
    #[serde(default)]
    pub secrets: Vec<String>,
}

impl Settings {
    /// Load settings, returning defaults when the file does not exist yet.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let path = paths.settings_file();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save settings to disk.
    ///
    /// The CLI and the native host both write this file, so it is replaced
    /// through a temp file and a rename and readers never see a partial write.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_vec_pretty(self)?;
        write_atomic(&paths.settings_file(), &content)
    }

    /// Configured server address, validated as a URL.
    pub fn vault_url(&self) -> CoreResult<Url> {
        let address = self
            .vault_address
            .as_deref()
            .filter(|a| !a.is_empty())
            .ok_or(CoreError::NotConfigured("vault address"))?;
        Ok(Url::parse(address)?)
    }

    /// Configured server address with any trailing slash removed.
    pub fn vault_address(&self) -> CoreResult<String> {
        let url = self.vault_url()?;
        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    /// Auth mount, defaulting to `userpass`.
    pub fn auth_method(&self) -> &str {
        self.auth_method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_AUTH_METHOD)
    }

    /// Set the store path, dropping a single leading `/`.
    pub fn set_store_path(&mut self, raw: &str) {
        self.store_path = raw.strip_prefix('/').unwrap_or(raw).to_string();
    }

    /// Whether `dir` is an active secret directory.
    pub fn is_active(&self, dir: &str) -> bool {
        self.secrets.iter().any(|s| s == dir)
    }

    /// Mark a directory active. Returns false if it already was.
    pub fn activate(&mut self, dir: &str) -> bool {
        if self.is_active(dir) {
            return false;
        }
        self.secrets.push(dir.to_string());
        true
    }

    /// Remove every occurrence of `dir`. Returns how many were removed.
    pub fn deactivate(&mut self, dir: &str) -> usize {
        let before = self.secrets.len();
        self.secrets.retain(|s| s != dir);
        before - self.secrets.len()
    }

    /// Drop active directories that are not in `available`.
    ///
    /// Returns the directories that were removed.
    pub fn prune(&mut self, available: &[String]) -> Vec<String> {
        let (kept, removed): (Vec<String>, Vec<String>) = self
            .secrets
            .drain(..)
            .partition(|s| available.iter().any(|a| a == s));
        self.secrets = kept;
        removed
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> CoreResult<()> {
    let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));
    std::fs::write(&tmp, content)?;
    if let Err(err) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.store_path.is_empty());
        assert_eq!(settings.auth_method(), DEFAULT_AUTH_METHOD);
        assert!(settings.secrets.is_empty());
        assert!(matches!(
            settings.vault_url(),
            Err(CoreError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested"));
        assert_eq!(Settings::load(&paths).unwrap(), Settings::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut settings = Settings {
            vault_address: Some("https://vault.example.com".into()),
            username: Some("alice".into()),
            auth_method: Some("ldap".into()),
            ..Default::default()
        };
        settings.set_store_path("/kv/team");
        settings.activate("personal/");
        settings.save(&paths).unwrap();

        let loaded = Settings::load(&paths).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.store_path, "kv/team");
        assert_eq!(loaded.auth_method(), "ldap");
    }

    #[test]
    fn test_save_replaces_the_file_instead_of_rewriting_it() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let old = Settings {
            username: Some("alice".into()),
            ..Default::default()
        };
        old.save(&paths).unwrap();

        // A reader holding the previous file keeps seeing complete old content.
        let held = dir.path().join("held.json");
        std::fs::hard_link(paths.settings_file(), &held).unwrap();

        let mut new = old.clone();
        new.activate("personal/");
        new.save(&paths).unwrap();

        let held: Settings = serde_json::from_str(&std::fs::read_to_string(&held).unwrap()).unwrap();
        assert_eq!(held, old);
        assert_eq!(Settings::load(&paths).unwrap(), new);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_set_store_path_strips_only_one_slash() {
        let mut settings = Settings::default();
        settings.set_store_path("//secret");
        assert_eq!(settings.store_path, "/secret");
        settings.set_store_path("secret/x");
        assert_eq!(settings.store_path, "secret/x");
    }

    #[test]
    fn test_vault_address_trims_trailing_slash() {
        let settings = Settings {
            vault_address: Some("https://vault.example.com/".into()),
            ..Default::default()
        };
        assert_eq!(settings.vault_address().unwrap(), "https://vault.example.com");
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        let settings = Settings {
            vault_address: Some("not a url".into()),
            ..Default::default()
        };
        assert!(matches!(settings.vault_url(), Err(CoreError::InvalidUrl(_))));
    }

    #[test]
    fn test_activate_is_idempotent() {
        let mut settings = Settings::default();
        assert!(settings.activate("team/"));
        assert!(!settings.activate("team/"));
        assert_eq!(settings.secrets, vec!["team/".to_string()]);
    }

    #[test]
    fn test_deactivate_removes_all_occurrences() {
        let mut settings = Settings {
            secrets: vec!["a/".into(), "b/".into(), "a/".into()],
            ..Default::default()
        };
        assert_eq!(settings.deactivate("a/"), 2);
        assert_eq!(settings.secrets, vec!["b/".to_string()]);
        assert_eq!(settings.deactivate("missing/"), 0);
    }

    #[test]
    fn test_prune_keeps_only_available() {
        let mut settings = Settings {
            secrets: vec!["a/".into(), "gone/".into(), "b/".into()],
            ..Default::default()
        };
        let removed = settings.prune(&["a/".to_string(), "b/".to_string(), "c/".to_string()]);
        assert_eq!(removed, vec!["gone/".to_string()]);
        assert_eq!(settings.secrets, vec!["a/".to_string(), "b/".to_string()]);
    }
}
