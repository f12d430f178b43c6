//! High-level API for the secrets server auth token.

use crate::{SecureStorage, StorageKeys, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata stored alongside the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    /// Policies the server attached at login.
    #[serde(default)]
    pub policies: Vec<String>,
    /// When the token was stored.
    pub stored_at: DateTime<Utc>,
}

/// Stores and clears the auth token.
pub struct TokenStore {
    storage: Box<dyn SecureStorage>,
}

impl TokenStore {
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Store a freshly issued token.
    pub fn set_token(&self, token: &str, policies: &[String]) -> StorageResult<()> {
        self.storage.set(StorageKeys::VAULT_TOKEN, token)?;
        let meta = TokenMeta {
            policies: policies.to_vec(),
            stored_at: Utc::now(),
        };
        self.storage
            .set(StorageKeys::VAULT_TOKEN_META, &serde_json::to_string(&meta)?)
    }

    /// The current token, if any. An empty stored value counts as none.
    pub fn get_token(&self) -> StorageResult<Option<String>> {
        Ok(self
            .storage
            .get(StorageKeys::VAULT_TOKEN)?
            .filter(|t| !t.is_empty()))
    }

    pub fn has_token(&self) -> StorageResult<bool> {
        Ok(self.get_token()?.is_some())
    }

    pub fn get_meta(&self) -> StorageResult<Option<TokenMeta>> {
        match self.storage.get(StorageKeys::VAULT_TOKEN_META)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Forget the token (logout). Returns whether one was stored.
    pub fn clear(&self) -> StorageResult<bool> {
        let existed = self.storage.delete(StorageKeys::VAULT_TOKEN)?;
        self.storage.delete(StorageKeys::VAULT_TOKEN_META)?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;

    #[test]
    fn test_token_lifecycle() {
        let store = TokenStore::new(Box::new(MemoryStorage::new()));
        assert!(!store.has_token().unwrap());

        store
            .set_token("s.token", &["default".to_string(), "kv-read".to_string()])
            .unwrap();
        assert_eq!(store.get_token().unwrap(), Some("s.token".to_string()));

        let meta = store.get_meta().unwrap().unwrap();
        assert_eq!(meta.policies, vec!["default", "kv-read"]);

        assert!(store.clear().unwrap());
        assert!(!store.has_token().unwrap());
        assert!(store.get_meta().unwrap().is_none());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let storage = MemoryStorage::new();
        storage.set(StorageKeys::VAULT_TOKEN, "").unwrap();
        let store = TokenStore::new(Box::new(storage));
        assert_eq!(store.get_token().unwrap(), None);
    }
}
