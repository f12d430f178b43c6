//! Storage key constants.

/// Storage keys used by VaultPass
pub struct StorageKeys;

impl StorageKeys {
    /// Secrets server client token
    pub const VAULT_TOKEN: &'static str = "vault_token";

    /// Token metadata (JSON): policies and when it was stored
    pub const VAULT_TOKEN_META: &'static str = "vault_token_meta";
}
