//! Client for a Vault-style KV v2 secrets server.
//!
//! Covers the calls VaultPass needs: LIST/GET/POST on the key-value store,
//! username/password login, and token lookup/renewal.

mod client;
mod error;
mod store_path;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use client::{VaultClient, TOKEN_HEADER};
pub use error::{VaultError, VaultResult};
pub use store_path::{encode_entry_name, Segment, StorePath, DEFAULT_STORE_PATH};
pub use types::{LoginAuth, SecretEntry, TokenInfo};
