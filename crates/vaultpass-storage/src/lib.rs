//! Secure local storage for VaultPass.
//!
//! The auth token never goes into the settings file. It lives behind the
//! [`SecureStorage`] trait, backed by a permission-restricted JSON file
//! ([`FileStorage`]) in production and [`MemoryStorage`] in tests.

mod file;
mod keys;
mod memory;
mod token;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use token::{TokenMeta, TokenStore};
pub use traits::SecureStorage;

use thiserror::Error;
use vaultpass_config::Paths;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Encoding(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the default storage backend under the given paths.
pub fn create_storage(paths: &Paths) -> StorageResult<Box<dyn SecureStorage>> {
    let storage = FileStorage::open(paths.token_store_file())?;
    Ok(Box::new(storage))
}

/// Create a [`TokenStore`] with the default storage backend.
pub fn create_token_store(paths: &Paths) -> StorageResult<TokenStore> {
    let storage = create_storage(paths)?;
    Ok(TokenStore::new(storage))
}
