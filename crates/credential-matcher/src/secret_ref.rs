//! References to one entry in one secret directory.

use serde::{Deserialize, Serialize};

const SEPARATOR: &str = "##";

/// A secret directory plus an entry name within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretRef {
    pub store_path: String,
    pub name: String,
}

impl SecretRef {
    pub fn new(store_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            store_path: store_path.into(),
            name: name.into(),
        }
    }

    /// `store_path##name`, used for de-duplication and remembered choices.
    pub fn combined_key(&self) -> String {
        format!("{}{}{}", self.store_path, SEPARATOR, self.name)
    }

    /// Inverse of [`SecretRef::combined_key`]; splits at the first `##`.
    pub fn parse_combined(combined: &str) -> Option<Self> {
        let (store_path, name) = combined.split_once(SEPARATOR)?;
        Some(Self::new(store_path, name))
    }
}
