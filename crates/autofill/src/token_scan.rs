//! Picking up a login token left in page local storage by the server's web UI.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A token record found in local storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    pub policies: Vec<String>,
    pub ttl: Option<u64>,
}

impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("token", &"[REDACTED]")
            .field("policies", &self.policies)
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn parse_record(raw: &str) -> Option<TokenRecord> {
    let Value::Object(object) = serde_json::from_str::<Value>(raw).ok()? else {
        return None;
    };
    if !(object.contains_key("token") && object.contains_key("ttl") && object.contains_key("policies")) {
        return None;
    }
    let token = object.get("token")?.as_str()?.to_string();
    let policies = object
        .get("policies")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|p| p.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let ttl = object.get("ttl").and_then(Value::as_u64);
    Some(TokenRecord { token, policies, ttl })
}

/// First local-storage value that is a JSON object with `token`, `ttl` and
/// `policies`. Values that are not JSON are skipped.
pub fn find_token_record(local_storage: &[String]) -> Option<TokenRecord> {
    let found = local_storage.iter().find_map(|raw| parse_record(raw));
    debug!(scanned = local_storage.len(), found = found.is_some(), "Scanned local storage for token");
    found
}
