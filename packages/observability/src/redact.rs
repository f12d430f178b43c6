//! Redaction of credential-looking log fields.

use serde_json::Value;

/// Replacement written in place of a redacted value.
pub const REDACTED: &str = "[REDACTED]";

const DENYLIST_KEYS: [&str; 8] = [
    "token",
    "password",
    "secret_value",
    "authorization",
    "x-vault-token",
    "cookie",
    "private_key",
    "increment_token",
];

/// Returns true if a field name looks like it carries a credential.
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|entry| lower.contains(entry))
}

pub(crate) fn sanitize_value(key: &str, value: Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String(REDACTED.to_string());
    }

    match value {
        Value::String(s) if looks_like_bearer(&s) => Value::String(REDACTED.to_string()),
        other => other,
    }
}

fn looks_like_bearer(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    // Vault service tokens carry an `hvs.` prefix.
    lower.starts_with("bearer ") || (raw.starts_with("hvs.") && raw.len() > 20)
}
