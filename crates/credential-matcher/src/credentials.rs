//! Credential sets extracted from entry fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One username/password pair with display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn suffixed_or_plain(data: &Map<String, Value>, base: &str, suffix: &str) -> String {
    data.get(&format!("{base}{suffix}"))
        .or_else(|| data.get(base))
        .and_then(field_text)
        .unwrap_or_default()
}

/// Pair every `username<suffix>` field with its `password<suffix>`.
///
/// Pairs without a non-empty password are skipped. `title<suffix>` and
/// `comment<suffix>` fall back to the unsuffixed field, then to empty.
pub fn extract_credential_sets(data: &Map<String, Value>) -> Vec<CredentialSet> {
    data.iter()
        .filter_map(|(key, value)| {
            let suffix = key.strip_prefix("username")?;
            let password = data
                .get(&format!("password{suffix}"))
                .and_then(field_text)
                .filter(|p| !p.is_empty())?;
            Some(CredentialSet {
                username: field_text(value).unwrap_or_default(),
                password,
                title: suffixed_or_plain(data, "title", suffix),
                comment: suffixed_or_plain(data, "comment", suffix),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn plain_pair() {
        let sets = extract_credential_sets(&map(json!({
            "username": "alice",
            "password": "pw",
            "title": "Work",
        })));
        assert_eq!(
            sets,
            vec![CredentialSet {
                username: "alice".into(),
                password: "pw".into(),
                title: "Work".into(),
                comment: String::new(),
            }]
        );
    }

    #[test]
    fn suffixed_pairs_and_fallbacks() {
        let sets = extract_credential_sets(&map(json!({
            "username": "main",
            "password": "main-pw",
            "username-vaultpass-bob": "bob",
            "password-vaultpass-bob": "bob-pw",
            "title-vaultpass-bob": "Bob's",
            "title": "Shared",
            "comment": "team account",
        })));
        assert_eq!(sets.len(), 2);

        let bob = sets.iter().find(|s| s.username == "bob").unwrap();
        assert_eq!(bob.title, "Bob's");
        assert_eq!(bob.comment, "team account");

        let main = sets.iter().find(|s| s.username == "main").unwrap();
        assert_eq!(main.title, "Shared");
    }

    #[test]
    fn username_without_password_is_skipped() {
        let sets = extract_credential_sets(&map(json!({
            "username": "alice",
            "username2": "bob",
            "password2": "",
        })));
        assert!(sets.is_empty());
    }

    #[test]
    fn non_string_values_are_rendered() {
        let sets = extract_credential_sets(&map(json!({
            "username": 1234,
            "password": 5678,
        })));
        assert_eq!(sets[0].username, "1234");
        assert_eq!(sets[0].password, "5678");
    }
}
