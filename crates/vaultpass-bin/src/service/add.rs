//! Adding credentials to a host entry and adding pattern keys.

use credential_matcher::{storage_name_for_pattern, validate_key_pattern, MatcherError};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;
use vault_kv_client::{VaultClient, VaultError};

#[derive(Error, Debug)]
pub enum AddError {
    #[error("Bad input, url has slash")]
    SlashInUrl,

    #[error("Bad input, field is empty")]
    EmptyField,

    #[error("Please select a secret path.")]
    NoDirectory,

    #[error("URL pattern, username, and password are required.")]
    MissingKeyFields,

    #[error(transparent)]
    Pattern(#[from] MatcherError),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Where a credential pair was written.
#[derive(Debug, Serialize)]
pub struct AddedEntry {
    pub path: String,
    pub field: String,
    /// Version the write was conditioned on (0 for a new entry).
    pub cas: u64,
}

/// Add a login to the entry named after a host.
///
/// Existing fields are kept; the pair lands in
/// `username-vaultpass-<login>`/`password-vaultpass-<login>`. The write is
/// conditioned on the version read, so a concurrent change makes it fail.
pub async fn add_credentials(
    client: &VaultClient,
    dir: &str,
    url: &str,
    login: &str,
    password: &str,
) -> Result<AddedEntry, AddError> {
    if url.contains('/') {
        return Err(AddError::SlashInUrl);
    }
    if dir.is_empty() || url.is_empty() || login.is_empty() || password.is_empty() {
        return Err(AddError::EmptyField);
    }

    let (mut data, cas) = match client.read(dir, url).await? {
        Some(entry) => (entry.data, entry.version),
        None => (Map::new(), 0),
    };

    let field = format!("username-vaultpass-{}", login);
    data.insert(field.clone(), Value::String(login.to_string()));
    data.insert(
        format!("password-vaultpass-{}", login),
        Value::String(password.to_string()),
    );

    client.write(dir, url, &data, Some(cas)).await?;

    let path = format!("{}{}", dir, url);
    info!(path = %path, cas, "Added credentials");
    Ok(AddedEntry { path, field, cas })
}

/// Store a new key whose name is a URL pattern.
///
/// Returns the storage name (the pattern percent-encoded once).
pub async fn add_key(
    client: &VaultClient,
    dir: &str,
    pattern: &str,
    username: &str,
    password: &str,
    title: Option<&str>,
) -> Result<String, AddError> {
    let dir = dir.trim();
    let pattern = pattern.trim();
    let username = username.trim();
    let password = password.trim();
    let title = title.map(str::trim).filter(|t| !t.is_empty());

    if dir.is_empty() {
        return Err(AddError::NoDirectory);
    }
    if pattern.is_empty() || username.is_empty() || password.is_empty() {
        return Err(AddError::MissingKeyFields);
    }
    validate_key_pattern(pattern)?;

    let mut data = Map::new();
    data.insert("username".into(), Value::String(username.to_string()));
    data.insert("password".into(), Value::String(password.to_string()));
    if let Some(title) = title {
        data.insert("title".into(), Value::String(title.to_string()));
    }

    let name = storage_name_for_pattern(pattern);
    client.write(dir, &name, &data, None).await?;
    info!(dir = %dir, key = %name, "Saved key");
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vault_kv_client::testing::{StubResponse, StubServer};
    use vault_kv_client::StorePath;

    #[tokio::test]
    async fn credentials_are_merged_with_cas() {
        let server = StubServer::start(vec![
            (
                "GET",
                "/v1/secret/data/vaultPass/personal/example.com",
                StubResponse::json(
                    200,
                    json!({"data": {"data": {"username": "old", "password": "pw0"}, "metadata": {"version": 3}}}),
                ),
            ),
            (
                "POST",
                "/v1/secret/data/vaultPass/personal/example.com",
                StubResponse::json(200, json!({"data": {"version": 4}})),
            ),
        ])
        .await;
        let client = server.client(StorePath::default()).with_token("s.t");

        let added = add_credentials(&client, "personal/", "example.com", "alice", "s3cret")
            .await
            .unwrap();

        assert_eq!(added.path, "personal/example.com");
        assert_eq!(added.field, "username-vaultpass-alice");
        assert_eq!(added.cas, 3);

        let requests = server.requests();
        let post = requests.iter().find(|r| r.method == "POST").unwrap();
        let body = post.json();
        assert_eq!(body["options"]["cas"], 3);
        assert_eq!(body["data"]["username"], "old");
        assert_eq!(body["data"]["username-vaultpass-alice"], "alice");
        assert_eq!(body["data"]["password-vaultpass-alice"], "s3cret");
    }

    #[tokio::test]
    async fn new_entry_uses_cas_zero() {
        let server = StubServer::start(vec![(
            "POST",
            "/v1/secret/data/vaultPass/personal/example.com",
            StubResponse::json(200, json!({"data": {"version": 1}})),
        )])
        .await;
        let client = server.client(StorePath::default()).with_token("s.t");

        let added = add_credentials(&client, "personal/", "example.com", "bob", "pw")
            .await
            .unwrap();
        assert_eq!(added.cas, 0);
        let requests = server.requests();
        let post = requests.iter().find(|r| r.method == "POST").unwrap();
        assert_eq!(post.json()["options"]["cas"], 0);
    }

    #[tokio::test]
    async fn credential_input_is_checked_before_any_request() {
        let server = StubServer::start(vec![]).await;
        let client = server.client(StorePath::default()).with_token("s.t");

        let err = add_credentials(&client, "personal/", "example.com/login", "a", "b")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad input, url has slash");

        let err = add_credentials(&client, "personal/", "example.com", "", "b")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad input, field is empty");
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn key_name_is_encoded_twice_on_the_wire() {
        let server = StubServer::start(vec![(
            "POST",
            "/v1/secret/data/vaultPass/personal/a%252Fb",
            StubResponse::json(200, json!({"data": {"version": 1}})),
        )])
        .await;
        let client = server.client(StorePath::default()).with_token("s.t");

        let name = add_key(&client, "personal/", " a/b ", "alice", "pw", Some("  "))
            .await
            .unwrap();

        assert_eq!(name, "a%2Fb");
        let body = server.requests()[0].json();
        assert_eq!(body["data"], json!({"username": "alice", "password": "pw"}));
        assert!(body.get("options").is_none());
    }

    #[tokio::test]
    async fn key_input_is_validated() {
        let server = StubServer::start(vec![]).await;
        let client = server.client(StorePath::default()).with_token("s.t");

        let err = add_key(&client, "", "x", "u", "p", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Please select a secret path.");

        let err = add_key(&client, "personal/", "x", "", "p", None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "URL pattern, username, and password are required."
        );

        let err = add_key(&client, "personal/", "https://example.com", "u", "p", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AddError::Pattern(MatcherError::UrlScheme)));

        let err = add_key(&client, "personal/", "(", "u", "p", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AddError::Pattern(MatcherError::InvalidRegex(_))));
        assert!(server.requests().is_empty());
    }
}
