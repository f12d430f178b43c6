//! Login, logout, token status and token storage from the extension.

use crate::context::AppContext;
use crate::output;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::info;
use vault_kv_client::{LoginAuth, VaultError, DEFAULT_STORE_PATH};
use vaultpass_config::Settings;

/// Connection details supplied at login. `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct LoginTarget {
    pub address: Option<String>,
    pub auth_method: Option<String>,
    pub store_path: Option<String>,
}

impl LoginTarget {
    /// Apply onto `settings`; a leading `/` on the store path is dropped.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(address) = &self.address {
            settings.vault_address = Some(address.trim().to_string());
        }
        if let Some(method) = &self.auth_method {
            settings.auth_method = Some(method.trim().to_string());
        }
        if let Some(store_path) = &self.store_path {
            settings.set_store_path(store_path.trim());
        }
    }
}

/// Log in with a username and password, then persist token and settings.
pub async fn login(
    context: &AppContext,
    target: &LoginTarget,
    username: &str,
    password: &str,
) -> Result<LoginAuth> {
    let mut settings = context.settings()?;
    target.apply(&mut settings);

    let client = context.anonymous_client(&settings)?;
    let auth = client
        .login(settings.auth_method(), username, password)
        .await?;

    context
        .tokens()
        .set_token(&auth.client_token, &auth.policies)
        .context("Failed to store token")?;
    settings.username = Some(username.to_string());
    context.save_settings(&settings)?;

    info!(username = %username, policies = ?auth.policies, "Login complete");
    Ok(auth)
}

/// Store a token obtained outside the CLI, optionally with the server address.
pub fn store_token(
    context: &AppContext,
    token: &str,
    policies: &[String],
    address: Option<&str>,
) -> Result<()> {
    if let Some(address) = address.filter(|a| !a.is_empty()) {
        let mut settings = context.settings()?;
        settings.vault_address = Some(address.to_string());
        context.save_settings(&settings)?;
    }
    context
        .tokens()
        .set_token(token, policies)
        .context("Failed to store token")?;
    info!(policies = ?policies, "Stored token");
    Ok(())
}

/// Forget the stored token. Returns whether one existed.
pub fn logout(context: &AppContext) -> Result<bool> {
    let existed = context.tokens().clear().context("Failed to clear token")?;
    info!(existed, "Logged out");
    Ok(existed)
}

#[derive(Debug, Serialize)]
pub struct TokenStatus {
    pub ttl: u64,
    pub policies: Vec<String>,
    pub renewable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub store_path: String,
    pub secrets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", output::heading("VaultPass status"))?;
        writeln!(
            f,
            "{}",
            output::row("Server", self.address.as_deref().unwrap_or("not configured"))
        )?;
        if let Some(username) = &self.username {
            writeln!(f, "{}", output::row("User", username))?;
        }
        writeln!(f, "{}", output::row("Store path", &self.store_path))?;
        let secrets = if self.secrets.is_empty() {
            "none".to_string()
        } else {
            self.secrets.join(", ")
        };
        writeln!(f, "{}", output::row("Directories", &secrets))?;
        writeln!(
            f,
            "{}",
            output::row("Logged in", if self.logged_in { "yes" } else { "no" })
        )?;
        if let Some(stored_at) = &self.stored_at {
            writeln!(f, "{}", output::row("Token stored", &stored_at.to_rfc3339()))?;
        }
        if let Some(token) = &self.token {
            writeln!(f, "{}", output::row("TTL", &format!("{}s", token.ttl)))?;
            writeln!(f, "{}", output::row("Policies", &token.policies.join(", ")))?;
            writeln!(
                f,
                "{}",
                output::row("Renewable", if token.renewable { "yes" } else { "no" })
            )?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "{}", output::row("Error", error))?;
        }
        Ok(())
    }
}

/// Settings summary plus a token lookup when a token is stored.
pub async fn status(context: &AppContext) -> Result<StatusReport> {
    let settings = context.settings()?;
    let meta = context.tokens().get_meta().context("Failed to read token")?;

    let (token, error) = match context.client(&settings) {
        Ok(client) => match client.lookup_self().await {
            Ok(info) => (
                Some(TokenStatus {
                    ttl: info.ttl,
                    policies: info.policies,
                    renewable: info.renewable,
                    display_name: info.display_name,
                }),
                None,
            ),
            Err(err) => (None, Some(err.to_string())),
        },
        Err(VaultError::MissingToken) => (None, None),
        Err(err) => (None, Some(err.to_string())),
    };

    Ok(StatusReport {
        logged_in: token.is_some(),
        address: settings.vault_address.clone(),
        username: settings.username.clone(),
        store_path: if settings.store_path.is_empty() {
            DEFAULT_STORE_PATH.to_string()
        } else {
            settings.store_path.clone()
        },
        secrets: settings.secrets,
        stored_at: meta.map(|m| m.stored_at),
        token,
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::context_for;
    use serde_json::json;
    use tempfile::tempdir;
    use vault_kv_client::testing::{StubResponse, StubServer};

    #[tokio::test]
    async fn login_stores_token_and_settings() {
        let server = StubServer::start(vec![(
            "POST",
            "/v1/auth/ldap/login/alice",
            StubResponse::json(
                200,
                json!({"auth": {"client_token": "s.new", "policies": ["default", "kv-read"], "lease_duration": 3600}}),
            ),
        )])
        .await;
        let dir = tempdir().unwrap();
        let context = context_for(&server, &dir);
        context.tokens().clear().unwrap();

        let target = LoginTarget {
            address: None,
            auth_method: Some("ldap".into()),
            store_path: Some("/kv/passwords".into()),
        };
        let auth = login(&context, &target, "alice", "hunter2").await.unwrap();

        assert_eq!(auth.client_token, "s.new");
        assert_eq!(context.tokens().get_token().unwrap().as_deref(), Some("s.new"));
        let settings = context.settings().unwrap();
        assert_eq!(settings.username.as_deref(), Some("alice"));
        assert_eq!(settings.auth_method(), "ldap");
        assert_eq!(settings.store_path, "kv/passwords");
        assert_eq!(server.requests()[0].json(), json!({"password": "hunter2"}));
    }

    #[tokio::test]
    async fn failed_login_keeps_previous_token() {
        let server = StubServer::start(vec![(
            "POST",
            "/v1/auth/userpass/login/alice",
            StubResponse::json(400, json!({"errors": ["invalid username or password"]})),
        )])
        .await;
        let dir = tempdir().unwrap();
        let context = context_for(&server, &dir);

        let err = login(&context, &LoginTarget::default(), "alice", "wrong")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("invalid username or password"));
        assert_eq!(
            context.tokens().get_token().unwrap().as_deref(),
            Some("s.test-token")
        );
    }

    #[tokio::test]
    async fn status_reports_token_lookup() {
        let server = StubServer::start(vec![(
            "GET",
            "/v1/auth/token/lookup-self",
            StubResponse::json(
                200,
                json!({"data": {"ttl": 600, "policies": ["default"], "renewable": true}}),
            ),
        )])
        .await;
        let dir = tempdir().unwrap();
        let context = context_for(&server, &dir);

        let report = status(&context).await.unwrap();
        assert!(report.logged_in);
        assert_eq!(report.store_path, "secret/vaultPass");
        assert_eq!(report.token.as_ref().map(|t| t.ttl), Some(600));
        assert!(report.to_string().contains("600s"));

        assert!(logout(&context).unwrap());
        assert!(!logout(&context).unwrap());
        let report = status(&context).await.unwrap();
        assert!(!report.logged_in);
        assert!(report.error.is_none());
    }

    #[test]
    fn stored_token_updates_address() {
        let dir = tempdir().unwrap();
        let context = AppContext::with_storage(
            vaultpass_config::Paths::with_base_dir(dir.path().to_path_buf()),
            Box::new(vaultpass_storage::MemoryStorage::new()),
        );

        store_token(&context, "s.grabbed", &["default".to_string()], Some("https://vault.example.com"))
            .unwrap();

        assert_eq!(context.tokens().get_token().unwrap().as_deref(), Some("s.grabbed"));
        assert_eq!(
            context.settings().unwrap().vault_address.as_deref(),
            Some("https://vault.example.com")
        );
    }
}
