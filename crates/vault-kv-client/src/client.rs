//! KV v2 client.
//!
//! All entry points resolve paths through the configured [`StorePath`]:
//! `{address}/v1/{root}/{metadata|data}{sub_path}/{dir}{name}`. The token is
//! sent in the `X-Vault-Token` header and never logged.

use crate::error::{VaultError, VaultResult};
use crate::store_path::{encode_entry_name, Segment, StorePath};
use crate::types::{
    AuthResponse, ErrorBody, ListResponse, LoginAuth, LoginRequest, LookupResponse, ReadResponse,
    RenewRequest, SecretEntry, TokenInfo, WriteOptions, WriteRequest,
};
use reqwest::Method;
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, error, info, warn};

/// Header carrying the client token.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

fn list_method() -> VaultResult<Method> {
    Method::from_bytes(b"LIST").map_err(|err| VaultError::InvalidRequest(err.to_string()))
}

/// Client for one secrets server and store path.
#[derive(Clone, Debug)]
pub struct VaultClient {
    http_client: reqwest::Client,
    address: String,
    token: Option<String>,
    store: StorePath,
}

impl VaultClient {
    /// Create a client without a token (enough for [`VaultClient::login`]).
    pub fn new(address: impl Into<String>, store: StorePath) -> Self {
        Self::with_http_client(reqwest::Client::new(), address, store)
    }

    /// Create a client on top of an existing `reqwest::Client`.
    pub fn with_http_client(
        http_client: reqwest::Client,
        address: impl Into<String>,
        store: StorePath,
    ) -> Self {
        let address = address.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            address,
            token: None,
            store,
        }
    }

    /// Attach the token used for authenticated calls.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn store(&self) -> &StorePath {
        &self.store
    }

    fn url(&self, api_path: &str) -> String {
        format!("{}/v1/{}", self.address, api_path.trim_start_matches('/'))
    }

    async fn request(
        &self,
        method: Method,
        api_path: &str,
        body: Option<Value>,
        authenticated: bool,
    ) -> VaultResult<reqwest::Response> {
        let url = self.url(api_path);
        let mut builder = self
            .http_client
            .request(method.clone(), &url)
            .header("Content-Type", "application/json");

        if authenticated {
            let token = self.token.as_deref().ok_or(VaultError::MissingToken)?;
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        debug!(method = %method, path = %api_path, "Sending Vault request");
        let response = builder.send().await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let errors = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.errors)
            .unwrap_or_default();
        let message = if errors.is_empty() {
            format!("upstream error ({})", summarize_response_body(&body))
        } else {
            errors.join(". ")
        };

        if status == 404 {
            debug!(method = %method, path = %api_path, "Vault path not found");
        } else {
            error!(
                method = %method,
                path = %api_path,
                status,
                body_summary = %summarize_response_body(&body),
                "Vault API error"
            );
        }

        Err(VaultError::Api {
            method: method.to_string(),
            url,
            status,
            message,
        })
    }

    /// LIST the keys under `dir` (empty lists the store root).
    ///
    /// Fails on any non-success status, including 404.
    pub async fn list(&self, dir: &str) -> VaultResult<Vec<String>> {
        let api_path = self.store.api_path(Segment::Metadata, dir);
        let response = self.request(list_method()?, &api_path, None, true).await?;
        let listing: ListResponse = response.json().await?;
        debug!(path = %api_path, keys = listing.data.keys.len(), "Listed keys");
        Ok(listing.data.keys)
    }

    /// LIST the keys under `dir`, treating 404 as an empty directory.
    pub async fn list_or_empty(&self, dir: &str) -> VaultResult<Vec<String>> {
        match self.list(dir).await {
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }

    /// Read entry `name` in directory `dir`. Returns `None` on 404.
    pub async fn read(&self, dir: &str, name: &str) -> VaultResult<Option<SecretEntry>> {
        let path = format!("{}{}", dir, encode_entry_name(name));
        let api_path = self.store.api_path(Segment::Data, &path);
        let response = match self.request(Method::GET, &api_path, None, true).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err),
        };

        let parsed: ReadResponse = response.json().await?;
        Ok(Some(SecretEntry {
            data: parsed.data.data.unwrap_or_default(),
            version: parsed.data.metadata.map(|m| m.version).unwrap_or(0),
        }))
    }

    /// Write entry `name` in directory `dir`.
    ///
    /// With `cas = Some(v)` the server rejects the write unless the entry's
    /// current version is `v` (0 meaning "must not exist yet").
    pub async fn write(
        &self,
        dir: &str,
        name: &str,
        data: &Map<String, Value>,
        cas: Option<u64>,
    ) -> VaultResult<()> {
        let path = format!("{}{}", dir, encode_entry_name(name));
        let api_path = self.store.api_path(Segment::Data, &path);
        let body = serde_json::to_value(WriteRequest {
            data,
            options: cas.map(|cas| WriteOptions { cas }),
        })?;

        self.request(Method::POST, &api_path, Some(body), true).await?;
        info!(path = %api_path, fields = data.len(), cas = ?cas, "Wrote Vault entry");
        Ok(())
    }

    /// Log in through `auth/{method}/login/{username}`.
    pub async fn login(
        &self,
        method: &str,
        username: &str,
        password: &str,
    ) -> VaultResult<LoginAuth> {
        let api_path = format!(
            "auth/{}/login/{}",
            method,
            urlencoding::encode(username)
        );
        let body = serde_json::to_value(LoginRequest { password })?;
        let response = self
            .request(Method::POST, &api_path, Some(body), false)
            .await?;
        let parsed: AuthResponse = response.json().await?;

        let auth = parsed
            .auth
            .ok_or_else(|| VaultError::InvalidResponse("login response has no auth block".into()))?;
        let client_token = auth
            .client_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VaultError::InvalidResponse("login response has no client_token".into()))?;

        info!(
            auth_method = %method,
            policies = ?auth.policies,
            lease_duration = auth.lease_duration,
            "Logged in to Vault"
        );

        Ok(LoginAuth {
            client_token,
            policies: auth.policies,
            lease_duration: auth.lease_duration,
        })
    }

    /// Inspect the current token.
    pub async fn lookup_self(&self) -> VaultResult<TokenInfo> {
        let response = self
            .request(Method::GET, "auth/token/lookup-self", None, true)
            .await?;
        let parsed: LookupResponse = response.json().await?;
        debug!(ttl = parsed.data.ttl, "Token lookup");
        Ok(parsed.data)
    }

    /// Renew the current token by `increment` (e.g. `24h`).
    ///
    /// Returns the new lease duration in seconds.
    pub async fn renew_self(&self, increment: &str) -> VaultResult<u64> {
        let body = serde_json::to_value(RenewRequest { increment })?;
        let response = self
            .request(Method::POST, "auth/token/renew-self", Some(body), true)
            .await?;
        let parsed: AuthResponse = response.json().await?;
        let lease = parsed.auth.map(|a| a.lease_duration).unwrap_or_else(|| {
            warn!("Renew response has no auth block");
            0
        });
        info!(lease_duration = lease, "Token renewed");
        Ok(lease)
    }
}
