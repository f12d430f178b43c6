//! Shared runtime state: paths, settings, the token store and client
//! construction.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use token_lifecycle::TokenApi;
use tracing::debug;
use vault_kv_client::{StorePath, TokenInfo, VaultClient, VaultError, VaultResult};
use vaultpass_config::{Paths, Settings};
use vaultpass_storage::{create_token_store, SecureStorage, TokenStore};

pub struct AppContext {
    paths: Paths,
    tokens: TokenStore,
    http_client: reqwest::Client,
}

impl AppContext {
    /// Open the context with the on-disk token store.
    pub fn open(paths: Paths) -> Result<Self> {
        paths.ensure_dirs()?;
        let tokens = create_token_store(&paths)?;
        Ok(Self {
            paths,
            tokens,
            http_client: reqwest::Client::new(),
        })
    }

    /// Build a context on an explicit storage backend.
    pub fn with_storage(paths: Paths, storage: Box<dyn SecureStorage>) -> Self {
        Self {
            paths,
            tokens: TokenStore::new(storage),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn settings(&self) -> Result<Settings> {
        Ok(Settings::load(&self.paths)?)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        settings.save(&self.paths)?;
        debug!(secrets = settings.secrets.len(), "Saved settings");
        Ok(())
    }

    /// Client for `settings` without a token.
    pub fn anonymous_client(&self, settings: &Settings) -> VaultResult<VaultClient> {
        let address = settings
            .vault_address()
            .map_err(|err| VaultError::InvalidRequest(err.to_string()))?;
        Ok(VaultClient::with_http_client(
            self.http_client.clone(),
            address,
            StorePath::parse(&settings.store_path),
        ))
    }

    /// Client for `settings` carrying the stored token.
    pub fn client(&self, settings: &Settings) -> VaultResult<VaultClient> {
        let token = self
            .tokens
            .get_token()
            .map_err(|err| VaultError::InvalidRequest(err.to_string()))?
            .ok_or(VaultError::MissingToken)?;
        Ok(self.anonymous_client(settings)?.with_token(token))
    }

    /// Client built from the settings currently on disk.
    pub fn current_client(&self) -> VaultResult<VaultClient> {
        let settings =
            Settings::load(&self.paths).map_err(|err| VaultError::InvalidRequest(err.to_string()))?;
        self.client(&settings)
    }
}

/// Token calls that re-read settings and token on every use, so a login
/// while the host runs is picked up by the renewer.
pub struct StoredTokenApi {
    context: Arc<AppContext>,
}

impl StoredTokenApi {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl TokenApi for StoredTokenApi {
    async fn lookup_self(&self) -> VaultResult<TokenInfo> {
        self.context.current_client()?.lookup_self().await
    }

    async fn renew_self(&self, increment: &str) -> VaultResult<u64> {
        self.context.current_client()?.renew_self(increment).await
    }
}
