use async_trait::async_trait;
use vault_kv_client::{TokenInfo, VaultClient, VaultResult};

/// Token calls the renewer needs.
#[async_trait]
pub trait TokenApi: Send + Sync {
    async fn lookup_self(&self) -> VaultResult<TokenInfo>;

    /// Renew the token and return the new lease in seconds.
    async fn renew_self(&self, increment: &str) -> VaultResult<u64>;
}

#[async_trait]
impl TokenApi for VaultClient {
    async fn lookup_self(&self) -> VaultResult<TokenInfo> {
        VaultClient::lookup_self(self).await
    }

    async fn renew_self(&self, increment: &str) -> VaultResult<u64> {
        VaultClient::renew_self(self, increment).await
    }
}
