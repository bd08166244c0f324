use crate::application_port::AuthError;

/// Shared, TTL-expiring record of revoked tokens. Implementations must be
/// visible to every server instance; failures are `AuthError::StoreUnavailable`.
#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync {
    /// Records `key` as revoked for `ttl_secs`. Repeating the call is harmless.
    async fn put(&self, key: &str, ttl_secs: u64) -> Result<(), AuthError>;
    async fn exists(&self, key: &str) -> Result<bool, AuthError>;
}
