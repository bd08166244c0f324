use crate::application_port::*;
use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Revocation list shared by every instance through one Redis keyspace.
/// Entries carry no value; presence of `{prefix}:{token}` is the revocation.
pub struct RedisRevocationStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisRevocationStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisRevocationStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, token: &str) -> String {
        format!("{}:{}", self.prefix, token)
    }
}

#[async_trait::async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(&self, key: &str, ttl_secs: u64) -> Result<(), AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, "", ttl_secs.max(1))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AuthError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let found: bool = conn
            .exists(&key)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(found)
    }
}
