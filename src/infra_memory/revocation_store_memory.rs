use crate::application_port::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct MemoryRevocationStore {
    entries: DashMap<String, Instant>,
}

impl Debug for MemoryRevocationStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRevocationStore")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time left before `key` drops out of the store, if it is still there.
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        let expires_at = *self.entries.get(key)?;
        expires_at.checked_duration_since(Instant::now())
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, expires_at| *expires_at > now);
    }
}

#[async_trait::async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn put(&self, key: &str, ttl_secs: u64) -> Result<(), AuthError> {
        self.purge_expired();
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs.max(1));
        self.entries.insert(key.to_string(), expires_at);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AuthError> {
        Ok(self.remaining(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_is_idempotent_and_visible() {
        let store = MemoryRevocationStore::new();
        assert!(!store.exists("token").await.unwrap());

        store.put("token", 30).await.unwrap();
        store.put("token", 30).await.unwrap();
        assert!(store.exists("token").await.unwrap());
        assert!(store.remaining("token").unwrap() <= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn entries_expire() {
        let store = MemoryRevocationStore::new();
        store.put("token", 1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!store.exists("token").await.unwrap());
    }
}
