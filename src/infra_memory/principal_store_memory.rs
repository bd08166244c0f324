use crate::application_port::*;
use crate::domain_port::*;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryPrincipalStore {
    principals: DashMap<String, PrincipalRecord>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: PrincipalRecord) {
        self.principals.insert(record.username.clone(), record);
    }
}

#[async_trait::async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn find_principal(&self, username: &str) -> Result<Option<PrincipalRecord>, AuthError> {
        Ok(self.principals.get(username).map(|r| r.value().clone()))
    }
}
