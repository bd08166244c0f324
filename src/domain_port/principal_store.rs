use crate::application_port::AuthError;

#[derive(Debug, Clone)]
pub struct PrincipalRecord {
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
}

#[async_trait::async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Fetch credentials by username (for login).
    async fn find_principal(&self, username: &str) -> Result<Option<PrincipalRecord>, AuthError>;
}
