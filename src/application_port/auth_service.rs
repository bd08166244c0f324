use crate::application_port::{AccessToken, RefreshToken, TokenError};
use crate::domain_model::{Principal, StorageLocation};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("missing '{0}' claim in token")]
    MissingClaim(String),
    #[error("token invalid: {0}")]
    TokenInvalid(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invalid token ttl: {0}")]
    InvalidTtl(i64),
    #[error("signing error: {0}")]
    SigningError(String),
    #[error("route catalog error: {0}")]
    RouteCatalog(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<TokenError> for AuthError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Malformed(e) => AuthError::Malformed(e),
            TokenError::InvalidSignature => AuthError::InvalidSignature,
            TokenError::Expired => AuthError::Expired,
            TokenError::MissingClaim(name) => AuthError::MissingClaim(name),
            e @ TokenError::WrongUse(_) => AuthError::TokenInvalid(e.to_string()),
            TokenError::Signing(e) => AuthError::SigningError(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub remember_me: bool,
}

/// A freshly minted, mutually bound token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub save_to: StorageLocation,
}

/// Instruction for the client to drop its stored pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDeletion {
    pub delete_from: StorageLocation,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

/// Token lifecycle: issuance, validation, binding, rotation and revocation.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: LoginInput) -> Result<AuthTokens, AuthError>;

    fn create_access_token(
        &self,
        principal: &Principal,
        ttl_secs: i64,
    ) -> Result<AccessToken, AuthError>;

    fn create_refresh_token(
        &self,
        principal: &Principal,
        access_token: &AccessToken,
        ttl_secs: i64,
    ) -> Result<RefreshToken, AuthError>;

    /// Verifies an access token and returns its subject.
    fn validate_token(&self, token: &str) -> Result<String, AuthError>;

    /// Reads the subject without verifying signature or expiry.
    fn inspect_subject(&self, token: &str) -> Result<String, AuthError>;

    /// Reads `remember_me` off an access token without verifying it.
    fn inspect_storage(&self, access_token: &str) -> Result<StorageLocation, AuthError>;

    fn is_binding_valid(&self, access_token: &str, refresh_token: &str)
    -> Result<bool, AuthError>;

    async fn rotate(&self, old_access: &str, old_refresh: &str) -> Result<AuthTokens, AuthError>;

    async fn logout(&self, access_token: &str, refresh_token: &str)
    -> Result<TokenDeletion, AuthError>;

    async fn is_revoked(&self, token: &str) -> Result<bool, AuthError>;
}
