use crate::domain_model::{AccessClaims, RefreshClaims, TokenUse};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("missing '{0}' claim in token")]
    MissingClaim(String),
    #[error("expected a {0} token")]
    WrongUse(TokenUse),
    #[error("signing error: {0}")]
    Signing(String),
}

/// How much of a token `TokenCodec` checks while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Signature, issuer, audience, `exp` and `nbf`.
    Verify,
    /// Structure only. Used to read claims of a token whose validity is
    /// established some other way, typically an expired access token.
    Inspect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RefreshToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub trait TokenCodec: Send + Sync {
    fn issue_access(&self, claims: &AccessClaims) -> Result<AccessToken, TokenError>;
    fn issue_refresh(&self, claims: &RefreshClaims) -> Result<RefreshToken, TokenError>;
    fn decode_access(&self, token: &str, mode: DecodeMode) -> Result<AccessClaims, TokenError>;
    fn decode_refresh(&self, token: &str, mode: DecodeMode) -> Result<RefreshClaims, TokenError>;
    /// Untyped access to a single claim, for the few places that read one
    /// field off a token of either kind.
    fn extract_claim(
        &self,
        token: &str,
        name: &str,
        mode: DecodeMode,
    ) -> Result<serde_json::Value, TokenError>;
}
