use serde::{Deserialize, Serialize};
use std::fmt;

/// Which slot a token was minted for. Stops a refresh token from standing in
/// for an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

impl fmt::Display for TokenUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenUse::Access => write!(f, "access"),
            TokenUse::Refresh => write!(f, "refresh"),
        }
    }
}

/// Claims of a short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
    pub token_use: TokenUse,
    #[serde(default)]
    pub remember_me: bool,
}

impl AccessClaims {
    pub const REQUIRED: &'static [&'static str] =
        &["iss", "sub", "aud", "iat", "nbf", "exp", "jti", "token_use"];
}

/// Claims of a long-lived refresh token. `access_token_jti` binds it to the
/// access token it was issued alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
    pub token_use: TokenUse,
    pub access_token_jti: String,
}

impl RefreshClaims {
    pub const REQUIRED: &'static [&'static str] = &[
        "iss",
        "sub",
        "aud",
        "iat",
        "nbf",
        "exp",
        "jti",
        "token_use",
        "access_token_jti",
    ];
}

/// Names of the claims read through the untyped escape hatch.
pub mod claim {
    pub const SUBJECT: &str = "sub";
    pub const TOKEN_ID: &str = "jti";
    pub const TOKEN_USE: &str = "token_use";
    pub const EXPIRES_AT: &str = "exp";
    pub const REMEMBER_ME: &str = "remember_me";
    pub const ACCESS_TOKEN_ID: &str = "access_token_jti";
}
