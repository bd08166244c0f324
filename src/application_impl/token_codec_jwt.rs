use crate::application_impl::SigningKeys;
use crate::application_port::{AccessToken, DecodeMode, RefreshToken, TokenCodec, TokenError};
use crate::domain_model::{AccessClaims, RefreshClaims, TokenUse, claim};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
}

type RawClaims = Map<String, Value>;

fn verifying_validation(cfg: &JwtConfig) -> Validation {
    let mut v = Validation::new(Algorithm::RS256);
    v.leeway = 0;
    v.validate_exp = true;
    v.validate_nbf = true;
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    v
}

fn inspecting_validation() -> Validation {
    let mut v = Validation::new(Algorithm::RS256);
    v.insecure_disable_signature_validation();
    v.validate_exp = false;
    v.validate_nbf = false;
    v.validate_aud = false;
    v.required_spec_claims.clear();
    v
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::MissingRequiredClaim(name) => TokenError::MissingClaim(name.clone()),
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => TokenError::Malformed(e.to_string()),
        // wrong key, algorithm, issuer, audience, or not yet valid
        _ => TokenError::InvalidSignature,
    }
}

fn claims_from_raw<T: DeserializeOwned>(
    raw: RawClaims,
    required: &[&str],
    expected: TokenUse,
) -> Result<T, TokenError> {
    if let Some(missing) = required.iter().find(|name| !raw.contains_key(**name)) {
        return Err(TokenError::MissingClaim(missing.to_string()));
    }
    let token_use = raw
        .get(claim::TOKEN_USE)
        .cloned()
        .and_then(|value| serde_json::from_value::<TokenUse>(value).ok());
    if token_use != Some(expected) {
        return Err(TokenError::WrongUse(expected));
    }
    serde_json::from_value(Value::Object(raw)).map_err(|e| TokenError::Malformed(e.to_string()))
}

/// RS256 codec over the process-wide `SigningKeys`.
pub struct JwtRs256Codec {
    cfg: JwtConfig,
    keys: Arc<SigningKeys>,
    verifying: Validation,
    inspecting: Validation,
}

impl JwtRs256Codec {
    pub fn new(cfg: JwtConfig, keys: Arc<SigningKeys>) -> Self {
        let verifying = verifying_validation(&cfg);
        JwtRs256Codec {
            cfg,
            keys,
            verifying,
            inspecting: inspecting_validation(),
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.cfg
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::RS256), claims, self.keys.encoding())
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn decode_raw(&self, token: &str, mode: DecodeMode) -> Result<RawClaims, TokenError> {
        let validation = match mode {
            DecodeMode::Verify => &self.verifying,
            DecodeMode::Inspect => &self.inspecting,
        };
        let data = decode::<RawClaims>(token, self.keys.decoding(), validation)
            .map_err(map_jwt_error)?;
        Ok(data.claims)
    }
}

impl TokenCodec for JwtRs256Codec {
    fn issue_access(&self, claims: &AccessClaims) -> Result<AccessToken, TokenError> {
        self.sign(claims).map(AccessToken)
    }

    fn issue_refresh(&self, claims: &RefreshClaims) -> Result<RefreshToken, TokenError> {
        self.sign(claims).map(RefreshToken)
    }

    fn decode_access(&self, token: &str, mode: DecodeMode) -> Result<AccessClaims, TokenError> {
        let raw = self.decode_raw(token, mode)?;
        claims_from_raw(raw, AccessClaims::REQUIRED, TokenUse::Access)
    }

    fn decode_refresh(&self, token: &str, mode: DecodeMode) -> Result<RefreshClaims, TokenError> {
        let raw = self.decode_raw(token, mode)?;
        claims_from_raw(raw, RefreshClaims::REQUIRED, TokenUse::Refresh)
    }

    fn extract_claim(
        &self,
        token: &str,
        name: &str,
        mode: DecodeMode,
    ) -> Result<Value, TokenError> {
        let mut raw = self.decode_raw(token, mode)?;
        raw.remove(name)
            .ok_or_else(|| TokenError::MissingClaim(name.to_string()))
    }
}
