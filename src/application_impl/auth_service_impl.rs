use crate::application_port::{
    AccessToken, AuthError, AuthService, AuthTokens, CredentialHasher, DecodeMode, LoginInput,
    RefreshToken, TokenCodec, TokenDeletion,
};
use crate::domain_model::{
    AccessClaims, Principal, RefreshClaims, StorageLocation, TokenUse, claim,
};
use crate::domain_port::{PrincipalStore, RevocationStore};
use crate::logger::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration as ChronoDuration, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!("verify error: {}", e))),
        }
    }
}

/// Issuance parameters, fixed at startup.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    /// Upper bound for every revocation-store round trip.
    pub store_timeout: Duration,
    /// Revoke the consumed refresh token after a successful rotation.
    pub revoke_refresh_on_rotate: bool,
}

pub struct RealAuthService {
    principal_store: Arc<dyn PrincipalStore>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    revocation_store: Arc<dyn RevocationStore>,
    policy: TokenPolicy,
}

impl RealAuthService {
    pub fn new(
        principal_store: Arc<dyn PrincipalStore>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        revocation_store: Arc<dyn RevocationStore>,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            principal_store,
            credential_hasher,
            token_codec,
            revocation_store,
            policy,
        }
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    #[inline]
    fn new_jti() -> String {
        Uuid::new_v4().to_string()
    }

    /// Seconds until `until`, kept within `1..=cap`. The cap is the
    /// configured lifetime, which no genuine token outlives.
    fn ttl_secs(until: i64, cap: i64) -> u64 {
        let secs = until.saturating_sub(Utc::now().timestamp());
        secs.clamp(1, cap.max(1)) as u64
    }

    fn check_ttl(ttl_secs: i64) -> Result<(), AuthError> {
        if ttl_secs <= 0 {
            return Err(AuthError::InvalidTtl(ttl_secs));
        }
        Ok(())
    }

    fn claim_str(&self, token: &str, name: &str, mode: DecodeMode) -> Result<String, AuthError> {
        match self.token_codec.extract_claim(token, name, mode)? {
            serde_json::Value::String(value) => Ok(value),
            _ => Err(AuthError::Malformed(format!("'{}' claim is not a string", name))),
        }
    }

    /// Remaining lifetime of `token` by its own unverified `exp`, or
    /// `fallback` when the token cannot be read.
    fn remaining_ttl(&self, token: &str, fallback: i64) -> u64 {
        match self
            .token_codec
            .extract_claim(token, claim::EXPIRES_AT, DecodeMode::Inspect)
            .ok()
            .and_then(|exp| exp.as_i64())
        {
            Some(exp) => Self::ttl_secs(exp, fallback),
            None => fallback.max(1) as u64,
        }
    }

    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        tokio::time::timeout(self.policy.store_timeout, fut)
            .await
            .map_err(|_| {
                AuthError::StoreUnavailable(format!(
                    "{} timed out after {:?}",
                    op, self.policy.store_timeout
                ))
            })?
    }

    async fn revoke(&self, token: &str, fallback_ttl: i64) -> Result<(), AuthError> {
        let ttl = self.remaining_ttl(token, fallback_ttl);
        self.bounded("revocation put", self.revocation_store.put(token, ttl))
            .await
    }

    fn issue_pair(&self, principal: &Principal) -> Result<AuthTokens, AuthError> {
        let access_token = self.create_access_token(principal, self.policy.access_ttl_secs)?;
        let refresh_token =
            self.create_refresh_token(principal, &access_token, self.policy.refresh_ttl_secs)?;
        Ok(AuthTokens {
            access_token,
            refresh_token,
            save_to: principal.storage(),
        })
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<AuthTokens, AuthError> {
        let LoginInput {
            username,
            password,
            remember_me,
        } = request;

        let rec = self
            .principal_store
            .find_principal(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !rec.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let principal = Principal::new(rec.username, remember_me);
        let tokens = self.issue_pair(&principal)?;
        info!(username = %principal.username, remember_me, "user logged in");
        Ok(tokens)
    }

    fn create_access_token(
        &self,
        principal: &Principal,
        ttl_secs: i64,
    ) -> Result<AccessToken, AuthError> {
        Self::check_ttl(ttl_secs)?;
        let now = Utc::now();
        let claims = AccessClaims {
            iss: self.policy.issuer.clone(),
            sub: principal.username.clone(),
            aud: self.policy.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + ChronoDuration::seconds(ttl_secs)).timestamp(),
            jti: Self::new_jti(),
            token_use: TokenUse::Access,
            remember_me: principal.remember_me,
        };
        Ok(self.token_codec.issue_access(&claims)?)
    }

    fn create_refresh_token(
        &self,
        principal: &Principal,
        access_token: &AccessToken,
        ttl_secs: i64,
    ) -> Result<RefreshToken, AuthError> {
        Self::check_ttl(ttl_secs)?;
        // the access token may already be close to expiry
        let access_token_jti =
            self.claim_str(access_token.as_str(), claim::TOKEN_ID, DecodeMode::Inspect)?;
        let now = Utc::now();
        let claims = RefreshClaims {
            iss: self.policy.issuer.clone(),
            sub: principal.username.clone(),
            aud: self.policy.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + ChronoDuration::seconds(ttl_secs)).timestamp(),
            jti: Self::new_jti(),
            token_use: TokenUse::Refresh,
            access_token_jti,
        };
        Ok(self.token_codec.issue_refresh(&claims)?)
    }

    fn validate_token(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.token_codec.decode_access(token, DecodeMode::Verify)?;
        Ok(claims.sub)
    }

    fn inspect_subject(&self, token: &str) -> Result<String, AuthError> {
        self.claim_str(token, claim::SUBJECT, DecodeMode::Inspect)
    }

    fn inspect_storage(&self, access_token: &str) -> Result<StorageLocation, AuthError> {
        let remember_me = self
            .token_codec
            .extract_claim(access_token, claim::REMEMBER_ME, DecodeMode::Inspect)?
            .as_bool()
            .ok_or_else(|| AuthError::Malformed("'remember_me' claim is not a bool".into()))?;
        Ok(StorageLocation::for_remember_me(remember_me))
    }

    fn is_binding_valid(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<bool, AuthError> {
        let access_jti = self.claim_str(access_token, claim::TOKEN_ID, DecodeMode::Inspect)?;
        let bound_jti =
            self.claim_str(refresh_token, claim::ACCESS_TOKEN_ID, DecodeMode::Inspect)?;
        Ok(access_jti == bound_jti)
    }

    async fn rotate(&self, old_access: &str, old_refresh: &str) -> Result<AuthTokens, AuthError> {
        let refresh = self
            .token_codec
            .decode_refresh(old_refresh, DecodeMode::Verify)?;

        if self.is_revoked(old_refresh).await? {
            warn!(username = %refresh.sub, "rotation attempted with revoked refresh token");
            return Err(AuthError::TokenInvalid("refresh token revoked".into()));
        }

        if !self.is_binding_valid(old_access, old_refresh)? {
            warn!(username = %refresh.sub, "refresh token not bound to presented access token");
            return Err(AuthError::TokenInvalid(
                "refresh token not bound to access token".into(),
            ));
        }

        let remember_me = self
            .token_codec
            .decode_access(old_access, DecodeMode::Inspect)?
            .remember_me;
        let principal = Principal::new(refresh.sub, remember_me);
        let tokens = self.issue_pair(&principal)?;

        if self.policy.revoke_refresh_on_rotate {
            self.revoke(old_refresh, self.policy.refresh_ttl_secs).await?;
        }

        info!(username = %principal.username, "token pair rotated");
        Ok(tokens)
    }

    async fn logout(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenDeletion, AuthError> {
        let pairs = [
            (access_token, self.policy.access_ttl_secs),
            (refresh_token, self.policy.refresh_ttl_secs),
        ];
        for (token, fallback_ttl) in pairs {
            if token.is_empty() {
                continue;
            }
            self.revoke(token, fallback_ttl).await?;
        }

        // expired access tokens still carry the flag
        let delete_from = self.inspect_storage(access_token).unwrap_or_else(|e| {
            debug!(error = %e, "cannot read remember_me, assuming session storage");
            StorageLocation::Session
        });
        Ok(TokenDeletion { delete_from })
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, AuthError> {
        self.bounded("revocation lookup", self.revocation_store.exists(token))
            .await
    }
}
