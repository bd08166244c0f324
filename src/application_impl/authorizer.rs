use crate::application_port::{
    AuthError, AuthService, AuthorizationOutcome, Authorizer, RedirectReason, RequestFacts,
    RequestKind,
};
use crate::domain_model::StorageLocation;
use crate::domain_port::RouteCatalog;
use crate::logger::*;
use std::sync::Arc;

/// Paths the gate treats specially.
#[derive(Debug, Clone)]
pub struct AuthRoutes {
    pub home: String,
    pub login: String,
    pub register: String,
    pub logout: String,
}

pub struct RealAuthorizer {
    auth_service: Arc<dyn AuthService>,
    route_catalog: Arc<dyn RouteCatalog>,
    routes: AuthRoutes,
}

impl RealAuthorizer {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        route_catalog: Arc<dyn RouteCatalog>,
        routes: AuthRoutes,
    ) -> Self {
        RealAuthorizer {
            auth_service,
            route_catalog,
            routes,
        }
    }

    pub fn routes(&self) -> &AuthRoutes {
        &self.routes
    }

    fn is_auth_form(&self, path: &str) -> bool {
        path == self.routes.login || path == self.routes.register
    }

    fn redirect(&self, reason: RedirectReason, access_token: Option<&str>) -> AuthorizationOutcome {
        let delete_tokens = access_token.map(|token| {
            self.auth_service
                .inspect_storage(token)
                .unwrap_or(StorageLocation::Session)
        });
        AuthorizationOutcome::RedirectToLogin {
            reason,
            delete_tokens,
        }
    }

    /// A browser navigation cannot attach the stored bearer tokens, so a
    /// documented page is replayed once through the partial client.
    fn needs_reload(&self, request: &RequestFacts) -> Result<bool, AuthError> {
        if request.kind != RequestKind::FullPage
            || request.method != "GET"
            || request.access_token.is_some()
            || request.reload_attempted
        {
            return Ok(false);
        }
        self.route_catalog
            .requires_authentication(&request.path, &request.method)
            .map_err(|e| AuthError::RouteCatalog(e.to_string()))
    }

    async fn gate_auth_form(&self, request: &RequestFacts) -> AuthorizationOutcome {
        let Some(access) = request.access_token.as_deref() else {
            return AuthorizationOutcome::anonymous();
        };
        let Ok(username) = self.auth_service.validate_token(access) else {
            return AuthorizationOutcome::anonymous();
        };
        match self.auth_service.is_revoked(access).await {
            Ok(true) => AuthorizationOutcome::anonymous(),
            Ok(false) => {
                debug!(%username, path = %request.path, "signed-in user sent home");
                AuthorizationOutcome::RedirectHome
            }
            Err(e) => {
                warn!(error = %e, "revocation lookup failed on login page, assuming not revoked");
                AuthorizationOutcome::RedirectHome
            }
        }
    }

    /// Protected routes: every doubt ends at the login page.
    async fn enforce(&self, request: &RequestFacts) -> AuthorizationOutcome {
        let Some(access) = request.access_token.as_deref() else {
            return self.redirect(RedirectReason::LoginRequired, None);
        };

        match self.auth_service.is_revoked(access).await {
            Ok(false) => {}
            Ok(true) => {
                info!(path = %request.path, "revoked access token presented");
                return self.redirect(RedirectReason::TokenInvalid, Some(access));
            }
            Err(e) => {
                error!(error = %e, "revocation lookup failed on protected route");
                return self.redirect(RedirectReason::SessionExpired, Some(access));
            }
        }

        match self.auth_service.validate_token(access) {
            Ok(username) => AuthorizationOutcome::Admit {
                principal: Some(username),
            },
            Err(AuthError::Expired) if request.path == self.routes.logout => {
                AuthorizationOutcome::Admit {
                    principal: self.auth_service.inspect_subject(access).ok(),
                }
            }
            Err(AuthError::Expired) => self.refresh_or_redirect(request, access).await,
            Err(e) => {
                debug!(error = %e, path = %request.path, "access token rejected");
                self.redirect(RedirectReason::SessionExpired, Some(access))
            }
        }
    }

    async fn refresh_or_redirect(
        &self,
        request: &RequestFacts,
        access: &str,
    ) -> AuthorizationOutcome {
        let Some(refresh) = request.refresh_token.as_deref() else {
            return self.redirect(RedirectReason::SessionExpired, Some(access));
        };

        match self.auth_service.is_revoked(refresh).await {
            Ok(false) => {}
            Ok(true) => {
                info!(path = %request.path, "revoked refresh token presented");
                return self.redirect(RedirectReason::TokenInvalid, Some(access));
            }
            Err(e) => {
                error!(error = %e, "revocation lookup failed during refresh");
                return self.redirect(RedirectReason::SessionExpired, Some(access));
            }
        }

        match self.rotate(access, refresh).await {
            Ok(outcome) => outcome,
            Err(e) => {
                info!(error = %e, path = %request.path, "silent refresh failed");
                self.redirect(RedirectReason::SessionExpired, Some(access))
            }
        }
    }

    async fn rotate(&self, access: &str, refresh: &str) -> Result<AuthorizationOutcome, AuthError> {
        let tokens = self.auth_service.rotate(access, refresh).await?;
        let principal = self
            .auth_service
            .validate_token(tokens.access_token.as_str())?;
        Ok(AuthorizationOutcome::SilentRefresh { principal, tokens })
    }

    /// Public routes: identify the caller if possible, never refuse.
    async fn identify(&self, request: &RequestFacts) -> AuthorizationOutcome {
        let Some(access) = request.access_token.as_deref() else {
            return AuthorizationOutcome::anonymous();
        };

        match self.auth_service.is_revoked(access).await {
            Ok(false) => {}
            Ok(true) => return AuthorizationOutcome::anonymous(),
            Err(e) => warn!(error = %e, "revocation lookup failed on public route"),
        }

        match self.auth_service.validate_token(access) {
            Ok(username) => AuthorizationOutcome::Admit {
                principal: Some(username),
            },
            Err(AuthError::Expired) => {
                let Some(refresh) = request.refresh_token.as_deref() else {
                    return AuthorizationOutcome::anonymous();
                };
                // rotation re-checks revocation and fails closed on its own
                self.rotate(access, refresh).await.unwrap_or_else(|e| {
                    debug!(error = %e, "best-effort refresh on public route failed");
                    AuthorizationOutcome::anonymous()
                })
            }
            Err(_) => AuthorizationOutcome::anonymous(),
        }
    }
}

#[async_trait::async_trait]
impl Authorizer for RealAuthorizer {
    async fn authorize(&self, request: &RequestFacts) -> Result<AuthorizationOutcome, AuthError> {
        if self.needs_reload(request)? {
            return Ok(AuthorizationOutcome::AbortWithReload);
        }

        if self.is_auth_form(&request.path) {
            return Ok(self.gate_auth_form(request).await);
        }

        let protected = self
            .route_catalog
            .is_protected(&request.path, &request.method)
            .map_err(|e| AuthError::RouteCatalog(e.to_string()))?;

        let outcome = if protected {
            self.enforce(request).await
        } else {
            self.identify(request).await
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{
        Argon2PasswordHasher, JwtConfig, JwtRs256Codec, RealAuthService, SigningKeys, TokenPolicy,
    };
    use crate::application_port::{AuthTokens, DecodeMode, TokenCodec};
    use crate::domain_model::Principal;
    use crate::domain_port::RevocationStore;
    use crate::infra_memory::{MemoryPrincipalStore, MemoryRevocationStore};
    use crate::infra_openapi::OpenApiRouteCatalog;
    use std::time::Duration;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/jwt_test_key.pem");
    const API_DOCUMENT: &str = r#"{
        "swagger": "2.0",
        "paths": {
            "/": { "get": { "summary": "home" } },
            "/private": { "get": { "security": [{ "JWT": [] }] } },
            "/v1/auth/login": { "get": {}, "post": {} },
            "/v1/auth/register": { "get": {} },
            "/v1/auth/logout": { "get": { "security": [{ "JWT": [] }] } }
        }
    }"#;

    struct Fixture {
        authorizer: RealAuthorizer,
        service: Arc<RealAuthService>,
        codec: Arc<JwtRs256Codec>,
        revocations: Arc<MemoryRevocationStore>,
    }

    fn fixture_with_store(store: Option<Arc<dyn RevocationStore>>) -> Fixture {
        let keys = Arc::new(SigningKeys::from_pem(TEST_KEY).unwrap());
        let codec = Arc::new(JwtRs256Codec::new(
            JwtConfig {
                issuer: "AuthConnect Hub".into(),
                audience: "users".into(),
            },
            keys,
        ));
        let revocations = Arc::new(MemoryRevocationStore::new());
        let store = store.unwrap_or_else(|| revocations.clone() as Arc<dyn RevocationStore>);
        let service = Arc::new(RealAuthService::new(
            Arc::new(MemoryPrincipalStore::new()),
            Arc::new(Argon2PasswordHasher),
            codec.clone(),
            store,
            TokenPolicy {
                issuer: "AuthConnect Hub".into(),
                audience: "users".into(),
                access_ttl_secs: 60,
                refresh_ttl_secs: 3600,
                store_timeout: Duration::from_millis(200),
                revoke_refresh_on_rotate: false,
            },
        ));
        let catalog = Arc::new(OpenApiRouteCatalog::from_json(API_DOCUMENT).unwrap());
        let authorizer = RealAuthorizer::new(
            service.clone(),
            catalog,
            AuthRoutes {
                home: "/".into(),
                login: "/v1/auth/login".into(),
                register: "/v1/auth/register".into(),
                logout: "/v1/auth/logout".into(),
            },
        );
        Fixture {
            authorizer,
            service,
            codec,
            revocations,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_store(None)
    }

    fn request(path: &str, tokens: Option<(&str, &str)>) -> RequestFacts {
        RequestFacts {
            method: "GET".into(),
            path: path.into(),
            query: None,
            kind: RequestKind::Partial,
            access_token: tokens.map(|(a, _)| a.to_string()),
            refresh_token: tokens.map(|(_, r)| r.to_string()),
            reload_attempted: false,
        }
    }

    fn issue(f: &Fixture, remember_me: bool) -> AuthTokens {
        let principal = Principal::new("alice", remember_me);
        let access = f.service.create_access_token(&principal, 60).unwrap();
        let refresh = f
            .service
            .create_refresh_token(&principal, &access, 3600)
            .unwrap();
        AuthTokens {
            access_token: access,
            refresh_token: refresh,
            save_to: principal.storage(),
        }
    }

    /// Same pair, but with the access token already past `exp`.
    fn issue_expired(f: &Fixture, remember_me: bool) -> AuthTokens {
        let mut tokens = issue(f, remember_me);
        let mut claims = f
            .codec
            .decode_access(tokens.access_token.as_str(), DecodeMode::Inspect)
            .unwrap();
        claims.exp -= 120;
        claims.nbf -= 120;
        tokens.access_token = f.codec.issue_access(&claims).unwrap();
        tokens
    }

    fn pair(tokens: &AuthTokens) -> Option<(&str, &str)> {
        Some((tokens.access_token.as_str(), tokens.refresh_token.as_str()))
    }

    #[tokio::test]
    async fn protected_route_without_token_requires_login() {
        let f = fixture();
        let outcome = f.authorizer.authorize(&request("/private", None)).await.unwrap();
        assert_eq!(
            outcome,
            AuthorizationOutcome::RedirectToLogin {
                reason: RedirectReason::LoginRequired,
                delete_tokens: None
            }
        );
    }

    #[tokio::test]
    async fn valid_token_is_admitted() {
        let f = fixture();
        let tokens = issue(&f, false);
        let outcome = f
            .authorizer
            .authorize(&request("/private", pair(&tokens)))
            .await
            .unwrap();
        assert_eq!(outcome.principal(), Some("alice"));
    }

    #[tokio::test]
    async fn refresh_token_cannot_stand_in_for_access_token() {
        let f = fixture();
        let tokens = issue(&f, true);
        let refresh = tokens.refresh_token.as_str();

        let outcome = f
            .authorizer
            .authorize(&request("/private", Some((refresh, refresh))))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AuthorizationOutcome::RedirectToLogin {
                reason: RedirectReason::SessionExpired,
                delete_tokens: Some(StorageLocation::Session)
            }
        );

        let public = f
            .authorizer
            .authorize(&request("/", Some((refresh, refresh))))
            .await
            .unwrap();
        assert_eq!(public, AuthorizationOutcome::anonymous());
    }

    #[tokio::test]
    async fn revoked_token_is_refused_after_logout() {
        let f = fixture();
        let tokens = issue(&f, true);
        f.service
            .logout(tokens.access_token.as_str(), tokens.refresh_token.as_str())
            .await
            .unwrap();

        let outcome = f
            .authorizer
            .authorize(&request("/private", pair(&tokens)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AuthorizationOutcome::RedirectToLogin {
                reason: RedirectReason::TokenInvalid,
                delete_tokens: Some(StorageLocation::Local)
            }
        );
    }

    #[tokio::test]
    async fn expired_access_token_is_silently_refreshed() {
        let f = fixture();
        let tokens = issue_expired(&f, false);

        let outcome = f
            .authorizer
            .authorize(&request("/private", pair(&tokens)))
            .await
            .unwrap();
        let AuthorizationOutcome::SilentRefresh {
            principal,
            tokens: fresh,
        } = outcome
        else {
            panic!("expected silent refresh, got {outcome:?}");
        };
        assert_eq!(principal, "alice");
        assert_eq!(fresh.save_to, StorageLocation::Session);
        assert!(
            f.service
                .is_binding_valid(fresh.access_token.as_str(), fresh.refresh_token.as_str())
                .unwrap()
        );
    }

    #[tokio::test]
    async fn revoked_refresh_token_blocks_refresh() {
        let f = fixture();
        let tokens = issue_expired(&f, false);
        f.revocations
            .put(tokens.refresh_token.as_str(), 60)
            .await
            .unwrap();

        let outcome = f
            .authorizer
            .authorize(&request("/private", pair(&tokens)))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            AuthorizationOutcome::RedirectToLogin {
                reason: RedirectReason::TokenInvalid,
                delete_tokens: Some(StorageLocation::Session)
            }
        ));
    }

    #[tokio::test]
    async fn unbound_refresh_token_ends_session() {
        let f = fixture();
        let expired = issue_expired(&f, false);
        let other = issue(&f, false);

        let outcome = f
            .authorizer
            .authorize(&request(
                "/private",
                Some((expired.access_token.as_str(), other.refresh_token.as_str())),
            ))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            AuthorizationOutcome::RedirectToLogin {
                reason: RedirectReason::SessionExpired,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn forged_token_reads_as_expired_session() {
        let f = fixture();
        let outcome = f
            .authorizer
            .authorize(&request("/private", Some(("a.b.c", "x"))))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AuthorizationOutcome::RedirectToLogin {
                reason: RedirectReason::SessionExpired,
                delete_tokens: Some(StorageLocation::Session)
            }
        );
    }

    #[tokio::test]
    async fn logout_admits_expired_access_with_revoked_refresh() {
        let f = fixture();
        let tokens = issue_expired(&f, false);
        f.revocations
            .put(tokens.refresh_token.as_str(), 60)
            .await
            .unwrap();

        let outcome = f
            .authorizer
            .authorize(&request("/v1/auth/logout", pair(&tokens)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AuthorizationOutcome::Admit {
                principal: Some("alice".into())
            }
        );
    }

    #[tokio::test]
    async fn public_route_identifies_best_effort() {
        let f = fixture();
        let tokens = issue(&f, false);

        let anonymous = f.authorizer.authorize(&request("/", None)).await.unwrap();
        assert_eq!(anonymous, AuthorizationOutcome::anonymous());

        let known = f.authorizer.authorize(&request("/", pair(&tokens))).await.unwrap();
        assert_eq!(known.principal(), Some("alice"));

        let garbage = f
            .authorizer
            .authorize(&request("/", Some(("garbage", "garbage"))))
            .await
            .unwrap();
        assert_eq!(garbage, AuthorizationOutcome::anonymous());
    }

    #[tokio::test]
    async fn public_route_refreshes_expired_pair() {
        let f = fixture();
        let tokens = issue_expired(&f, true);

        let outcome = f.authorizer.authorize(&request("/", pair(&tokens))).await.unwrap();
        assert!(matches!(outcome, AuthorizationOutcome::SilentRefresh { .. }));
    }

    #[tokio::test]
    async fn signed_in_user_is_sent_home_from_login() {
        let f = fixture();
        let tokens = issue(&f, false);

        let outcome = f
            .authorizer
            .authorize(&request("/v1/auth/login", pair(&tokens)))
            .await
            .unwrap();
        assert_eq!(outcome, AuthorizationOutcome::RedirectHome);

        let anonymous = f
            .authorizer
            .authorize(&request("/v1/auth/login", None))
            .await
            .unwrap();
        assert_eq!(anonymous, AuthorizationOutcome::anonymous());
    }

    #[tokio::test]
    async fn full_page_navigation_is_replayed_once() {
        let f = fixture();
        let mut facts = request("/private", None);
        facts.kind = RequestKind::FullPage;

        let outcome = f.authorizer.authorize(&facts).await.unwrap();
        assert_eq!(outcome, AuthorizationOutcome::AbortWithReload);

        facts.reload_attempted = true;
        let outcome = f.authorizer.authorize(&facts).await.unwrap();
        assert!(matches!(
            outcome,
            AuthorizationOutcome::RedirectToLogin {
                reason: RedirectReason::LoginRequired,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn undocumented_route_passes_through() {
        let f = fixture();
        let mut facts = request("/nowhere", None);
        facts.kind = RequestKind::FullPage;
        assert_eq!(
            f.authorizer.authorize(&facts).await.unwrap(),
            AuthorizationOutcome::anonymous()
        );
    }

    #[tokio::test]
    async fn unsupported_method_is_a_catalog_error() {
        let f = fixture();
        let mut facts = request("/private", None);
        facts.method = "TRACE".into();
        assert!(matches!(
            f.authorizer.authorize(&facts).await,
            Err(AuthError::RouteCatalog(_))
        ));
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl RevocationStore for BrokenStore {
        async fn put(&self, _key: &str, _ttl_secs: u64) -> Result<(), AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".into()))
        }

        async fn exists(&self, _key: &str) -> Result<bool, AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn store_outage_fails_closed_only_where_protected() {
        let f = fixture_with_store(Some(Arc::new(BrokenStore)));
        let tokens = issue(&f, false);

        let protected = f
            .authorizer
            .authorize(&request("/private", pair(&tokens)))
            .await
            .unwrap();
        assert!(matches!(
            protected,
            AuthorizationOutcome::RedirectToLogin {
                reason: RedirectReason::SessionExpired,
                ..
            }
        ));

        let public = f.authorizer.authorize(&request("/", pair(&tokens))).await.unwrap();
        assert_eq!(public.principal(), Some("alice"));
    }
}
