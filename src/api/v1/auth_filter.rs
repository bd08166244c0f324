use super::partial_request::*;
use super::toast::*;
use crate::application_impl::AuthRoutes;
use crate::application_port::*;
use crate::domain_model::StorageLocation;
use crate::logger::*;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::header::HeaderValue;
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection, reject};

/// Identity established for a request that made it past the gate.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    refreshed: Option<AuthTokens>,
}

impl AuthContext {
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn refreshed(&self) -> Option<&AuthTokens> {
        self.refreshed.as_ref()
    }

    /// Attaches the rotated pair, if any, to the outgoing response.
    pub fn finish(&self, reply: impl Reply) -> Response {
        let mut response = reply.into_response();
        if let Some(tokens) = &self.refreshed {
            set_header(&mut response, HX_TRIGGER, &save_token_trigger(tokens));
        }
        response
    }
}

/// A request the gate answered itself.
#[derive(Debug)]
pub enum AuthRejection {
    Redirect {
        location: String,
        kind: RequestKind,
        delete_from: Option<StorageLocation>,
    },
    Reload {
        target: String,
    },
}

impl reject::Reject for AuthRejection {}

impl AuthRejection {
    pub fn to_response(&self) -> Response {
        match self {
            AuthRejection::Redirect {
                location,
                kind,
                delete_from,
            } => redirect_response(location, *kind, *delete_from),
            AuthRejection::Reload { target } => {
                let mut response = warp::reply::html(reload_shim(target)).into_response();
                set_header(&mut response, "set-cookie", &reload_cookie());
                response
            }
        }
    }
}

pub fn set_header(response: &mut Response, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response.headers_mut().insert(name, value);
        }
        Err(e) => warn!(header = name, error = %e, "dropping unencodable header value"),
    }
}

pub fn save_token_trigger(tokens: &AuthTokens) -> String {
    json!({ "saveToken": tokens }).to_string()
}

pub fn delete_token_trigger(delete_from: StorageLocation) -> String {
    json!({ "deleteToken": TokenDeletion { delete_from } }).to_string()
}

/// Partial requests follow `HX-Redirect`; navigations get a plain 302.
pub fn redirect_response(
    location: &str,
    kind: RequestKind,
    delete_from: Option<StorageLocation>,
) -> Response {
    let mut response = match kind {
        RequestKind::Partial => {
            let mut response = warp::reply().into_response();
            set_header(&mut response, HX_REDIRECT, location);
            response
        }
        RequestKind::FullPage => {
            let mut response =
                warp::reply::with_status(warp::reply(), StatusCode::FOUND).into_response();
            set_header(&mut response, "location", location);
            response
        }
    };
    if let Some(delete_from) = delete_from {
        set_header(&mut response, HX_TRIGGER, &delete_token_trigger(delete_from));
    }
    response
}

/// Turns `AuthorizationOutcome`s into request contexts or rejections.
pub struct AuthGate {
    authorizer: Arc<dyn Authorizer>,
    toasts: Arc<ToastSigner>,
    routes: AuthRoutes,
    error_page: String,
}

impl AuthGate {
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        toasts: Arc<ToastSigner>,
        routes: AuthRoutes,
        error_page: impl Into<String>,
    ) -> Self {
        AuthGate {
            authorizer,
            toasts,
            routes,
            error_page: error_page.into(),
        }
    }

    pub async fn check(&self, facts: RequestFacts) -> Result<AuthContext, AuthRejection> {
        let outcome = match self.authorizer.authorize(&facts).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, path = %facts.path, "authorization failed");
                return Err(AuthRejection::Redirect {
                    location: self.error_page.clone(),
                    kind: facts.kind,
                    delete_from: None,
                });
            }
        };

        match outcome {
            AuthorizationOutcome::Admit { principal } => Ok(AuthContext {
                principal,
                access_token: facts.access_token,
                refresh_token: facts.refresh_token,
                refreshed: None,
            }),
            AuthorizationOutcome::SilentRefresh { principal, tokens } => {
                debug!(username = %principal, path = %facts.path, "token pair refreshed in flight");
                Ok(AuthContext {
                    principal: Some(principal),
                    access_token: Some(tokens.access_token.as_str().to_string()),
                    refresh_token: Some(tokens.refresh_token.as_str().to_string()),
                    refreshed: Some(tokens),
                })
            }
            AuthorizationOutcome::RedirectToLogin {
                reason,
                delete_tokens,
            } => Err(AuthRejection::Redirect {
                location: self.toasts.redirect_url(
                    &self.routes.login,
                    reason.toast_message(),
                    ToastKind::Danger,
                ),
                kind: facts.kind,
                delete_from: delete_tokens,
            }),
            AuthorizationOutcome::AbortWithReload => {
                let target = match facts.query.as_deref() {
                    Some(query) if !query.is_empty() => format!("{}?{}", facts.path, query),
                    _ => facts.path,
                };
                Err(AuthRejection::Reload { target })
            }
            AuthorizationOutcome::RedirectHome => Err(AuthRejection::Redirect {
                location: self.routes.home.clone(),
                kind: facts.kind,
                delete_from: None,
            }),
        }
    }
}

fn raw_query() -> impl Filter<Extract = (Option<String>,), Error = Infallible> + Clone {
    warp::query::raw()
        .map(|query: String| Some(query))
        .or(warp::any().map(|| None))
        .unify()
}

pub fn with_authorization(
    gate: Arc<AuthGate>,
) -> impl Filter<Extract = (AuthContext,), Error = Rejection> + Clone {
    warp::method()
        .and(warp::path::full())
        .and(raw_query())
        .and(request_kind())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::header::optional::<String>(REFRESH_HEADER))
        .and(warp::cookie::optional::<String>(RELOAD_COOKIE))
        .and_then(
            move |method: Method,
                  path: FullPath,
                  query: Option<String>,
                  kind: RequestKind,
                  authorization: Option<String>,
                  refresh: Option<String>,
                  reload_cookie: Option<String>| {
                let gate = gate.clone();
                async move {
                    let facts = RequestFacts {
                        method: method.as_str().to_string(),
                        path: path.as_str().to_string(),
                        query,
                        kind,
                        access_token: bearer_token(authorization.as_deref()),
                        refresh_token: bearer_token(refresh.as_deref()),
                        reload_attempted: reload_cookie.is_some(),
                    };
                    gate.check(facts).await.map_err(reject::custom)
                }
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::http::header::{LOCATION, SET_COOKIE};

    #[test]
    fn partial_redirect_uses_hx_header() {
        let response = redirect_response(
            "/v1/auth/login?toast-message=x",
            RequestKind::Partial,
            Some(StorageLocation::Local),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[HX_REDIRECT],
            "/v1/auth/login?toast-message=x"
        );
        assert_eq!(
            response.headers()[HX_TRIGGER],
            r#"{"deleteToken":{"deleteFrom":"local"}}"#
        );
    }

    #[test]
    fn full_page_redirect_is_a_302() {
        let response = redirect_response("/", RequestKind::FullPage, None);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/");
        assert!(response.headers().get(HX_TRIGGER).is_none());
    }

    #[test]
    fn reload_sets_loop_guard_cookie() {
        let response = AuthRejection::Reload {
            target: "/private".into(),
        }
        .to_response();
        assert_eq!(
            response.headers()[SET_COOKIE],
            "alreadyResend=true; Max-Age=60; Path=/; HttpOnly"
        );
    }

    #[test]
    fn save_trigger_names_storage() {
        let tokens = AuthTokens {
            access_token: AccessToken("a".into()),
            refresh_token: RefreshToken("r".into()),
            save_to: StorageLocation::Session,
        };
        assert_eq!(
            save_token_trigger(&tokens),
            r#"{"saveToken":{"accessToken":"a","refreshToken":"r","saveTo":"session"}}"#
        );
    }
}
