use crate::application_port::{AuthError, AuthTokens};
use crate::domain_model::StorageLocation;

/// Where a request came from, which decides how a refusal is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Browser navigation; cannot carry the stored bearer tokens.
    FullPage,
    /// In-page asynchronous update issued by the partial-update client.
    Partial,
}

/// Everything the gate needs to know about one inbound request.
#[derive(Debug, Clone)]
pub struct RequestFacts {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub kind: RequestKind,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Set when the client already went through one reload round-trip.
    pub reload_attempted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    LoginRequired,
    TokenInvalid,
    SessionExpired,
}

impl RedirectReason {
    /// Slug shown to the user as a toast on the login page.
    pub fn toast_message(&self) -> &'static str {
        match self {
            RedirectReason::LoginRequired => {
                "login-is-required-for-this-action.-sign-in-or-create-an-account-to-continue."
            }
            RedirectReason::TokenInvalid => "your-token-is-invalid.-please-log-in-to-continue.",
            RedirectReason::SessionExpired => {
                "your-session-has-expired.-please-log-in-to-continue."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// Let the request through; `None` is an anonymous caller on a public route.
    Admit { principal: Option<String> },
    /// The access token had expired and was rotated; the new pair must reach
    /// the client with the response.
    SilentRefresh {
        principal: String,
        tokens: AuthTokens,
    },
    RedirectToLogin {
        reason: RedirectReason,
        delete_tokens: Option<StorageLocation>,
    },
    /// Replay the request through the partial-update client so it can attach
    /// the stored credentials.
    AbortWithReload,
    /// A signed-in user asked for the login or registration form.
    RedirectHome,
}

impl AuthorizationOutcome {
    pub fn anonymous() -> Self {
        AuthorizationOutcome::Admit { principal: None }
    }

    pub fn principal(&self) -> Option<&str> {
        match self {
            AuthorizationOutcome::Admit { principal } => principal.as_deref(),
            AuthorizationOutcome::SilentRefresh { principal, .. } => Some(principal),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
pub trait Authorizer: Send + Sync {
    /// Only route-catalog failures are returned as errors; every token or
    /// store problem is folded into an outcome.
    async fn authorize(&self, request: &RequestFacts) -> Result<AuthorizationOutcome, AuthError>;
}
