use super::auth_filter::*;
use super::error::*;
use super::partial_request::{HX_REDIRECT, HX_TRIGGER};
use super::toast::*;
use crate::application_impl::AuthRoutes;
use crate::application_port::{AuthService, LoginInput};
use crate::domain_model::StorageLocation;
use crate::logger::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::{self, reject};

const LOGIN_SUCCESS: &str = "login-successfully";
const LOGOUT_SUCCESS: &str = "logout-successfully";

const ERROR_PAGE_HTML: &str = "<!DOCTYPE html>\n<html><head><title>500</title></head>\
<body><h1>Internal Server Error</h1><p>Something went wrong. Please try again later.</p>\
</body></html>";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub username: Option<String>,
    pub toast: Option<Toast>,
}

pub async fn home(
    ctx: AuthContext,
    query: ToastQuery,
    toasts: Arc<ToastSigner>,
) -> Result<Response, warp::Rejection> {
    let page = HomePage {
        username: ctx.principal.clone(),
        toast: toasts.verified(&query),
    };
    Ok(ctx.finish(warp::reply::json(&ApiResponse::ok(page))))
}

#[derive(Debug, Serialize)]
pub struct PrivatePage {
    pub username: String,
    pub greeting: String,
}

pub async fn private(ctx: AuthContext) -> Result<Response, warp::Rejection> {
    let Some(username) = ctx.principal() else {
        return Err(reject::custom(ApiErrorCode::InvalidToken));
    };
    let page = PrivatePage {
        username: username.to_string(),
        greeting: format!("Hello, {}!", username),
    };
    Ok(ctx.finish(warp::reply::json(&ApiResponse::ok(page))))
}

/// Data for the sign-in and registration forms. Signed-in users never get
/// here, the gate sends them home.
#[derive(Debug, Serialize)]
pub struct AuthFormPage {
    pub form: &'static str,
    pub toast: Option<Toast>,
}

fn auth_form_page(
    form: &'static str,
    ctx: AuthContext,
    query: ToastQuery,
    toasts: Arc<ToastSigner>,
) -> Response {
    let page = AuthFormPage {
        form,
        toast: toasts.verified(&query),
    };
    ctx.finish(warp::reply::json(&ApiResponse::ok(page)))
}

pub async fn login_page(
    ctx: AuthContext,
    query: ToastQuery,
    toasts: Arc<ToastSigner>,
) -> Result<Response, warp::Rejection> {
    Ok(auth_form_page("login", ctx, query, toasts))
}

pub async fn register_page(
    ctx: AuthContext,
    query: ToastQuery,
    toasts: Arc<ToastSigner>,
) -> Result<Response, warp::Rejection> {
    Ok(auth_form_page("register", ctx, query, toasts))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Checkbox value, `on` when ticked.
    pub remember_me: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub save_to: StorageLocation,
}

pub async fn login(
    _ctx: AuthContext,
    form: LoginForm,
    auth_service: Arc<dyn AuthService>,
    toasts: Arc<ToastSigner>,
    routes: Arc<AuthRoutes>,
) -> Result<Response, warp::Rejection> {
    let login_input = LoginInput {
        username: form.username.clone(),
        password: form.password,
        remember_me: form.remember_me.as_deref() == Some("on"),
    };
    let tokens = auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let body = ApiResponse::ok(LoginResponse {
        username: form.username,
        save_to: tokens.save_to,
    });
    let mut response = warp::reply::json(&body).into_response();
    set_header(&mut response, HX_TRIGGER, &save_token_trigger(&tokens));
    set_header(
        &mut response,
        HX_REDIRECT,
        &toasts.redirect_url(&routes.home, LOGIN_SUCCESS, ToastKind::Success),
    );
    Ok(response)
}

pub async fn logout(
    ctx: AuthContext,
    auth_service: Arc<dyn AuthService>,
    toasts: Arc<ToastSigner>,
    routes: Arc<AuthRoutes>,
) -> Result<Response, warp::Rejection> {
    let deletion = auth_service
        .logout(
            ctx.access_token.as_deref().unwrap_or_default(),
            ctx.refresh_token.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    info!(username = ?ctx.principal(), "user logged out");

    let mut response = warp::reply::json(&ApiResponse::ok(deletion)).into_response();
    set_header(
        &mut response,
        HX_TRIGGER,
        &delete_token_trigger(deletion.delete_from),
    );
    set_header(
        &mut response,
        HX_REDIRECT,
        &toasts.redirect_url(&routes.home, LOGOUT_SUCCESS, ToastKind::Success),
    );
    Ok(response)
}

pub async fn error_page() -> Result<impl Reply, warp::Rejection> {
    Ok(warp::reply::with_status(
        warp::reply::html(ERROR_PAGE_HTML),
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
}
