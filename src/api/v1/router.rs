use super::auth_filter::*;
use super::handler;
use super::toast::ToastQuery;
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

pub const ERROR_PAGE: &str = "/500.html";
const FORM_LIMIT: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let gate = Arc::new(AuthGate::new(
        server.authorizer.clone(),
        server.toast_signer.clone(),
        server.routes.clone(),
        ERROR_PAGE,
    ));
    let auth_routes = Arc::new(server.routes.clone());

    // the gate runs after path matching so only the matched route pays for it
    let home = warp::get()
        .and(warp::path::end())
        .and(with_authorization(gate.clone()))
        .and(warp::query::<ToastQuery>())
        .and(with(server.toast_signer.clone()))
        .and_then(handler::home);

    let private = warp::get()
        .and(warp::path("private"))
        .and(warp::path::end())
        .and(with_authorization(gate.clone()))
        .and_then(handler::private);

    let login_page = warp::get()
        .and(warp::path!("v1" / "auth" / "login"))
        .and(with_authorization(gate.clone()))
        .and(warp::query::<ToastQuery>())
        .and(with(server.toast_signer.clone()))
        .and_then(handler::login_page);

    let register_page = warp::get()
        .and(warp::path!("v1" / "auth" / "register"))
        .and(with_authorization(gate.clone()))
        .and(warp::query::<ToastQuery>())
        .and(with(server.toast_signer.clone()))
        .and_then(handler::register_page);

    let login = warp::post()
        .and(warp::path!("v1" / "auth" / "login"))
        .and(with_authorization(gate.clone()))
        .and(warp::body::content_length_limit(FORM_LIMIT))
        .and(warp::body::form())
        .and(with(server.auth_service.clone()))
        .and(with(server.toast_signer.clone()))
        .and(with(auth_routes.clone()))
        .and_then(handler::login);

    let logout = warp::get()
        .and(warp::path!("v1" / "auth" / "logout"))
        .and(with_authorization(gate.clone()))
        .and(with(server.auth_service.clone()))
        .and(with(server.toast_signer.clone()))
        .and(with(auth_routes.clone()))
        .and_then(handler::logout);

    let error_page = warp::get()
        .and(warp::path("500.html"))
        .and(warp::path::end())
        .and_then(handler::error_page);

    home.or(private)
        .or(login_page)
        .or(register_page)
        .or(login)
        .or(logout)
        .or(error_page)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}
