use super::auth_filter::AuthRejection;
use super::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<Response, Infallible> {
    if let Some(rejection) = err.find::<AuthRejection>() {
        return Ok(rejection.to_response());
    }

    if let Some(err) = err.find::<ApiErrorCode>() {
        let json = warp::reply::json(&ApiResponse::<()>::err(err.clone(), err.to_string()));
        return Ok(warp::reply::with_status(json, StatusCode::OK).into_response());
    }

    let (code, status) = if err.is_not_found() {
        (ApiErrorCode::NotFound, StatusCode::NOT_FOUND)
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (ApiErrorCode::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED)
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some()
        || err.find::<warp::reject::PayloadTooLarge>().is_some()
        || err.find::<warp::reject::LengthRequired>().is_some()
        || err.find::<warp::reject::UnsupportedMediaType>().is_some()
    {
        (ApiErrorCode::BadRequest, StatusCode::BAD_REQUEST)
    } else {
        warn!("unhandled rejection: {:?}", err);
        (ApiErrorCode::InternalError, StatusCode::INTERNAL_SERVER_ERROR)
    };

    let json = warp::reply::json(&ApiResponse::<()> {
        success: false,
        data: None,
        error: Some(ApiError {
            message: code.to_string(),
            code,
        }),
    });
    Ok(warp::reply::with_status(json, status).into_response())
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Malformed request")]
    BadRequest,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::Expired
            | AuthError::InvalidSignature
            | AuthError::Malformed(_)
            | AuthError::TokenInvalid(_) => ApiErrorCode::InvalidToken,
            e => ApiErrorCode::internal(e),
        }
    }
}
