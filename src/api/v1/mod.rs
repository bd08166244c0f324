mod auth_filter;
mod error;
mod handler;
mod partial_request;
mod router;
mod toast;

pub use auth_filter::{AuthContext, AuthGate, AuthRejection, with_authorization};
pub use error::{ApiErrorCode, recover_error};
pub use handler::ApiResponse;
pub use partial_request::{RELOAD_COOKIE, bearer_token, reload_shim};
pub use router::{ERROR_PAGE, routes};
pub use toast::{Toast, ToastKind, ToastQuery, ToastSigner};
