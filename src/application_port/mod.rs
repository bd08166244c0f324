mod auth_service;
mod authorizer;
mod token_codec;

pub use auth_service::*;
pub use authorizer::*;
pub use token_codec::*;
