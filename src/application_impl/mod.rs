mod auth_service_impl;
mod authorizer;
mod key_material;
mod token_codec_jwt;

pub use auth_service_impl::*;
pub use authorizer::*;
pub use key_material::*;
pub use token_codec_jwt::*;
