mod claims;
mod principal;

pub use claims::*;
pub use principal::*;
