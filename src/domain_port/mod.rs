// store

mod revocation_store;

pub use revocation_store::*;

// repo

mod principal_store;

pub use principal_store::*;

// metadata

mod route_catalog;

pub use route_catalog::*;
