mod route_catalog_openapi;

pub use route_catalog_openapi::*;
