mod principal_store_mysql;

pub use principal_store_mysql::*;
