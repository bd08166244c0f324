//! In-process stores backing the `fake` auth backend and the test suites.
//! Revocations kept here are visible to this process only.

mod principal_store_memory;
mod revocation_store_memory;

pub use principal_store_memory::*;
pub use revocation_store_memory::*;
