//! Authentication and cookie management.
//!
//! This module holds the single authentication cookie of a run and derives
//! per-request `Cookie` header values from it.

mod cookies;

pub use cookies::AuthContext;
