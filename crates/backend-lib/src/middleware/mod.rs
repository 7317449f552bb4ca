// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the `passgate` HTTP API.

pub mod auth;

pub use auth::{require_bearer, AuthUser};
