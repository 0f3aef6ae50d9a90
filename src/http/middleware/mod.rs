//! Middleware applied to mock routes.

pub mod cors;

pub use cors::{cors_middleware, AllowedOrigins};
