//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace)
//!     → /admin/reload, or dispatch to the live mock router
//!     → middleware/cors.rs (allowed origins)
//!     → response.rs (latency, switch, mock file)
//!     → Send to client
//! ```

pub mod middleware;
pub mod response;
pub mod server;

pub use server::HttpServer;
