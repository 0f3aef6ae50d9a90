//! Configuration-driven mock HTTP server.
//!
//! A JSON service map (URL path → response file, per verb) is compiled into
//! routes that serve canned responses, optionally picking the response file
//! from a request field.

pub mod config;
pub mod files;
pub mod http;
pub mod lifecycle;
pub mod mocker;
pub mod observability;
pub mod routing;

pub use config::{Options, OptionsOverrides, ServiceMap};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use mocker::MockServer;
