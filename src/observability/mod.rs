//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → structured `tracing` events (config load, route compilation, serving)
//!     → tower-http TraceLayer spans per request, tagged with x-request-id
//!
//! Consumers:
//!     → logging.rs (fmt subscriber on stdout, filter adjustable at runtime)
//! ```

pub mod logging;

pub use logging::LogHandle;
