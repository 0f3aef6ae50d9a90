//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse CLI → Load config → Compile routes → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → trigger → server drains → Exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
