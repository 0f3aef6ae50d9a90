//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (Options::default)
//!     → constructor overrides (shallow merge)
//!     → config file (JSON)
//!         → loader.rs (read & parse)
//!         → legacy.rs (upconvert verb-keyed webServices)
//!         → shallow merge onto Options
//!     → Options (owned by one MockServer)
//!
//! On reload:
//!     /admin/reload or watcher.rs detects change
//!     → loader.rs loads the file again
//!     → merge, recompile routes
//!     → atomic swap of the live route table
//! ```
//!
//! # Design Decisions
//! - Merges are shallow: a key present in a later source replaces the value
//! - A failed load leaves the current options untouched
//! - The legacy shape is resolved once while parsing, never downstream

pub mod legacy;
pub mod loader;
pub mod schema;
pub mod watcher;

pub use loader::ConfigError;
pub use schema::{Options, OptionsOverrides, Port, ResponseOverride, ServiceDefinition, ServiceMap, Verb};
