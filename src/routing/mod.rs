//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup and on reload):
//!     ServiceMap (path → definition)
//!     → compiler.rs (one RouteDescriptor per path and verb, defaults applied)
//!     → router.rs (RouteTable → axum Router, `:id` → `{id}`)
//!
//! Incoming Request:
//!     → axum matches pattern and method
//!     → resolver.rs (switch field → variant mock file)
//!     → http::response serves the file
//! ```
//!
//! # Design Decisions
//! - Routes are compiled into an immutable router; reload builds a new one
//! - Per-verb overrides win over definition values, which win over globals
//! - Missing mock files fail late, at request time

pub mod compiler;
pub mod resolver;
pub mod router;

pub use compiler::{set_route, set_routes, RouteDescriptor, RouteRegistrar};
pub use resolver::{set_mock_file, FieldLookup, RequestFields};
pub use router::RouteTable;
