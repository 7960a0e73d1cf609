//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → registry.rs (walk entries in registration order)
//!     → pattern.rs (segment match, parameter capture)
//!     → Return: Matched(entry, params) | WrongMethod | NoMatch
//!
//! Registry Construction (at startup):
//!     handlers::build_registry()
//!     → register() each demo endpoint
//!     → DuplicateRoute aborts startup
//!     → Freeze as immutable Registry behind Arc
//! ```
//!
//! # Design Decisions
//! - Registry built at startup, immutable at runtime
//! - No regex in hot path (segment walking only)
//! - Deterministic: first-registered entry wins on overlap

pub mod pattern;
pub mod registry;

pub use pattern::{Params, RoutePattern};
pub use registry::{handler, Category, Handler, Registry, RegistryEntry, RegistryError, Resolution};
