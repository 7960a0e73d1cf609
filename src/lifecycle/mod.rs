//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main):
//!     Load config → Validate → Build collaborators → Build registry → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → broadcast to subscribers → server drains and exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
