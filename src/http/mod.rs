//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum wiring, request-id + trace layers)
//!     → dispatch (registry lookup, isolation boundary)
//!     → context.rs (normalized request shape handed to handlers)
//!     → outcome.rs (Reply/Failure → wire response)
//! ```

pub mod context;
pub mod outcome;
pub mod server;

pub use context::{Body, RequestContext};
pub use outcome::{Failure, FailureKind, HandlerResult, Reply, ReplyBody};
pub use server::HttpServer;
