//! invoice-lab: an intentionally vulnerable invoicing API for security
//! training.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                 LAB SERVER                   │
//!                       │                                              │
//!    Client Request     │  ┌────────┐   ┌──────────┐   ┌───────────┐  │
//!    ───────────────────┼─▶│  http  │──▶│ dispatch │──▶│  routing  │  │
//!                       │  │ server │   │+isolation│   │ registry  │  │
//!                       │  └────────┘   └────┬─────┘   └───────────┘  │
//!                       │                    │                        │
//!                       │                    ▼                        │
//!                       │             ┌────────────┐   ┌───────────┐  │
//!    Client Response    │             │  handlers  │──▶│  collab   │  │
//!    ◀──────────────────┼─────────────│ (plug-ins) │   │stores/sql/│  │
//!                       │             └────────────┘   │exec/parser│  │
//!                       │                              └───────────┘  │
//!                       │  ┌────────────────────────────────────────┐ │
//!                       │  │ config · observability · lifecycle     │ │
//!                       │  └────────────────────────────────────────┘ │
//!                       └──────────────────────────────────────────────┘
//! ```
//!
//! Every endpoint is a deliberately unsafe demo. The dispatcher guarantees
//! that one handler's failure, hang, or panic never reaches another
//! request; nothing else here should be trusted with anything.

// Core subsystems
pub mod collab;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use collab::Collaborators;
pub use config::AppConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Registry;
