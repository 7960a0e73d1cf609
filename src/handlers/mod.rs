//! Handler modules: the pluggable vulnerability demos.
//!
//! # Data Flow
//! ```text
//! build_registry()
//!     → each module registers its routes (order matters: first wins)
//!     → Registry frozen behind Arc, handed to the Dispatcher
//!
//! Per request:
//!     Dispatcher → handler(ctx, collaborators) → Reply | Failure
//! ```
//!
//! # Design Decisions
//! - One file per vulnerability family, mirroring the demo catalogue
//! - Handlers own their stores; nothing here is reachable as a global
//! - A handler failing, hanging, or racing never affects its neighbors:
//!   that guarantee lives in the dispatcher, not here

pub mod auth;
pub mod comments;
pub mod customers;
pub mod deserialize;
pub mod files;
pub mod invoice;
pub mod settings;
pub mod system;
pub mod template;
pub mod xml;

use crate::routing::{Registry, RegistryError};

/// Build the full demo route table. A duplicate registration anywhere is a
/// startup failure.
pub fn build_registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();

    invoice::register(&mut registry)?;
    auth::register(&mut registry)?;
    files::register(&mut registry)?;
    system::register(&mut registry)?;
    settings::register(&mut registry)?;
    template::register(&mut registry)?;
    comments::register(&mut registry)?;
    xml::register(&mut registry)?;
    deserialize::register(&mut registry)?;
    customers::register(&mut registry)?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use crate::routing::Resolution;

    #[test]
    fn full_registry_builds_without_conflicts() {
        let registry = build_registry().unwrap();
        assert!(!registry.is_empty());
    }

    #[test]
    fn representative_routes_resolve() {
        let registry = build_registry().unwrap();
        for (method, path) in [
            (Method::POST, "/api/invoice"),
            (Method::GET, "/api/invoice/INV-1000"),
            (Method::GET, "/api/files/read-secure"),
            (Method::GET, "/api/system/exec"),
            (Method::POST, "/api/settings/update"),
            (Method::POST, "/api/template/render"),
            (Method::POST, "/api/xml/parse"),
            (Method::POST, "/api/deserialize/data"),
            (Method::GET, "/api/customers/search"),
        ] {
            assert!(
                matches!(registry.resolve(&method, path), Resolution::Matched(..)),
                "expected {method} {path} to resolve"
            );
        }
    }
}
