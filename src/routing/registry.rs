//! Route registry: the startup-built table of demo endpoints.
//!
//! # Responsibilities
//! - Store registered (method, pattern) → handler entries
//! - Reject duplicate route keys at registration time
//! - Look up the first matching entry for a request
//!
//! # Design Decisions
//! - Immutable after construction (shared via Arc, no locks)
//! - First-registered wins; registration order is the match order
//! - Duplicate registration fails fast and leaves the table unchanged
//! - Resolution distinguishes no-match (404) from wrong-method (405)

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::HandlerResult;
use crate::routing::pattern::{Params, RoutePattern};

/// Boxed future returned by a handler invocation.
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// A registered demo handler. Receives the per-request context and the
/// shared collaborator bag; must not retain either past the response.
pub type Handler =
    Arc<dyn Fn(RequestContext, Arc<Collaborators>) -> HandlerFuture + Send + Sync>;

/// Adapt a plain async fn into a registrable [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestContext, Arc<Collaborators>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx, collab| Box::pin(f(ctx, collab)))
}

/// Vulnerability class a demo endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Ssti,
    Idor,
    Sqli,
    Xxe,
    PrototypePollution,
    Deserialization,
    CommandInjection,
    Auth,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ssti => "ssti",
            Self::Idor => "idor",
            Self::Sqli => "sqli",
            Self::Xxe => "xxe",
            Self::PrototypePollution => "prototype-pollution",
            Self::Deserialization => "deserialization",
            Self::CommandInjection => "command-injection",
            Self::Auth => "auth",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

/// Errors raised while building the registry. All of them abort startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate route: {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },
}

/// One registered route.
pub struct RegistryEntry {
    pub method: Method,
    pub pattern: RoutePattern,
    pub category: Category,
    pub description: &'static str,
    pub handler: Handler,
}

/// Result of resolving a request against the registry.
pub enum Resolution<'a> {
    /// First matching entry plus its captured parameters.
    Matched(&'a RegistryEntry, Params),
    /// Some pattern matched the path, but under a different method.
    WrongMethod,
    /// Nothing matched.
    NoMatch,
}

/// Immutable route table, built once at startup.
#[derive(Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Fails if the (method, pattern) key is already
    /// present; on failure the registry is unchanged.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        category: Category,
        description: &'static str,
        handler: Handler,
    ) -> Result<(), RegistryError> {
        let duplicate = self
            .entries
            .iter()
            .any(|e| e.method == method && e.pattern.as_str() == pattern);
        if duplicate {
            return Err(RegistryError::DuplicateRoute {
                method,
                pattern: pattern.to_string(),
            });
        }

        self.entries.push(RegistryEntry {
            method,
            pattern: RoutePattern::parse(pattern),
            category,
            description,
            handler,
        });
        Ok(())
    }

    /// Walk entries in registration order and return the first match.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_> {
        let mut path_matched = false;

        for entry in &self.entries {
            if let Some(params) = entry.pattern.matches(path) {
                if &entry.method == method {
                    return Resolution::Matched(entry, params);
                }
                path_matched = true;
            }
        }

        if path_matched {
            Resolution::WrongMethod
        } else {
            Resolution::NoMatch
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::outcome::Reply;

    fn noop() -> Handler {
        handler(|_ctx, _collab| async { Ok(Reply::ok_json(serde_json::json!({}))) })
    }

    #[test]
    fn resolve_round_trips_registered_keys() {
        let mut reg = Registry::new();
        reg.register(Method::GET, "/api/invoice/all", Category::Idor, "list", noop())
            .unwrap();
        reg.register(Method::GET, "/api/invoice/:id", Category::Idor, "get", noop())
            .unwrap();

        match reg.resolve(&Method::GET, "/api/invoice/all") {
            Resolution::Matched(entry, _) => {
                assert_eq!(entry.pattern.as_str(), "/api/invoice/all");
            }
            _ => panic!("expected match"),
        }
        match reg.resolve(&Method::GET, "/api/invoice/42") {
            Resolution::Matched(entry, params) => {
                assert_eq!(entry.pattern.as_str(), "/api/invoice/:id");
                assert_eq!(params.get("id").map(String::as_str), Some("42"));
            }
            _ => panic!("expected match"),
        }
    }

    #[test]
    fn first_registered_wins_on_overlap() {
        let mut reg = Registry::new();
        reg.register(Method::GET, "/api/settings/all", Category::Other, "all", noop())
            .unwrap();
        reg.register(Method::GET, "/api/settings/:key", Category::Other, "one", noop())
            .unwrap();

        match reg.resolve(&Method::GET, "/api/settings/all") {
            Resolution::Matched(entry, _) => {
                assert_eq!(entry.pattern.as_str(), "/api/settings/all");
            }
            _ => panic!("expected match"),
        }
    }

    #[test]
    fn duplicate_registration_is_atomic() {
        let mut reg = Registry::new();
        reg.register(Method::GET, "/api/search", Category::Other, "a", noop())
            .unwrap();
        let err = reg
            .register(Method::GET, "/api/search", Category::Other, "b", noop())
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRoute { .. }));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn same_pattern_different_method_is_allowed() {
        let mut reg = Registry::new();
        reg.register(Method::GET, "/api/comments", Category::Other, "list", noop())
            .unwrap();
        reg.register(Method::POST, "/api/comments", Category::Other, "add", noop())
            .unwrap();
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn wrong_method_is_distinguished_from_no_match() {
        let mut reg = Registry::new();
        reg.register(Method::GET, "/api/search", Category::Other, "search", noop())
            .unwrap();

        assert!(matches!(
            reg.resolve(&Method::POST, "/api/search"),
            Resolution::WrongMethod
        ));
        assert!(matches!(
            reg.resolve(&Method::GET, "/api/missing"),
            Resolution::NoMatch
        ));
    }
}
