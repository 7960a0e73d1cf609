//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Raw request
//!     → health short-circuit (never touches the registry)
//!     → context adapter (normalize, classify body)
//!     → registry resolve (404 / 405 on miss)
//!     → isolation boundary (own task + timeout + abort)
//!     → outcome translation (Reply / Failure → response)
//! ```
//!
//! # Design Decisions
//! - Each handler runs in its own spawned task: a panic is contained as a
//!   JoinError instead of unwinding into the dispatcher
//! - Timeout aborts the task; dropping the handler future releases every
//!   scoped resource it held (RAII is the cancellation contract)
//! - No retries: a demo handler executes at most once per request

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use serde_json::json;

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::{self, Failure, HandlerResult};
use crate::observability::metrics;
use crate::routing::{Registry, Resolution};

/// Request dispatcher. Holds only immutable, shared state; safe to call
/// concurrently from any number of connection tasks.
pub struct Dispatcher {
    registry: Arc<Registry>,
    collab: Arc<Collaborators>,
    handler_ceiling: Duration,
    max_body_bytes: usize,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        collab: Arc<Collaborators>,
        handler_ceiling: Duration,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            registry,
            collab,
            handler_ceiling,
            max_body_bytes,
        }
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        // Liveness is answered before any registry or adapter work so it
        // stays available even with an empty route table.
        if request.method() == Method::GET && request.uri().path() == "/health" {
            return health_response();
        }

        let start = Instant::now();
        let mut ctx = RequestContext::adapt(request, self.max_body_bytes).await;
        let method = ctx.method.clone();

        let (entry_handler, route_label, category) =
            match self.registry.resolve(&ctx.method, &ctx.path) {
                Resolution::Matched(entry, params) => {
                    ctx.params = params;
                    (
                        entry.handler.clone(),
                        entry.pattern.as_str().to_string(),
                        entry.category,
                    )
                }
                Resolution::WrongMethod => {
                    tracing::debug!(method = %ctx.method, path = %ctx.path, "method not allowed");
                    metrics::record_request(method.as_str(), 405, "none", start);
                    return outcome::method_not_allowed();
                }
                Resolution::NoMatch => {
                    tracing::debug!(method = %ctx.method, path = %ctx.path, "no route matched");
                    metrics::record_request(method.as_str(), 404, "none", start);
                    return outcome::not_found();
                }
            };

        tracing::debug!(
            method = %method,
            route = %route_label,
            category = %category,
            "dispatching"
        );

        let result = self
            .run_isolated(entry_handler(ctx, self.collab.clone()))
            .await;

        if let Err(failure) = &result {
            tracing::warn!(
                route = %route_label,
                kind = ?failure.kind,
                error = %failure.message,
                "handler failed"
            );
        }

        let response = outcome::into_response(result);
        metrics::record_request(
            method.as_str(),
            response.status().as_u16(),
            &route_label,
            start,
        );
        response
    }

    /// The isolation boundary: run a handler future in its own task under
    /// the configured ceiling. Panics become HandlerError; a timeout aborts
    /// the task, which drops the future and releases its scoped resources.
    async fn run_isolated(
        &self,
        future: crate::routing::registry::HandlerFuture,
    ) -> HandlerResult {
        let mut task = tokio::spawn(future);

        tokio::select! {
            joined = &mut task => match joined {
                Ok(result) => result,
                Err(e) if e.is_panic() => Err(Failure::handler(panic_message(e))),
                Err(e) => Err(Failure::handler(format!("handler task failed: {e}"))),
            },
            () = tokio::time::sleep(self.handler_ceiling) => {
                task.abort();
                Err(Failure::timeout(self.handler_ceiling.as_secs()))
            }
        }
    }
}

fn panic_message(e: tokio::task::JoinError) -> String {
    let payload = e.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}

fn health_response() -> Response<Body> {
    let mut resp = Response::new(Body::from(json!({"status": "ok"}).to_string()));
    *resp.status_mut() = StatusCode::OK;
    resp.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        axum::http::HeaderValue::from_static("application/json"),
    );
    resp
}
