//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router feeding every request into the Dispatcher
//! - Wire up middleware (tracing, request ID)
//! - Bind the server to a listener and run until shutdown
//!
//! # Design Decisions
//! - Axum's own routing is a single wildcard: the crate's Registry decides
//!   everything, so route semantics live in one place
//! - Request IDs come from tower-http's request-id layers (UUID v4)

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::collab::Collaborators;
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::handlers;
use crate::routing::{Registry, RegistryError};

/// Application state injected into the entry handler.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
}

/// HTTP server for the lab.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server with the full demo registry.
    pub fn new(config: &AppConfig, collab: Arc<Collaborators>) -> Result<Self, RegistryError> {
        let registry = Arc::new(handlers::build_registry()?);
        Ok(Self::with_registry(config, collab, registry))
    }

    /// Create a server around an explicit registry. Tests use this to wire
    /// custom routes.
    pub fn with_registry(
        config: &AppConfig,
        collab: Arc<Collaborators>,
        registry: Arc<Registry>,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(
            registry,
            collab,
            Duration::from_secs(config.timeouts.handler_secs),
            config.limits.max_body_bytes,
        ));

        let state = AppState { dispatcher };
        let router = Router::new()
            .route("/{*path}", any(dispatch_entry))
            .route("/", any(dispatch_entry))
            .with_state(state)
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Entry point for every request: hand it to the dispatcher.
async fn dispatch_entry(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.dispatcher.handle(request).await
}
