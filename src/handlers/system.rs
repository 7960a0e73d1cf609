//! System endpoints (command injection demos).
//!
//! Every parameter here reaches the shell unmodified. The `info` endpoint
//! maps a few known keys to fixed commands and runs anything else verbatim.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::{Failure, HandlerResult, Reply};
use crate::routing::{handler, Category, Registry, RegistryError};

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        Method::GET,
        "/api/system/exec",
        Category::CommandInjection,
        "run an arbitrary command from the query string",
        handler(exec),
    )?;
    registry.register(
        Method::GET,
        "/api/system/ping",
        Category::CommandInjection,
        "interpolate a host into a ping invocation",
        handler(ping),
    )?;
    registry.register(
        Method::GET,
        "/api/system/info",
        Category::CommandInjection,
        "system information lookup with a verbatim fallback",
        handler(info),
    )?;
    Ok(())
}

async fn run(command: &str, collab: &Collaborators) -> HandlerResult {
    tracing::debug!(command = %command, "executing");
    match collab.executor.run(command).await {
        Ok(output) => Ok(Reply::ok_json(json!({"output": output.stdout}))),
        Err(e) => Err(Failure::handler(format!("command execution failed: {e}"))),
    }
}

async fn exec(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let Some(command) = ctx.query_param("command") else {
        return Ok(Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"error": "command query parameter is required"}),
        ));
    };
    run(command, &collab).await
}

async fn ping(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let Some(host) = ctx.query_param("host") else {
        return Ok(Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"error": "host query parameter is required"}),
        ));
    };
    run(&format!("ping -c 4 {host}"), &collab).await
}

async fn info(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let kind = ctx.query_param("type").unwrap_or("");
    let command = match kind {
        "cpu" => "cat /proc/cpuinfo",
        "memory" => "free -m",
        "disk" => "df -h",
        other => other,
    };
    run(command, &collab).await
}
