//! Deserialization endpoint (insecure deserialization demo).
//!
//! The payload is a JSON document embedded as a string. Any string value
//! tagged `$$exec$$:` is handed to the command executor during
//! "unserialization" and replaced with the command's stdout — the classic
//! function-in-the-data deserializer, reduced to its effect.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::collab::{CommandExecutor, Collaborators};
use crate::http::context::RequestContext;
use crate::http::outcome::{Failure, HandlerResult, Reply};
use crate::routing::{handler, Category, Registry, RegistryError};

const EXEC_TAG: &str = "$$exec$$:";

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        Method::POST,
        "/api/deserialize/data",
        Category::Deserialization,
        "unserialize embedded JSON, executing tagged values",
        handler(unserialize),
    )?;
    Ok(())
}

async fn unserialize(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let body = ctx.json_body()?;
    let Some(data) = body.get("data").and_then(Value::as_str) else {
        return Ok(Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"error": "data string is required"}),
        ));
    };

    let mut value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            return Ok(Reply::json(
                StatusCode::BAD_REQUEST,
                json!({"error": e.to_string()}),
            ))
        }
    };

    expand(&mut value, collab.executor.as_ref())
        .await
        .map_err(|e| Failure::handler(format!("execution failed: {e}")))?;

    Ok(Reply::ok_json(json!({
        "message": "Data processed",
        "result": value,
    })))
}

/// Walk the document depth-first, executing tagged strings in place.
fn expand<'a>(
    value: &'a mut Value,
    executor: &'a dyn CommandExecutor,
) -> Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + 'a>> {
    Box::pin(async move {
        match value {
            Value::String(s) if s.starts_with(EXEC_TAG) => {
                let command = s[EXEC_TAG.len()..].to_string();
                let output = executor.run(&command).await?;
                *s = output.stdout;
            }
            Value::Array(items) => {
                for item in items {
                    expand(item, executor).await?;
                }
            }
            Value::Object(map) => {
                for (_, v) in map.iter_mut() {
                    expand(v, executor).await?;
                }
            }
            _ => {}
        }
        Ok(())
    })
}
