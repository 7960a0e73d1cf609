//! XML endpoint (XXE demo).
//!
//! The injected parser honors internal DTD entity declarations, including
//! SYSTEM entities read from the local filesystem.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::{HandlerResult, Reply};
use crate::routing::{handler, Category, Registry, RegistryError};

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        Method::POST,
        "/api/xml/parse",
        Category::Xxe,
        "parse XML with entity expansion enabled",
        handler(parse),
    )?;
    Ok(())
}

async fn parse(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    // Raw XML body, or a JSON envelope {"xml": "..."} for convenience.
    let document = match ctx.text_body() {
        Some(text) => text.to_string(),
        None => {
            let body = ctx.json_body()?;
            match body.get("xml").and_then(Value::as_str) {
                Some(xml) => xml.to_string(),
                None => {
                    return Ok(Reply::json(
                        StatusCode::BAD_REQUEST,
                        json!({"error": "XML document is required"}),
                    ))
                }
            }
        }
    };

    match collab.xml.parse(&document).await {
        Ok(parsed) => Ok(Reply::ok_json(json!({"parsed": parsed}))),
        // Parse and entity-resolution errors are the demo payload; surface
        // them verbatim.
        Err(e) => Ok(Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"error": e.to_string()}),
        )),
    }
}
