//! Template endpoints (SSTI demo).
//!
//! The renderer resolves `${path}` placeholders against the caller's data
//! bag AND the process environment (`${env.NAME}`). Handing the template
//! author access to ambient process state is the demonstrated injection.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::{HandlerResult, Reply};
use crate::routing::{handler, Category, Registry, RegistryError};

/// Stored templates keyed by generated id.
#[derive(Default)]
pub struct TemplateStore {
    templates: RwLock<HashMap<String, Value>>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: Value) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(id.clone(), record);
        }
        id
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.templates.read().ok()?.get(id).cloned()
    }
}

/// Expand `${path}` placeholders. Dotted paths walk the data object;
/// `env.NAME` reads the process environment.
pub fn render(template: &str, data: &Value) -> Result<String, String> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| "unterminated placeholder".to_string())?;
        let path = &after[..end];
        output.push_str(&resolve(path, data)?);
        rest = &after[end + 1..];
    }
    output.push_str(rest);
    Ok(output)
}

fn resolve(path: &str, data: &Value) -> Result<String, String> {
    if let Some(var) = path.strip_prefix("env.") {
        return std::env::var(var).map_err(|_| format!("{var} is not defined"));
    }

    let mut current = data;
    for segment in path.split('.') {
        current = current
            .get(segment)
            .ok_or_else(|| format!("{path} is not defined"))?;
    }
    Ok(match current {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        Method::POST,
        "/api/template/render",
        Category::Ssti,
        "render a caller-supplied template against caller data and the environment",
        handler(render_template),
    )?;
    registry.register(
        Method::POST,
        "/api/template",
        Category::Ssti,
        "store a template",
        handler(create),
    )?;
    registry.register(
        Method::GET,
        "/api/template/:id",
        Category::Ssti,
        "fetch a stored template",
        handler(get),
    )?;
    Ok(())
}

async fn render_template(ctx: RequestContext, _collab: Arc<Collaborators>) -> HandlerResult {
    let body = ctx.json_body()?;
    let Some(template) = body.get("template").and_then(Value::as_str) else {
        return Ok(Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"error": "Template string is required"}),
        ));
    };
    let data = body.get("data").cloned().unwrap_or_else(|| json!({}));

    match render(template, &data) {
        Ok(result) => Ok(Reply::ok_json(json!({"result": result}))),
        Err(message) => Ok(Reply::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": message}),
        )),
    }
}

async fn create(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let body = ctx.json_body()?;
    if body.get("name").and_then(Value::as_str).is_none() {
        return Ok(Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"error": "Template name is required"}),
        ));
    }
    let id = collab.templates.insert(json!({
        "name": body.get("name").cloned().unwrap_or(Value::Null),
        "content": body.get("content").cloned().unwrap_or(Value::Null),
    }));
    Ok(Reply::ok_json(json!({"id": id})))
}

async fn get(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let id = ctx.param("id").unwrap_or_default();
    match collab.templates.get(id) {
        Some(template) => Ok(Reply::ok_json(template)),
        None => Ok(Reply::json(
            StatusCode::NOT_FOUND,
            json!({"error": "Template not found"}),
        )),
    }
}
