//! Search and comment endpoints (reflected and stored XSS demos).
//!
//! Both build a rawHtml field out of unsanitized input: search reflects the
//! query straight back, comments store whatever was posted and replay it.

use std::sync::{Arc, RwLock};

use axum::http::Method;
use chrono::Utc;
use serde_json::{json, Value};

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::{HandlerResult, Reply};
use crate::routing::{handler, Category, Registry, RegistryError};

/// Stored comments, append-only. Concurrent writers race; acceptable here.
#[derive(Default)]
pub struct CommentBoard {
    comments: RwLock<Vec<Value>>,
}

impl CommentBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, comment: Value) {
        if let Ok(mut comments) = self.comments.write() {
            comments.push(comment);
        }
    }

    pub fn all(&self) -> Vec<Value> {
        self.comments
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        Method::GET,
        "/api/search",
        Category::Other,
        "reflect the search query into rawHtml",
        handler(search),
    )?;
    registry.register(
        Method::POST,
        "/api/comments",
        Category::Other,
        "store a raw comment",
        handler(add_comment),
    )?;
    registry.register(
        Method::GET,
        "/api/comments",
        Category::Other,
        "replay stored raw comments",
        handler(list_comments),
    )?;
    Ok(())
}

async fn search(ctx: RequestContext, _collab: Arc<Collaborators>) -> HandlerResult {
    let query = ctx.query_param("q").unwrap_or("");
    Ok(Reply::ok_json(json!({
        "results": [],
        "searchHeader": query,
        "rawHtml": format!(
            "<div><h4>Search Results</h4><p>You searched for: {query}</p></div>"
        ),
    })))
}

async fn add_comment(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let body = ctx.json_body()?;
    let comment = body.get("comment").and_then(Value::as_str).unwrap_or("");
    let author = body.get("author").and_then(Value::as_str).unwrap_or("");

    collab.comments.push(json!({
        "comment": comment,
        "author": author,
        "rawHtml": format!(
            "<div class=\"comment\"><strong>{author}</strong> says:<p>{comment}</p></div>"
        ),
        "date": Utc::now().to_rfc3339(),
    }));
    Ok(Reply::ok_json(json!({"status": "success"})))
}

async fn list_comments(_ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    Ok(Reply::ok_json(Value::Array(collab.comments.all())))
}
