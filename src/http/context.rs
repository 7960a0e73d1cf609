//! Request context adapter.
//!
//! # Responsibilities
//! - Normalize the raw framework request into a neutral shape
//! - Parse the query string (percent-decoded exactly once)
//! - Read and classify the body without ever failing the adapter itself
//!
//! # Design Decisions
//! - Header lookups stay case-insensitive via `http::HeaderMap`
//! - A JSON body that fails to parse becomes `Body::Malformed`, never an
//!   error out of `adapt`; handlers see it as a MalformedBody failure
//! - The context is created once per request and owned by the dispatcher;
//!   handlers receive it by value and cannot affect other requests

use std::collections::HashMap;

use axum::body::{to_bytes, Body as RawBody};
use axum::http::{header, HeaderMap, Method, Request};
use serde_json::Value;
use url::form_urlencoded;

use crate::http::outcome::Failure;
use crate::routing::Params;

/// Classified request body.
#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
    /// Declared JSON (or unreadable) body that failed to parse. The message
    /// is what a handler reports if it needed the body.
    Malformed(String),
}

/// Neutral request shape passed to handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    /// Captured route parameters; filled in by the dispatcher after
    /// resolution, already percent-decoded once.
    pub params: Params,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Body,
}

impl RequestContext {
    /// Build a context from a raw request. Never fails: malformed input is
    /// folded into the `Body::Malformed` variant.
    pub async fn adapt(request: Request<RawBody>, max_body_bytes: usize) -> Self {
        let (parts, raw_body) = request.into_parts();

        let query = parts
            .uri
            .query()
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let body = match to_bytes(raw_body, max_body_bytes).await {
            Ok(bytes) if bytes.is_empty() => Body::Empty,
            Ok(bytes) => classify_body(&content_type, &bytes),
            Err(e) => Body::Malformed(format!("failed to read body: {e}")),
        };

        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            params: Params::new(),
            query,
            headers: parts.headers,
            body,
        }
    }

    /// Captured route parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Decoded query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Header value as a string, case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The parsed JSON body, or the failure a JSON-requiring handler reports.
    pub fn json_body(&self) -> Result<&Value, Failure> {
        match &self.body {
            Body::Json(value) => Ok(value),
            Body::Malformed(message) => Err(Failure::malformed(message.clone())),
            _ => Err(Failure::malformed("expected a JSON body")),
        }
    }

    /// Raw textual body for handlers that accept non-JSON payloads (XML).
    pub fn text_body(&self) -> Option<&str> {
        match &self.body {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }
}

fn classify_body(content_type: &str, bytes: &[u8]) -> Body {
    if content_type.contains("json") {
        match serde_json::from_slice(bytes) {
            Ok(value) => Body::Json(value),
            Err(e) => Body::Malformed(format!("invalid JSON body: {e}")),
        }
    } else if content_type.contains("xml") || content_type.starts_with("text/") {
        Body::Text(String::from_utf8_lossy(bytes).into_owned())
    } else if content_type.is_empty() {
        // No declared type: accept JSON opportunistically, else keep text.
        match serde_json::from_slice(bytes) {
            Ok(value) => Body::Json(value),
            Err(_) => match std::str::from_utf8(bytes) {
                Ok(text) => Body::Text(text.to_string()),
                Err(_) => Body::Bytes(bytes.to_vec()),
            },
        }
    } else {
        Body::Bytes(bytes.to_vec())
    }
}
