//! Handler outcome types and their translation to wire responses.
//!
//! # Responsibilities
//! - Define the tagged result a handler produces (Reply or Failure)
//! - Translate outcomes into HTTP responses with fixed body shapes
//!
//! # Design Decisions
//! - Failures carry a kind and a message, never a stack trace
//! - MalformedBody and HandlerError map to 500, Timeout to 504
//! - Handlers that want a different error shape return a Reply themselves;
//!   the generic layer only sees what they did not catch

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Response, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

/// Why a handler (or the adapter on its behalf) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request body could not be parsed as its declared content type.
    MalformedBody,
    /// The handler returned an error or panicked.
    HandlerError,
    /// The handler exceeded the configured ceiling and was cancelled.
    Timeout,
}

/// A failure surfaced to the client as `{"error": message}`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::MalformedBody,
            message: message.into(),
        }
    }

    pub fn handler(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::HandlerError,
            message: message.into(),
        }
    }

    pub fn timeout(ceiling_secs: u64) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: format!("handler exceeded {ceiling_secs}s ceiling"),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            FailureKind::MalformedBody | FailureKind::HandlerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// Body of a successful reply.
#[derive(Debug, Clone)]
pub enum ReplyBody {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

/// A handler's successful response: status, body, optional extra headers.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: ReplyBody,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl Reply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: ReplyBody::Json(body),
            headers: Vec::new(),
        }
    }

    pub fn ok_json(body: Value) -> Self {
        Self::json(StatusCode::OK, body)
    }

    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: ReplyBody::Text(body.into()),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }
}

/// What every handler returns.
pub type HandlerResult = Result<Reply, Failure>;

/// Fixed 404 body shape.
pub fn not_found() -> Response<Body> {
    json_response(StatusCode::NOT_FOUND, json!({"error": "not found"}))
}

/// Fixed 405 body shape.
pub fn method_not_allowed() -> Response<Body> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        json!({"error": "method not allowed"}),
    )
}

/// Translate a handler outcome into the wire response.
pub fn into_response(outcome: HandlerResult) -> Response<Body> {
    match outcome {
        Ok(reply) => reply_response(reply),
        Err(failure) => json_response(failure.status(), json!({"error": failure.message})),
    }
}

fn reply_response(reply: Reply) -> Response<Body> {
    let mut builder = Response::builder().status(reply.status);

    let (default_type, body) = match reply.body {
        ReplyBody::Json(value) => (
            "application/json",
            Body::from(value.to_string()),
        ),
        ReplyBody::Text(text) => ("text/plain; charset=utf-8", Body::from(text)),
        ReplyBody::Bytes(bytes) => ("application/octet-stream", Body::from(bytes)),
    };

    let explicit_type = reply
        .headers
        .iter()
        .any(|(name, _)| name == header::CONTENT_TYPE);
    if !explicit_type {
        builder = builder.header(header::CONTENT_TYPE, default_type);
    }
    for (name, value) in reply.headers {
        builder = builder.header(name, value);
    }

    builder.body(body).unwrap_or_else(|_| {
        // Only reachable with invalid header values supplied by a handler.
        let mut resp = Response::new(Body::from("{\"error\":\"invalid response\"}"));
        *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        resp
    })
}

fn json_response(status: StatusCode, body: Value) -> Response<Body> {
    let mut resp = Response::new(Body::from(body.to_string()));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_maps_to_500() {
        let resp = into_response(Err(Failure::handler("boom")));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn timeout_maps_to_504() {
        let resp = into_response(Err(Failure::timeout(30)));
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn reply_headers_override_content_type() {
        let reply = Reply::text(StatusCode::OK, "x").with_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml"),
        );
        let resp = into_response(Ok(reply));
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/xml"
        );
    }
}
