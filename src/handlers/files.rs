//! File endpoints (path traversal demos).
//!
//! Three variants: a bare join, the "bypass replace" filter (a single
//! global `../` strip that `....//` walks straight through — kept exactly
//! as demonstrated, not fixed), and a template directory join.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::{HandlerResult, Reply};
use crate::routing::{handler, Category, Registry, RegistryError};

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        Method::GET,
        "/api/files/read",
        Category::Other,
        "read a file with an unvalidated path join",
        handler(read),
    )?;
    registry.register(
        Method::GET,
        "/api/files/read-secure",
        Category::Other,
        "read a file behind the bypassable ../ strip",
        handler(read_secure),
    )?;
    registry.register(
        Method::GET,
        "/api/files/template",
        Category::Other,
        "read a document template with no path validation",
        handler(get_template),
    )?;
    Ok(())
}

async fn read(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let Some(file) = ctx.query_param("file") else {
        return Ok(Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"error": "file query parameter is required"}),
        ));
    };

    let path = collab.files_root.join(file);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Reply::text(StatusCode::OK, content)),
        Err(_) => Ok(Reply::text(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error reading file",
        )),
    }
}

async fn read_secure(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let Some(filename) = ctx.query_param("filename") else {
        return Ok(Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"error": "filename query parameter is required"}),
        ));
    };

    // One global pass, exactly the demonstrated filter: "....//" collapses
    // back to "../" after the strip.
    let filtered = filename.replace("../", "");

    let path = collab.files_root.join(&filtered);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Reply::text(StatusCode::OK, content)),
        Err(_) => Ok(Reply::text(StatusCode::NOT_FOUND, "File not found")),
    }
}

async fn get_template(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let Some(name) = ctx.query_param("template") else {
        return Ok(Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"error": "template query parameter is required"}),
        ));
    };

    let path = collab.files_root.join("../templates").join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Reply::text(StatusCode::OK, content)),
        Err(_) => Ok(Reply::text(StatusCode::NOT_FOUND, "Template not found")),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn strip_filter_has_the_known_bypass() {
        // The filter removes "../" once, globally. Doubled-up dot segments
        // reassemble into a traversal after the strip.
        assert_eq!("....//etc/passwd".replace("../", ""), "../etc/passwd");
        assert_eq!("../secret".replace("../", ""), "secret");
    }
}
