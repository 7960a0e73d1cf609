//! Invoice endpoints (IDOR demo).
//!
//! Invoice ids come straight from the client and lookups never check who is
//! asking: any authenticated or anonymous caller can fetch any invoice by
//! guessing its predictable id.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use axum::http::{header, HeaderValue, Method, StatusCode};
use serde_json::{json, Value};

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::{Failure, HandlerResult, Reply};
use crate::routing::{handler, Category, Registry, RegistryError};

/// In-memory invoice records keyed by client-chosen id.
#[derive(Default)]
pub struct InvoiceStore {
    records: RwLock<BTreeMap<String, Value>>,
}

impl InvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: String, record: Value) {
        if let Ok(mut records) = self.records.write() {
            records.insert(id, record);
        }
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.records.read().ok()?.get(id).cloned()
    }

    pub fn all(&self) -> Vec<Value> {
        self.records
            .read()
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        Method::POST,
        "/api/invoice",
        Category::Idor,
        "create an invoice with a client-supplied id",
        handler(create),
    )?;
    registry.register(
        Method::GET,
        "/api/invoice/all",
        Category::Idor,
        "list every invoice regardless of owner",
        handler(list),
    )?;
    registry.register(
        Method::POST,
        "/api/invoice/download",
        Category::Idor,
        "create an invoice and return it as an attachment",
        handler(download),
    )?;
    registry.register(
        Method::GET,
        "/api/invoice/:id",
        Category::Idor,
        "fetch any invoice by id, no ownership check",
        handler(get),
    )?;
    Ok(())
}

fn store_from_body(ctx: &RequestContext, collab: &Collaborators) -> Result<String, Failure> {
    let body = ctx.json_body()?;
    let Some(id) = body
        .pointer("/invoice/invoiceId")
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return Err(Failure::handler("invoice.invoiceId is required"));
    };
    collab.invoices.insert(id.clone(), body.clone());
    Ok(id)
}

async fn create(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let id = store_from_body(&ctx, &collab)?;
    let record = collab
        .invoices
        .get(&id)
        .ok_or_else(|| Failure::handler("invoice vanished after insert"))?;
    Ok(Reply::ok_json(record))
}

async fn list(_ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    Ok(Reply::ok_json(Value::Array(collab.invoices.all())))
}

// The requester's identity is deliberately never consulted here.
async fn get(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let id = ctx
        .param("id")
        .ok_or_else(|| Failure::handler("missing id"))?;
    let record = collab
        .invoices
        .get(id)
        .ok_or_else(|| Failure::handler("Invoice doesn't exist."))?;

    let client = record.get("client").cloned().unwrap_or(Value::Null);
    let seller = record.get("seller").cloned().unwrap_or(Value::Null);
    let invoice = record.get("invoice").cloned().unwrap_or(Value::Null);
    Ok(Reply::ok_json(
        json!({"client": client, "seller": seller, "invoice": invoice}),
    ))
}

async fn download(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let id = store_from_body(&ctx, &collab)?;
    let record = collab
        .invoices
        .get(&id)
        .ok_or_else(|| Failure::handler("invoice vanished after insert"))?;

    // A real renderer is an external collaborator; the demo ships the
    // document as a plain-text attachment.
    let document = render_document(&id, &record);
    let disposition = format!("attachment; filename=\"invoice-{id}.txt\"");
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|_| Failure::handler("invalid invoice id in filename"))?;

    Ok(Reply::text(StatusCode::OK, document)
        .with_header(header::CONTENT_DISPOSITION, disposition))
}

fn render_document(id: &str, record: &Value) -> String {
    let mut out = format!("INVOICE {id}\n\n");
    for section in ["client", "seller", "invoice"] {
        if let Some(Value::Object(fields)) = record.get(section) {
            out.push_str(&format!("[{section}]\n"));
            for (key, value) in fields {
                out.push_str(&format!("{key}: {value}\n"));
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_returns_inserted_records() {
        let store = InvoiceStore::new();
        store.insert("INV-1".into(), json!({"invoice": {"invoiceId": "INV-1"}}));
        assert!(store.get("INV-1").is_some());
        assert!(store.get("INV-2").is_none());
        assert_eq!(store.all().len(), 1);
    }

    #[test]
    fn rendered_document_lists_sections() {
        let record = json!({
            "client": {"name": "Acme"},
            "seller": {"name": "Lab"},
            "invoice": {"invoiceId": "INV-1", "total": 100}
        });
        let doc = render_document("INV-1", &record);
        assert!(doc.contains("INVOICE INV-1"));
        assert!(doc.contains("[client]"));
        assert!(doc.contains("total: 100"));
    }
}
