//! Customer and order endpoints (SQL injection demos).
//!
//! The raw variants interpolate request values straight into SQL text; the
//! `search-safe` endpoint is the parameterized contrast. Database errors are
//! surfaced verbatim in the body — leaking them is part of the demo.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::{HandlerResult, Reply};
use crate::routing::{handler, Category, Registry, RegistryError};

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        Method::POST,
        "/api/customers/init",
        Category::Sqli,
        "seed sample customers and orders",
        handler(init_sample_data),
    )?;
    registry.register(
        Method::GET,
        "/api/customers/search",
        Category::Sqli,
        "customer search via string-interpolated SQL",
        handler(search),
    )?;
    registry.register(
        Method::GET,
        "/api/customers/search-safe",
        Category::Sqli,
        "customer search via bound parameters",
        handler(search_safe),
    )?;
    registry.register(
        Method::GET,
        "/api/customers/credit",
        Category::Sqli,
        "credit lookup via string-interpolated SQL",
        handler(check_credit),
    )?;
    registry.register(
        Method::POST,
        "/api/orders",
        Category::Sqli,
        "order creation via string-interpolated SQL",
        handler(create_order),
    )?;
    Ok(())
}

fn customer_row(row: &SqliteRow) -> Value {
    json!({
        "id": row.try_get::<i64, _>("id").unwrap_or_default(),
        "name": row.try_get::<String, _>("name").unwrap_or_default(),
        "email": row.try_get::<String, _>("email").unwrap_or_default(),
        "credit_limit": row.try_get::<f64, _>("credit_limit").unwrap_or_default(),
    })
}

fn sql_error(e: sqlx::Error) -> Reply {
    Reply::json(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": e.to_string()}),
    )
}

async fn init_sample_data(_ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let pool = &collab.sql;
    for statement in ["DELETE FROM orders", "DELETE FROM customers"] {
        if let Err(e) = sqlx::query(statement).execute(pool).await {
            return Ok(sql_error(e));
        }
    }

    let customers = [
        ("John Doe", "john@example.com", 5000.0),
        ("Jane Smith", "jane@example.com", 3000.0),
        ("Bob Wilson", "bob@example.com", 2000.0),
    ];
    for (name, email, limit) in customers {
        let result = sqlx::query("INSERT INTO customers (name, email, credit_limit) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(limit)
            .execute(pool)
            .await;
        if let Err(e) = result {
            return Ok(sql_error(e));
        }
    }

    let orders = [(1i64, 1500.0, "First order"), (2, 2500.0, "Priority delivery"), (3, 1000.0, "Standard order")];
    for (customer_id, amount, notes) in orders {
        let result = sqlx::query("INSERT INTO orders (customer_id, amount, notes) VALUES (?, ?, ?)")
            .bind(customer_id)
            .bind(amount)
            .bind(notes)
            .execute(pool)
            .await;
        if let Err(e) = result {
            return Ok(sql_error(e));
        }
    }

    Ok(Reply::ok_json(json!({"message": "Sample data initialized"})))
}

async fn search(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let query = ctx.query_param("query").unwrap_or("");
    // Interpolated on purpose.
    let sql = format!(
        "SELECT * FROM customers WHERE name LIKE '%{query}%' OR email LIKE '%{query}%'"
    );
    match sqlx::query(&sql).fetch_all(&collab.sql).await {
        Ok(rows) => Ok(Reply::ok_json(Value::Array(
            rows.iter().map(customer_row).collect(),
        ))),
        Err(e) => Ok(sql_error(e)),
    }
}

async fn search_safe(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let query = ctx.query_param("query").unwrap_or("");
    let pattern = format!("%{query}%");
    let result = sqlx::query("SELECT * FROM customers WHERE name LIKE ? OR email LIKE ?")
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&collab.sql)
        .await;
    match result {
        Ok(rows) => Ok(Reply::ok_json(Value::Array(
            rows.iter().map(customer_row).collect(),
        ))),
        Err(e) => Ok(sql_error(e)),
    }
}

async fn check_credit(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let customer_id = ctx.query_param("customer_id").unwrap_or("");
    let sql = format!("SELECT credit_limit FROM customers WHERE id = {customer_id} LIMIT 1");
    match sqlx::query(&sql).fetch_optional(&collab.sql).await {
        Ok(Some(row)) => Ok(Reply::ok_json(json!({
            "credit_limit": row.try_get::<f64, _>("credit_limit").unwrap_or_default(),
        }))),
        Ok(None) => Ok(Reply::ok_json(json!({"credit_limit": 0}))),
        Err(e) => Ok(sql_error(e)),
    }
}

async fn create_order(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let body = ctx.json_body()?;
    let customer_id = body.get("customer_id").cloned().unwrap_or(Value::Null);
    let amount = body.get("amount").cloned().unwrap_or(Value::Null);
    let notes = body.get("notes").and_then(Value::as_str).unwrap_or("");

    let sql = format!(
        "INSERT INTO orders (customer_id, amount, notes) VALUES ({customer_id}, {amount}, '{notes}')"
    );
    match sqlx::query(&sql).execute(&collab.sql).await {
        Ok(result) => Ok(Reply::ok_json(json!({"id": result.last_insert_rowid()}))),
        Err(e) => Ok(sql_error(e)),
    }
}
