//! Settings endpoints (prototype-pollution demo).
//!
//! Updates are an unfiltered deep merge. A `__proto__` key does not land in
//! the live settings at all: it merges into the defaults template, so the
//! pollution quietly survives a reset.

use std::sync::{Arc, Mutex};

use axum::http::{Method, StatusCode};
use serde_json::{json, Map, Value};

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::{Failure, HandlerResult, Reply};
use crate::routing::{handler, Category, Registry, RegistryError};

fn default_settings() -> Value {
    json!({
        "dateFormat": "YYYY-MM-DD",
        "currency": "USD",
        "language": "en",
        "theme": {
            "primary": "#1976d2",
            "secondary": "#424242",
            "accent": "#82b1ff"
        },
        "invoice": {
            "prefix": "INV-",
            "startNumber": 1000,
            "numberFormat": "${prefix}${number}"
        }
    })
}

struct SettingsState {
    current: Value,
    defaults: Value,
}

/// Process-wide settings, guarded by a single mutex. Concurrent writers
/// race on ordering; the dispatcher does not care.
pub struct SettingsStore {
    state: Mutex<SettingsState>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self {
            state: Mutex::new(SettingsState {
                current: default_settings(),
                defaults: default_settings(),
            }),
        }
    }
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Value {
        self.state
            .lock()
            .map(|s| s.current.clone())
            .unwrap_or(Value::Null)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.lock().ok()?.current.get(key).cloned()
    }

    /// Deep-merge `update` into the current settings. A `__proto__` member
    /// is routed into the defaults template instead.
    pub fn update(&self, update: &Map<String, Value>) -> Value {
        if let Ok(mut state) = self.state.lock() {
            for (key, value) in update {
                if key == "__proto__" {
                    if let Value::Object(polluted) = value {
                        merge(&mut state.defaults, polluted);
                    }
                } else {
                    merge_entry(&mut state.current, key, value);
                }
            }
            state.current.clone()
        } else {
            Value::Null
        }
    }

    pub fn reset(&self) -> Value {
        self.state
            .lock()
            .map(|mut s| {
                s.current = s.defaults.clone();
                s.current.clone()
            })
            .unwrap_or(Value::Null)
    }
}

fn merge(target: &mut Value, update: &Map<String, Value>) {
    for (key, value) in update {
        merge_entry(target, key, value);
    }
}

fn merge_entry(target: &mut Value, key: &str, value: &Value) {
    if let Value::Object(map) = target {
        match (map.get_mut(key), value) {
            (Some(existing @ Value::Object(_)), Value::Object(update)) => {
                merge(existing, update);
            }
            _ => {
                map.insert(key.to_string(), value.clone());
            }
        }
    }
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    // /all must be registered before /:key so the literal wins.
    registry.register(
        Method::GET,
        "/api/settings/all",
        Category::PrototypePollution,
        "dump every setting",
        handler(all),
    )?;
    registry.register(
        Method::GET,
        "/api/settings/:key",
        Category::PrototypePollution,
        "read one setting",
        handler(get),
    )?;
    registry.register(
        Method::POST,
        "/api/settings/update",
        Category::PrototypePollution,
        "unfiltered deep merge of client JSON",
        handler(update),
    )?;
    registry.register(
        Method::POST,
        "/api/settings/reset",
        Category::PrototypePollution,
        "reset settings from the (possibly polluted) defaults",
        handler(reset),
    )?;
    Ok(())
}

async fn all(_ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    Ok(Reply::ok_json(collab.settings.all()))
}

async fn get(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let key = ctx
        .param("key")
        .ok_or_else(|| Failure::handler("missing key"))?;
    match collab.settings.get(key) {
        Some(value) => Ok(Reply::ok_json(json!({key: value}))),
        None => Ok(Reply::json(
            StatusCode::NOT_FOUND,
            json!({"error": "Setting not found"}),
        )),
    }
}

async fn update(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let body = ctx.json_body()?;
    let Value::Object(update) = body else {
        return Ok(Reply::json(
            StatusCode::BAD_REQUEST,
            json!({"error": "expected a settings object"}),
        ));
    };
    Ok(Reply::ok_json(collab.settings.update(update)))
}

async fn reset(_ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    Ok(Reply::ok_json(collab.settings.reset()))
}
