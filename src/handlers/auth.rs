//! Authentication endpoints (weak-auth demo).
//!
//! Tokens are HMAC-SHA256 signed with a static, config-default secret and
//! the seeded `test` user stores a base64-encoded password instead of a
//! hash. Both weaknesses are the demonstrated behavior.

use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{Method, StatusCode};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::HashMap;

use crate::collab::Collaborators;
use crate::http::context::RequestContext;
use crate::http::outcome::{Failure, HandlerResult, Reply};
use crate::routing::{handler, Category, Registry, RegistryError};

type HmacSha256 = Hmac<Sha256>;

/// A stored account. `password` is either a bcrypt hash (registered users)
/// or a bare base64 encoding (legacy seeded accounts).
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: String,
}

/// In-memory user accounts keyed by username.
#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the default demo account, password base64-encoded
    /// rather than hashed.
    pub fn with_default_user() -> Self {
        let store = Self::new();
        store.insert(UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            username: "test".to_string(),
            password: STANDARD.encode("test123"),
            role: "admin".to_string(),
        });
        store
    }

    pub fn insert(&self, user: UserRecord) {
        if let Ok(mut users) = self.users.write() {
            users.insert(user.username.clone(), user);
        }
    }

    pub fn find(&self, username: &str) -> Option<UserRecord> {
        self.users.read().ok()?.get(username).cloned()
    }
}

/// Claims carried in a token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub username: String,
    pub role: String,
    pub exp: u64,
}

pub fn register(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register(
        Method::POST,
        "/api/auth/register",
        Category::Auth,
        "create an account",
        handler(register_user),
    )?;
    registry.register(
        Method::POST,
        "/api/auth/login",
        Category::Auth,
        "issue a token signed with the static secret",
        handler(login),
    )?;
    registry.register(
        Method::GET,
        "/api/auth/me",
        Category::Auth,
        "verify a bearer token",
        handler(me),
    )?;
    Ok(())
}

fn credentials(ctx: &RequestContext) -> Result<(String, String), Failure> {
    let body = ctx.json_body()?;
    let username = body.get("username").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);
    match (username, password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => {
            Ok((u.to_string(), p.to_string()))
        }
        _ => Err(Failure::handler("Username and password are required")),
    }
}

async fn register_user(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let (username, password) = credentials(&ctx)?;

    if collab.users.find(&username).is_some() {
        return Err(Failure::handler("Username already exists"));
    }

    let hashed = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
        .map_err(|e| Failure::handler(format!("failed to hash password: {e}")))?;
    collab.users.insert(UserRecord {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        password: hashed,
        role: "user".to_string(),
    });

    Ok(Reply::ok_json(json!({"message": "User registered successfully"})))
}

async fn login(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let (username, password) = credentials(&ctx)?;

    let user = collab
        .users
        .find(&username)
        .ok_or_else(|| Failure::handler("Invalid credentials"))?;

    let valid = if user.password.starts_with("$2") {
        bcrypt::verify(&password, &user.password).unwrap_or(false)
    } else {
        // Legacy accounts: stored value is just base64 of the password.
        STANDARD.encode(&password) == user.password
    };
    if !valid {
        return Err(Failure::handler("Invalid credentials"));
    }

    let claims = Claims {
        id: user.id.clone(),
        username: user.username.clone(),
        role: user.role.clone(),
        exp: unix_now() + collab.token_ttl_secs,
    };
    let token = sign_token(&claims, &collab.token_secret)?;

    Ok(Reply::ok_json(json!({
        "token": token,
        "user": {
            "id": user.id,
            "username": user.username,
            "role": user.role,
        },
    })))
}

async fn me(ctx: RequestContext, collab: Arc<Collaborators>) -> HandlerResult {
    let token = ctx
        .header("authorization")
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| Failure::handler("No token provided"))?;

    let claims = verify_token(token, &collab.token_secret)?;
    Ok(Reply::json(
        StatusCode::OK,
        json!({"user": {
            "id": claims.id,
            "username": claims.username,
            "role": claims.role,
        }}),
    ))
}

/// Sign claims as `header.payload.signature`, all base64url.
pub fn sign_token(claims: &Claims, secret: &str) -> Result<String, Failure> {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(claims)
            .map_err(|e| Failure::handler(format!("failed to encode claims: {e}")))?,
    );
    let signature = signature_for(&format!("{header}.{payload}"), secret)?;
    Ok(format!("{header}.{payload}.{signature}"))
}

/// Verify a token's signature and expiry and return its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Failure> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Failure::handler("Invalid token"));
    };

    let expected = signature_for(&format!("{header}.{payload}"), secret)?;
    if expected != signature {
        return Err(Failure::handler("Invalid token"));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| Failure::handler("Invalid token"))?;
    let claims: Claims =
        serde_json::from_slice(&bytes).map_err(|_| Failure::handler("Invalid token"))?;

    if claims.exp < unix_now() {
        return Err(Failure::handler("Token expired"));
    }
    Ok(claims)
}

fn signature_for(signing_input: &str, secret: &str) -> Result<String, Failure> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| Failure::handler("invalid signing key"))?;
    mac.update(signing_input.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let claims = Claims {
            id: "1".into(),
            username: "test".into(),
            role: "admin".into(),
            exp: unix_now() + 60,
        };
        let token = sign_token(&claims, "secret").unwrap();
        let verified = verify_token(&token, "secret").unwrap();
        assert_eq!(verified.username, "test");
        assert_eq!(verified.role, "admin");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims {
            id: "1".into(),
            username: "test".into(),
            role: "admin".into(),
            exp: unix_now() + 60,
        };
        let token = sign_token(&claims, "secret").unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            id: "1".into(),
            username: "test".into(),
            role: "admin".into(),
            exp: 1,
        };
        let token = sign_token(&claims, "secret").unwrap();
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn default_user_password_is_only_encoded() {
        let store = UserStore::with_default_user();
        let user = store.find("test").unwrap();
        assert_eq!(user.password, STANDARD.encode("test123"));
    }
}
