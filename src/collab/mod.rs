//! Collaborator subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     AppConfig
//!     → Collaborators::new (stores, SQLite pool + schema, executor, parser)
//!     → shared via Arc with every handler invocation
//!
//! Per request:
//!     handler(ctx, Arc<Collaborators>) → reads/writes its own store only
//! ```
//!
//! # Design Decisions
//! - Every mutable store is owned by its handler module and injected here,
//!   never reached through ambient globals
//! - The executor is a trait object so tests swap in a recording mock
//! - One SQLite connection shared by the pool: the in-memory database must
//!   be the same for every request

pub mod exec;
pub mod xml;

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::handlers::auth::UserStore;
use crate::handlers::comments::CommentBoard;
use crate::handlers::invoice::InvoiceStore;
use crate::handlers::settings::SettingsStore;
use crate::handlers::template::TemplateStore;

pub use exec::{CommandExecutor, CommandOutput, ShellExecutor};
pub use xml::{XmlError, XmlParser};

/// Everything a handler may touch besides its request context.
pub struct Collaborators {
    pub invoices: InvoiceStore,
    pub users: UserStore,
    pub settings: SettingsStore,
    pub templates: TemplateStore,
    pub comments: CommentBoard,
    pub sql: SqlitePool,
    pub files_root: PathBuf,
    pub executor: Arc<dyn CommandExecutor>,
    pub xml: XmlParser,
    pub token_secret: String,
    pub token_ttl_secs: u64,
}

impl Collaborators {
    /// Build the collaborator bag: connect SQLite, create the demo schema,
    /// seed the default (weakly stored) user.
    pub async fn new(config: &AppConfig) -> Result<Self, sqlx::Error> {
        let sql = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&config.database.url)
            .await?;
        create_schema(&sql).await?;

        Ok(Self {
            invoices: InvoiceStore::new(),
            users: UserStore::with_default_user(),
            settings: SettingsStore::new(),
            templates: TemplateStore::new(),
            comments: CommentBoard::new(),
            sql,
            files_root: PathBuf::from(&config.files.root),
            executor: Arc::new(ShellExecutor),
            xml: XmlParser::new(),
            token_secret: config.auth.token_secret.clone(),
            token_ttl_secs: config.auth.token_ttl_secs,
        })
    }

    /// Swap the command executor. Used by tests to observe invocations
    /// instead of reaching a real shell.
    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Point the file demos at a different root.
    pub fn with_files_root(mut self, root: PathBuf) -> Self {
        self.files_root = root;
        self
    }
}

async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            credit_limit REAL NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
