//! Shared helpers for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::net::TcpListener;

use invoice_lab::collab::{Collaborators, CommandExecutor, CommandOutput};
use invoice_lab::config::AppConfig;
use invoice_lab::lifecycle::Shutdown;
use invoice_lab::HttpServer;

/// Executor that records commands instead of reaching a shell. Replies with
/// `ran:<command>` so tests can assert substitution.
pub struct RecordingExecutor {
    calls: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn run(&self, command: &str) -> std::io::Result<CommandOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.to_string());
        }
        Ok(CommandOutput {
            stdout: format!("ran:{command}"),
            stderr: String::new(),
            status: 0,
        })
    }
}

/// A lab server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Start the full demo server around the given collaborators.
pub async fn start_server(config: &AppConfig, collab: Collaborators) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = HttpServer::new(config, Arc::new(collab)).unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestServer { addr, shutdown }
}
