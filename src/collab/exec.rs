//! Command executor collaborator.
//!
//! # Responsibilities
//! - Run shell commands for the handlers that intentionally shell out
//! - Capture stdout/stderr/exit status as plain strings
//!
//! # Design Decisions
//! - Trait object so tests inject a recording executor
//! - The production impl passes the string to `sh -c` unmodified; the
//!   absence of any sanitization is the demonstrated behavior

use async_trait::async_trait;

/// Captured output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

/// Abstraction over "run this string as a command".
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn run(&self, command: &str) -> std::io::Result<CommandOutput>;
}

/// Executor that shells out via `sh -c`.
pub struct ShellExecutor;

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn run(&self, command: &str) -> std::io::Result<CommandOutput> {
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code().unwrap_or(-1),
        })
    }
}
