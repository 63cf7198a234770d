//! Kernel bridge backed by a helper command.
//!
//! Each call spawns the configured command with the snippet on stdin and
//! collects stdout. The default command is
//! `jupyter run --existing {kernel} /dev/stdin`, where `{kernel}` is
//! replaced by the bound kernel reference (a connection file name or path).

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{KernelBridge, KernelError};
use crate::config::schema::KernelConfig;

/// Placeholder substituted with the kernel reference in command arguments.
pub const KERNEL_PLACEHOLDER: &str = "{kernel}";

/// Kernel bridge that shells out to a helper for every call.
#[derive(Debug, Clone)]
pub struct ProcessKernel {
    command: Vec<String>,
    snapshot_snippet: String,
    timeout: Duration,
    reference: String,
}

impl ProcessKernel {
    /// Creates a bridge bound to `reference` (may be empty).
    pub fn new(
        command: Vec<String>,
        snapshot_snippet: impl Into<String>,
        timeout: Duration,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            command,
            snapshot_snippet: snapshot_snippet.into(),
            timeout,
            reference: reference.into(),
        }
    }

    /// Builds a bridge from the `[kernel]` config section.
    pub fn from_config(config: &KernelConfig, reference: impl Into<String>) -> Self {
        let timeout = humantime::parse_duration(&config.timeout).unwrap_or_else(|e| {
            tracing::warn!(
                value = %config.timeout,
                error = %e,
                "invalid kernel timeout, using 10s"
            );
            Duration::from_secs(10)
        });
        Self::new(
            config.command.clone(),
            config.snapshot_snippet.clone(),
            timeout,
            reference,
        )
    }

    /// Command line for the current reference, placeholders substituted.
    pub fn command_line(&self) -> Vec<String> {
        self.command
            .iter()
            .map(|arg| arg.replace(KERNEL_PLACEHOLDER, &self.reference))
            .collect()
    }

    async fn execute(&self, snippet: &str) -> Result<String, KernelError> {
        if self.reference.is_empty() {
            return Err(KernelError::NoKernel);
        }
        let argv = self.command_line();
        let Some((program, args)) = argv.split_first() else {
            return Err(KernelError::Failed {
                status: "not run".to_string(),
                stderr: "kernel command is empty".to_string(),
            });
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| KernelError::Spawn {
                program: program.clone(),
                source,
            })?;

        let mut stdin = child.stdin.take();
        let feed = async move {
            if let Some(stdin) = stdin.as_mut() {
                match stdin.write_all(snippet.as_bytes()).await {
                    Ok(()) => {}
                    // The helper may exit without reading its input.
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                    Err(e) => return Err(e),
                }
            }
            drop(stdin);
            Ok(())
        };

        let run = async { tokio::join!(feed, child.wait_with_output()) };
        let (fed, output) = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| KernelError::Timeout(self.timeout))?;
        fed?;
        let output = output?;

        if !output.status.success() {
            return Err(KernelError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl KernelBridge for ProcessKernel {
    async fn run(&mut self, snippet: &str) -> Result<String, KernelError> {
        self.execute(snippet).await
    }

    async fn snapshot_variables(&mut self) -> Result<String, KernelError> {
        let snippet = self.snapshot_snippet.clone();
        self.execute(&snippet).await
    }

    async fn switch_to(&mut self, reference: &str) -> Result<(), KernelError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(KernelError::NoKernel);
        }
        tracing::info!(from = %self.reference, to = %reference, "switching kernel");
        self.reference = reference.to_string();
        Ok(())
    }

    fn reference(&self) -> &str {
        &self.reference
    }
}
