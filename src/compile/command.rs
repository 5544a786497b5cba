//! Command compiler - spawn a configured command per compile
//!
//! Source goes to stdin, stdout is the compiled text, stderr the message
//! and the exit code the status. No timeout: a compile runs to completion.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{CompileOutcome, Compiler};
use crate::config::CompilerSettings;
use crate::error::{Result, SasslineError};

#[derive(Debug, Clone)]
pub struct CommandCompiler {
    command: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_settings(settings: &CompilerSettings) -> Self {
        Self::new(settings.command.clone(), settings.args.clone())
    }

    fn unavailable(&self, err: impl ToString) -> SasslineError {
        SasslineError::CompilerUnavailable {
            command: self.command.clone(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl Compiler for CommandCompiler {
    async fn compile(&self, source: &str) -> Result<CompileOutcome> {
        debug!(command = %self.command, args = ?self.args, len = source.len(), "spawning compiler");

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.unavailable(e))?;

        // Feed stdin concurrently so a large output cannot fill the pipe first
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.unavailable("stdin not captured"))?;
        let input = source.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.unavailable(e))?;

        // A compiler that exits without reading all input closes the pipe early
        if let Ok(Err(e)) = writer.await {
            debug!(error = %e, "compiler closed stdin early");
        }

        let status = output.status.code().unwrap_or(1);
        Ok(CompileOutcome {
            status,
            message: String::from_utf8_lossy(&output.stderr).into_owned(),
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn name(&self) -> &str {
        &self.command
    }
}
