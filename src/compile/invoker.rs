//! CompileInvoker - send a closed batch to the compiler, route the result
//!
//! Failures never reach the caller as errors: a failed compile is logged
//! with the offending source and yields no text. In the authoritative,
//! non-packaging environment successful output is also written to the
//! artifact path; a write failure is logged and the text still returned.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, instrument, warn};

use super::{CompileOutcome, Compiler};
use crate::config::{ArtifactSettings, Environment};
use crate::error::{Result, SasslineError};
use crate::event::{EventEmitter, EventKind};

pub struct CompileInvoker {
    compiler: Arc<dyn Compiler>,
    environment: Environment,
    artifact: ArtifactSettings,
    emitter: Arc<dyn EventEmitter>,
}

impl CompileInvoker {
    pub fn new(
        compiler: Arc<dyn Compiler>,
        environment: Environment,
        artifact: ArtifactSettings,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            compiler,
            environment,
            artifact,
            emitter,
        }
    }

    /// Compile `source` on behalf of the batch closer at `address`.
    ///
    /// Returns the compiled text, or `None` when the compile failed.
    #[instrument(skip(self, source), fields(compiler = %self.compiler.name(), len = source.len()))]
    pub async fn compile(&self, source: &str, address: &str) -> Option<String> {
        let start = Instant::now();
        let outcome = self
            .compiler
            .compile(source)
            .await
            .unwrap_or_else(|e| CompileOutcome::failure(1, e.to_string()));
        let duration_ms = start.elapsed().as_millis() as u64;

        if outcome.is_failure() {
            error!(
                address,
                status = outcome.status,
                message = %outcome.message,
                source,
                "compile failed"
            );
            self.emitter.emit(EventKind::CompileFailed {
                address: address.into(),
                status: outcome.status,
                message: outcome.message,
                source: source.to_string(),
            });
            return None;
        }

        info!(address, output_len = outcome.text.len(), duration_ms, "compiled batch");
        self.emitter.emit(EventKind::CompileSucceeded {
            address: address.into(),
            output_len: outcome.text.len(),
            duration_ms,
        });

        if self.environment.persists_artifact() {
            match self.persist(&outcome.text).await {
                Ok(path) => {
                    self.emitter.emit(EventKind::ArtifactWritten {
                        path: path.display().to_string(),
                        bytes: outcome.text.len(),
                    });
                }
                Err(e) => {
                    warn!(error = %e, "artifact not written");
                    self.emitter.emit(EventKind::ArtifactWriteFailed {
                        path: self.artifact.path().display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Some(outcome.text)
    }

    /// Write the artifact, creating its directory if absent
    async fn persist(&self, text: &str) -> Result<PathBuf> {
        let path = self.artifact.path();
        let failed = |e: std::io::Error| SasslineError::ArtifactWriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(failed)?;
        }
        tokio::fs::write(&path, text).await.map_err(failed)?;

        Ok(path)
    }
}
