//! MockCompiler - records compile calls, echoes the source by default

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CompileOutcome, Compiler};
use crate::error::Result;

/// In-memory [`Compiler`] for tests
///
/// Succeeds with the source itself (optionally prefixed) unless a failure
/// has been set. Clones share their call record.
#[derive(Debug, Clone, Default)]
pub struct MockCompiler {
    calls: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<(i32, String)>>>,
    prefix: Arc<str>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: every compile fails with `status`
    pub fn failing(self, status: i32, message: impl Into<String>) -> Self {
        self.set_failure(Some((status, message.into())));
        self
    }

    /// Builder: prepend `prefix` to the echoed output
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Switch failure mode on or off between compiles
    pub fn set_failure(&self, failure: Option<(i32, String)>) {
        *self.failure.lock() = failure;
    }

    /// Every source passed to `compile`, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn last_call(&self) -> Option<String> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl Compiler for MockCompiler {
    async fn compile(&self, source: &str) -> Result<CompileOutcome> {
        self.calls.lock().push(source.to_string());
        tokio::task::yield_now().await;

        let failure = self.failure.lock().clone();
        Ok(match failure {
            Some((status, message)) => CompileOutcome::failure(status, message),
            None => CompileOutcome::success(format!("{}{}", self.prefix, source)),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
