//! Compile Module - external compiler collaborator and result routing
//!
//! - [`Compiler`]: the collaborator contract (`status > 0` is failure)
//! - [`CommandCompiler`]: runs a configured command, source on stdin
//! - [`MockCompiler`]: records calls, can be told to fail (tests)
//! - [`CompileInvoker`]: degrades failures to empty text, persists the artifact

mod command;
mod invoker;
mod mock;

pub use command::CommandCompiler;
pub use invoker::CompileInvoker;
pub use mock::MockCompiler;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the compiler reported for one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOutcome {
    /// Zero on success; any positive value is a failure
    pub status: i32,
    /// Diagnostic output (warnings on success, the error on failure)
    pub message: String,
    /// Compiled stylesheet
    pub text: String,
}

impl CompileOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            status: 0,
            message: String::new(),
            text: text.into(),
        }
    }

    pub fn failure(status: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            text: String::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status > 0
    }
}

/// External stylesheet compiler
///
/// `Err` means the compiler could not be run at all; the invoker treats it
/// like a failed outcome with status 1.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, source: &str) -> Result<CompileOutcome>;

    /// Compiler name for logs
    fn name(&self) -> &str;
}
