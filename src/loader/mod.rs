//! Loader Module - module-loading collaborators
//!
//! The pipeline never touches files or URLs directly. It asks a
//! [`ModuleLoader`] to normalize a specifier, locate the normalized name
//! and fetch the located address, exactly like a module system would.
//!
//! Implementations:
//! - [`FsLoader`]: local filesystem, `file:` addresses (CLI)
//! - [`MemoryLoader`]: in-memory files with fetch counters (tests)

mod fs;
mod memory;

pub use fs::FsLoader;
pub use memory::MemoryLoader;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// Free-form metadata attached to loads and loader calls
pub type Metadata = Map<String, Value>;

/// Module-loading primitives consumed by the resolver
///
/// All three calls are suspension points and may fail; failures abort the
/// import branch that issued them.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Resolve a (relative) specifier against the importing file's base path
    async fn normalize(&self, specifier: &str, base: &str) -> Result<String>;

    /// Turn a normalized name into an absolute address
    async fn locate(&self, name: &str, metadata: &Metadata) -> Result<String>;

    /// Read the raw text at an address
    async fn fetch(&self, name: &str, address: &str, metadata: &Metadata) -> Result<String>;

    /// Working directory stripped from `file:` addresses when deriving base paths
    fn working_dir(&self) -> Option<&str> {
        None
    }

    /// Loader name for logs (e.g., "fs", "memory")
    fn name(&self) -> &str;
}

/// Join a specifier onto a base directory and collapse `.` / `..` segments.
///
/// Only `./` and `../` specifiers are joined; anything else is taken as
/// already relative to the root (module-name semantics).
pub fn join_normalized(base: &str, specifier: &str) -> String {
    let joined = if specifier.starts_with("./") || specifier.starts_with("../") {
        format!("{}{}", base, specifier)
    } else {
        specifier.to_string()
    };

    let absolute = joined.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let path = segments.join("/");
    if absolute {
        format!("/{}", path)
    } else {
        path
    }
}
