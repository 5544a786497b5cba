//! Filesystem loader - `file:` addresses rooted at a working directory
//!
//! Names are paths relative to the root (`styles/_vars.scss`); located
//! addresses are `file:<root>/<name>`. Paths are UTF-8 (`camino`) so
//! addresses and cache keys never go through lossy conversions.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use super::{join_normalized, Metadata, ModuleLoader};
use crate::error::{Result, SasslineError};

const FILE_SCHEME: &str = "file:";

/// Local filesystem [`ModuleLoader`]
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: Utf8PathBuf,
    root_str: String,
}

impl FsLoader {
    /// Create a loader rooted at `root` (usually the process working directory)
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        let root = root.into();
        let root_str = root.as_str().trim_end_matches('/').to_string();
        Self { root, root_str }
    }

    /// Create a loader rooted at the current working directory
    pub fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| SasslineError::io(".", e))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|p| SasslineError::Io {
            path: p.display().to_string(),
            reason: "working directory is not valid UTF-8".to_string(),
        })?;
        Ok(Self::new(cwd))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Address of a root-relative (or absolute) path
    pub fn address_of(&self, path: &Utf8Path) -> String {
        if path.is_absolute() {
            format!("{}{}", FILE_SCHEME, path)
        } else {
            format!("{}{}", FILE_SCHEME, self.root.join(path))
        }
    }

    /// Names are root-relative; a root-level base (`/`) yields `/name`
    fn path_of_name(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name.trim_start_matches('/'))
    }

    fn path_of(address: &str) -> &Utf8Path {
        Utf8Path::new(address.strip_prefix(FILE_SCHEME).unwrap_or(address))
    }
}

#[async_trait]
impl ModuleLoader for FsLoader {
    async fn normalize(&self, specifier: &str, base: &str) -> Result<String> {
        if specifier.is_empty() {
            return Err(SasslineError::NormalizeFailed {
                specifier: specifier.to_string(),
                base: base.to_string(),
                reason: "empty specifier".to_string(),
            });
        }
        Ok(join_normalized(base, specifier)
            .trim_start_matches('/')
            .to_string())
    }

    /// Locate a name, falling back from `_name.ext` to `name.ext`
    async fn locate(&self, name: &str, _metadata: &Metadata) -> Result<String> {
        let path = self.path_of_name(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(self.address_of(&path));
        }

        if let Some(file_name) = path.file_name() {
            if let Some(plain) = file_name.strip_prefix('_') {
                let fallback = path.with_file_name(plain);
                if tokio::fs::try_exists(&fallback).await.unwrap_or(false) {
                    debug!(name, located = %fallback, "located non-partial fallback");
                    return Ok(self.address_of(&fallback));
                }
            }
        }

        Err(SasslineError::LocateFailed {
            name: name.to_string(),
            reason: format!("{} does not exist", path),
        })
    }

    async fn fetch(&self, _name: &str, address: &str, _metadata: &Metadata) -> Result<String> {
        let path = Self::path_of(address);
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SasslineError::FetchFailed {
                address: address.to_string(),
                reason: e.to_string(),
            })
    }

    fn working_dir(&self) -> Option<&str> {
        Some(&self.root_str)
    }

    fn name(&self) -> &str {
        "fs"
    }
}
