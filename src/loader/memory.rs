//! In-memory loader with fetch accounting
//!
//! Files are keyed by their normalized name (e.g., `styles/_vars.scss`),
//! which is also their located address. Every call yields once to the
//! scheduler so the resolver sees real suspension points.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::{join_normalized, Metadata, ModuleLoader};
use crate::error::{Result, SasslineError};

/// Thread-safe in-memory [`ModuleLoader`]
#[derive(Clone, Default)]
pub struct MemoryLoader {
    files: Arc<DashMap<String, String>>,
    /// Extra names that locate to another file's address
    aliases: Arc<DashMap<String, String>>,
    /// address → number of fetches
    fetches: Arc<Mutex<FxHashMap<String, usize>>>,
    /// Appended to every located address (exercises suffix stripping)
    plugin_suffix: Option<Arc<str>>,
    /// Extra yields inside each fetch
    fetch_delay_ticks: u32,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a file
    pub fn with_file(self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }

    /// Builder: make `name` locate to `target`'s address
    pub fn with_alias(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(name.into(), target.into());
        self
    }

    /// Builder: append a loader plugin suffix (e.g. `!scss`) to located addresses
    pub fn with_plugin_suffix(mut self, suffix: &str) -> Self {
        self.plugin_suffix = Some(suffix.into());
        self
    }

    /// Builder: yield `ticks` extra times inside every fetch
    pub fn with_fetch_delay(mut self, ticks: u32) -> Self {
        self.fetch_delay_ticks = ticks;
        self
    }

    /// Add or replace a file
    pub fn insert(&self, name: impl Into<String>, content: impl Into<String>) {
        self.files.insert(name.into(), content.into());
    }

    /// Number of fetches issued for an address
    pub fn fetch_count(&self, address: &str) -> usize {
        self.fetches.lock().get(address).copied().unwrap_or(0)
    }

    /// Total fetches across all addresses
    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().values().sum()
    }
}

#[async_trait]
impl ModuleLoader for MemoryLoader {
    async fn normalize(&self, specifier: &str, base: &str) -> Result<String> {
        tokio::task::yield_now().await;
        Ok(join_normalized(base, specifier))
    }

    async fn locate(&self, name: &str, _metadata: &Metadata) -> Result<String> {
        tokio::task::yield_now().await;
        let target = self
            .aliases
            .get(name)
            .map(|t| t.value().clone())
            .unwrap_or_else(|| name.to_string());

        if !self.files.contains_key(&target) {
            return Err(SasslineError::LocateFailed {
                name: name.to_string(),
                reason: "no such file in memory loader".to_string(),
            });
        }

        Ok(match &self.plugin_suffix {
            Some(suffix) => format!("{}{}", target, suffix),
            None => target,
        })
    }

    async fn fetch(&self, _name: &str, address: &str, _metadata: &Metadata) -> Result<String> {
        *self.fetches.lock().entry(address.to_string()).or_insert(0) += 1;

        for _ in 0..=self.fetch_delay_ticks {
            tokio::task::yield_now().await;
        }

        self.files
            .get(address)
            .map(|f| f.value().clone())
            .ok_or_else(|| SasslineError::FetchFailed {
                address: address.to_string(),
                reason: "no such file in memory loader".to_string(),
            })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
