//! Load - one top-level compilation request
//!
//! The source lives in a [`SourceBuffer`] shared by every resolution the
//! load spawns: directives become canonical-key placeholders while their
//! import is pending, then the placeholder is swapped for the inlined text
//! (first requester) or cleared (every later requester).
//!
//! Placeholders are `NUL key NUL`. Keys of nested bases end with the keys of
//! their parents (`s/components/|./_a.scss` vs `s/|./_a.scss`), so a bare key
//! would match inside a longer one.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::import::CanonicalKey;
use crate::loader::Metadata;

/// Delimits a pending placeholder; never part of a key or stylesheet text
const PLACEHOLDER_MARK: char = '\u{0}';

/// Mutable, shared source text of a load
///
/// Every operation takes the lock once and never across an await, so each
/// substitution is atomic with respect to interleaved resolutions.
#[derive(Debug, Clone, Default)]
pub struct SourceBuffer(Arc<Mutex<String>>);

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Arc::new(Mutex::new(text.into())))
    }

    /// Copy of the current text
    pub fn snapshot(&self) -> String {
        self.0.lock().clone()
    }

    /// Replace the whole text
    pub fn set(&self, text: impl Into<String>) {
        *self.0.lock() = text.into();
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Placeholder text standing in for `key` until its import resolves
    pub fn placeholder(key: &CanonicalKey) -> String {
        format!("{m}{}{m}", key, m = PLACEHOLDER_MARK)
    }

    /// Whether a placeholder for `key` is still pending
    pub fn has_placeholder(&self, key: &CanonicalKey) -> bool {
        self.0.lock().contains(&Self::placeholder(key))
    }

    /// Replace the first placeholder for `key` with `text`.
    ///
    /// Returns false when no placeholder is left (already substituted).
    pub fn substitute(&self, key: &CanonicalKey, text: &str) -> bool {
        let token = Self::placeholder(key);
        let mut source = self.0.lock();
        match source.find(&token) {
            Some(start) => {
                source.replace_range(start..start + token.len(), text);
                true
            }
            None => false,
        }
    }
}

/// One unit of work submitted by the surrounding module system
#[derive(Debug, Clone)]
pub struct Load {
    address: Arc<str>,
    source: SourceBuffer,
    metadata: Arc<Metadata>,
}

impl Load {
    pub fn new(address: impl Into<Arc<str>>, source: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            source: SourceBuffer::new(source),
            metadata: Arc::new(Metadata::new()),
        }
    }

    /// Builder: attach loader metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Arc::new(metadata);
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn address_arc(&self) -> Arc<str> {
        Arc::clone(&self.address)
    }

    pub fn source(&self) -> &SourceBuffer {
        &self.source
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}
