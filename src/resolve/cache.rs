//! Resolution Cache - in-flight deduplication of import resolutions
//!
//! Two levels, both holding shared futures of the fully inlined text:
//! - canonical key (`base|file`) → resolution started for that key
//! - resolved location → fetch + inline of that location
//!
//! The entry API makes "look up, else insert" atomic, so two concurrent
//! requesters can never both start a resolution for the same entry.
//! Entries are never evicted: lifetime is the process.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::Result;
use crate::import::{CanonicalKey, ResolvedLocation};

/// Outcome of one resolution: the standalone inlined text of a file
pub type Resolution = Result<Arc<str>>;

/// Future shared by every requester of the same key or location
pub type SharedResolution = Shared<BoxFuture<'static, Resolution>>;

/// Result of claiming a cache entry
pub enum Claim {
    /// The caller inserted the entry and owns the resolution
    Started(SharedResolution),
    /// Someone else already started it
    Attached(SharedResolution),
}

impl Claim {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }

    pub fn into_shared(self) -> SharedResolution {
        match self {
            Self::Started(f) | Self::Attached(f) => f,
        }
    }
}

/// Process-wide cache of in-flight and completed resolutions
#[derive(Clone, Default)]
pub struct ResolutionCache {
    by_key: Arc<DashMap<CanonicalKey, SharedResolution>>,
    by_location: Arc<DashMap<ResolvedLocation, SharedResolution>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing resolution for `key`, or insert the one built by `start`.
    ///
    /// `start` only builds the future; nothing is polled under the shard lock.
    pub fn claim_key(
        &self,
        key: &CanonicalKey,
        start: impl FnOnce() -> BoxFuture<'static, Resolution>,
    ) -> Claim {
        claim(&self.by_key, key, start)
    }

    /// Same as [`claim_key`](Self::claim_key) at the location level
    pub fn claim_location(
        &self,
        location: &ResolvedLocation,
        start: impl FnOnce() -> BoxFuture<'static, Resolution>,
    ) -> Claim {
        claim(&self.by_location, location, start)
    }

    pub fn contains_key(&self, key: &CanonicalKey) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn contains_location(&self, location: &ResolvedLocation) -> bool {
        self.by_location.contains_key(location)
    }

    /// Settled result for a key, if its resolution already finished
    pub fn peek_key(&self, key: &CanonicalKey) -> Option<Resolution> {
        self.by_key.get(key).and_then(|f| f.peek().cloned())
    }

    /// Settled result for a location, if its resolution already finished
    pub fn peek_location(&self, location: &ResolvedLocation) -> Option<Resolution> {
        self.by_location.get(location).and_then(|f| f.peek().cloned())
    }

    pub fn key_count(&self) -> usize {
        self.by_key.len()
    }

    pub fn location_count(&self) -> usize {
        self.by_location.len()
    }
}

fn claim<K>(
    map: &DashMap<K, SharedResolution>,
    id: &K,
    start: impl FnOnce() -> BoxFuture<'static, Resolution>,
) -> Claim
where
    K: std::hash::Hash + Eq + Clone,
{
    match map.entry(id.clone()) {
        Entry::Occupied(e) => Claim::Attached(e.get().clone()),
        Entry::Vacant(e) => {
            let shared = start().shared();
            e.insert(shared.clone());
            Claim::Started(shared)
        }
    }
}
