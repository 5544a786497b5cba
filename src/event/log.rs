//! EventLog - append-only pipeline audit trail
//!
//! - Event: envelope with id + timestamp + kind
//! - EventKind: load / import / batch / compile / artifact levels
//! - EventLog: thread-safe, append-only log

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock; // 2-3x faster than std::sync::RwLock

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single event in the pipeline log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since pipeline creation (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub kind: EventKind,
}

/// All possible event types
///
/// Uses Arc<str> for addresses and keys so emitting never deep-copies them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // LOAD LEVEL
    // ═══════════════════════════════════════════
    /// A top-level load joined a batch
    LoadSubmitted {
        address: Arc<str>,
        epoch: u64,
        /// Join-count after this load joined
        outstanding: usize,
    },
    /// First load answered empty without entering resolution
    BootstrapDeferred { address: Arc<str> },
    /// A load's resolution failed; it left the batch without contributing
    LoadFailed { address: Arc<str>, error: String },

    // ═══════════════════════════════════════════
    // IMPORT LEVEL
    // ═══════════════════════════════════════════
    /// A location was fetched (at most once per location)
    ImportFetched {
        key: Arc<str>,
        location: Arc<str>,
        bytes: usize,
    },
    /// An import attached to an existing resolution; its placeholder was cleared
    ImportShared {
        key: Arc<str>,
        /// Set when the hit was on the location level rather than the key
        location: Option<Arc<str>>,
    },

    // ═══════════════════════════════════════════
    // BATCH LEVEL
    // ═══════════════════════════════════════════
    /// The last member of a batch left; accumulated source is handed to the compiler
    BatchClosed {
        epoch: u64,
        members: usize,
        closer: Arc<str>,
        source_len: usize,
        /// xxh3 of the accumulated source
        source_hash: String,
    },
    /// First batch in a non-authoritative environment: compile skipped
    FirstCompileSkipped { epoch: u64 },

    // ═══════════════════════════════════════════
    // COMPILE LEVEL
    // ═══════════════════════════════════════════
    CompileSucceeded {
        address: Arc<str>,
        output_len: usize,
        duration_ms: u64,
    },
    CompileFailed {
        address: Arc<str>,
        status: i32,
        message: String,
        /// The source the compiler rejected
        source: String,
    },

    // ═══════════════════════════════════════════
    // ARTIFACT LEVEL
    // ═══════════════════════════════════════════
    ArtifactWritten { path: String, bytes: usize },
    ArtifactWriteFailed { path: String, error: String },
}

impl EventKind {
    /// Extract the load address if the event is load- or compile-related
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::LoadSubmitted { address, .. }
            | Self::BootstrapDeferred { address }
            | Self::LoadFailed { address, .. }
            | Self::CompileSucceeded { address, .. }
            | Self::CompileFailed { address, .. } => Some(address),
            Self::BatchClosed { closer, .. } => Some(closer),
            Self::ImportFetched { .. }
            | Self::ImportShared { .. }
            | Self::FirstCompileSkipped { .. }
            | Self::ArtifactWritten { .. }
            | Self::ArtifactWriteFailed { .. } => None,
        }
    }

    /// Check if this is a batch-level event
    pub fn is_batch_event(&self) -> bool {
        matches!(
            self,
            Self::BatchClosed { .. } | Self::FirstCompileSkipped { .. }
        )
    }
}

/// Thread-safe, append-only event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    /// Create a new event log (call at pipeline creation)
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        self.events.write().push(event); // parking_lot: no unwrap needed
        id
    }

    /// Get all events (cloned - use `with_events` for zero-copy access)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Zero-copy access to events via callback
    ///
    /// Holds read lock for duration of callback - keep it short.
    pub fn with_events<T>(&self, f: impl FnOnce(&[Event]) -> T) -> T {
        f(&self.events.read())
    }

    /// Filter events by load address (zero-copy filtering)
    pub fn filter_address(&self, address: &str) -> Vec<Event> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| e.kind.address() == Some(address))
                .cloned()
                .collect()
        })
    }

    /// Count events matching a predicate (no allocation)
    pub fn count(&self, predicate: impl Fn(&EventKind) -> bool) -> usize {
        self.with_events(|events| events.iter().filter(|e| predicate(&e.kind)).count())
    }

    /// Batch-level events only
    pub fn batch_events(&self) -> Vec<Event> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| e.kind.is_batch_event())
                .cloned()
                .collect()
        })
    }

    /// Serialize to JSON for persistence/debugging
    pub fn to_json(&self) -> Value {
        self.with_events(|events| serde_json::to_value(events).unwrap_or(Value::Null))
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
