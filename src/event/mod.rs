//! Event Module - audit trail of the import pipeline
//!
//! Key types:
//! - `Event`: Envelope with id + timestamp + kind
//! - `EventKind`: load / import / batch / compile / artifact events
//! - `EventLog`: Thread-safe, append-only log (the observability sink)
//! - `EventEmitter`: Trait for dependency injection
//! - `NoopEmitter`: Zero-cost no-op
//! - `TraceWriter`: NDJSON file writer for debugging

mod emitter;
mod log;
mod trace;

pub use emitter::{EventEmitter, NoopEmitter};
pub use log::{Event, EventKind, EventLog};
pub use trace::{calculate_source_hash, TraceWriter};
