//! Sassline - stylesheet import inlining, batching and compilation
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  import/    Directive scanning, specifier normalization      │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  resolve/   Recursive inliner + resolution cache (Load)      │
//! │  batch/     Epoch/join-count batching of top-level loads     │
//! │  compile/   Compiler collaborator, result routing, artifact  │
//! │  pipeline   translate() entry point                          │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  loader/    Module loader collaborators (fs, memory)         │
//! │  event/     Event log, NDJSON traces                         │
//! │  util/      Constants                                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`import`] | `@import` tokenizer, canonical keys, base paths |
//! | [`resolve`] | At-most-one fetch per location, in-place substitution |
//! | [`batch`] | Merge overlapping loads into one compile |
//! | [`compile`] | `Compiler` trait, command + mock compilers, artifact |
//! | [`pipeline`] | [`Pipeline::translate`] |
//! | [`loader`] | `ModuleLoader` trait, `FsLoader`, `MemoryLoader` |
//! | [`event`] | Audit trail for loads, imports, batches, compiles |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - directives and keys
// ═══════════════════════════════════════════════════════════════
pub mod import;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - resolution, batching, compilation
// ═══════════════════════════════════════════════════════════════
pub mod batch;
pub mod compile;
pub mod pipeline;
pub mod resolve;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - loaders, events
// ═══════════════════════════════════════════════════════════════
pub mod event;
pub mod loader;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{FixSuggestion, Result, SasslineError};

// Config types
pub use config::{Environment, PipelineConfig};

// Entry point
pub use pipeline::Pipeline;
pub use resolve::{Load, ResolutionCache};

// Collaborators
pub use compile::{CommandCompiler, CompileOutcome, Compiler, MockCompiler};
pub use loader::{FsLoader, MemoryLoader, Metadata, ModuleLoader};

// Event types
pub use event::{Event, EventKind, EventLog, TraceWriter};

// Import helpers
pub use import::{extract_imports, normalize_specifier, CanonicalKey, ResolvedLocation};
