// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Sassline Error Types with Error Codes
//!
//! Error code ranges:
//! - SASS-000-009: Configuration errors
//! - SASS-010-019: Import syntax / specifier errors
//! - SASS-020-029: Loader errors (normalize, locate, fetch)
//! - SASS-030-039: Resolution errors (cycles, shared failures)
//! - SASS-040-049: Compiler errors
//! - SASS-050-059: Artifact persistence errors
//! - SASS-060-069: CLI / IO errors
//!
//! Errors are `Clone`: one failed resolution is observed by every load
//! attached to the same shared future.

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SasslineError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Clone, Diagnostic, PartialEq, Eq)]
pub enum SasslineError {
    // ═══════════════════════════════════════════
    // CONFIG ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[SASS-001] Failed to load config: {reason}")]
    #[diagnostic(
        code(sassline::config_error),
        help("Check sassline.toml syntax and field names")
    )]
    ConfigError { reason: String },

    #[error("[SASS-002] Invalid value for '{var}': '{value}' (expected true/false/1/0)")]
    #[diagnostic(code(sassline::invalid_env_flag))]
    InvalidEnvFlag { var: String, value: String },

    // ═══════════════════════════════════════════
    // IMPORT ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[SASS-010] Empty import specifier in '{address}'")]
    #[diagnostic(code(sassline::empty_specifier))]
    EmptySpecifier { address: String },

    // ═══════════════════════════════════════════
    // LOADER ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[SASS-020] Cannot normalize '{specifier}' against '{base}': {reason}")]
    #[diagnostic(code(sassline::normalize_failed))]
    NormalizeFailed {
        specifier: String,
        base: String,
        reason: String,
    },

    #[error("[SASS-021] Cannot locate module '{name}': {reason}")]
    #[diagnostic(
        code(sassline::locate_failed),
        help("Partials are looked up as '_name.scss' next to the importing file")
    )]
    LocateFailed { name: String, reason: String },

    #[error("[SASS-022] Failed to fetch '{address}': {reason}")]
    #[diagnostic(code(sassline::fetch_failed))]
    FetchFailed { address: String, reason: String },

    // ═══════════════════════════════════════════
    // RESOLUTION ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[SASS-030] Circular import: {chain}")]
    #[diagnostic(
        code(sassline::circular_import),
        help("Break the cycle by moving shared rules into a separate partial")
    )]
    CircularImport { chain: String },

    // ═══════════════════════════════════════════
    // COMPILER ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[SASS-040] Failed to start compiler '{command}': {reason}")]
    #[diagnostic(
        code(sassline::compiler_unavailable),
        help("Install the compiler or set SASSLINE_COMPILER / --compiler")
    )]
    CompilerUnavailable { command: String, reason: String },

    #[error("[SASS-041] Compiler exited with status {status}: {message}")]
    #[diagnostic(
        code(sassline::compile_failed),
        help("The compiler rejected the batch; fix the reported stylesheet error")
    )]
    CompileFailed { status: i32, message: String },

    // ═══════════════════════════════════════════
    // ARTIFACT ERRORS (050-059)
    // ═══════════════════════════════════════════
    #[error("[SASS-050] Failed to write artifact '{path}': {reason}")]
    #[diagnostic(code(sassline::artifact_write_failed))]
    ArtifactWriteFailed { path: String, reason: String },

    // ═══════════════════════════════════════════
    // CLI / IO ERRORS (060-069)
    // ═══════════════════════════════════════════
    #[error("[SASS-060] No entry stylesheets found in: {paths}")]
    #[diagnostic(code(sassline::no_entries))]
    NoEntries { paths: String },

    #[error("[SASS-061] IO error on '{path}': {reason}")]
    #[diagnostic(code(sassline::io_error))]
    Io { path: String, reason: String },
}

impl SasslineError {
    /// Get the error code (e.g., "SASS-020")
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError { .. } => "SASS-001",
            Self::InvalidEnvFlag { .. } => "SASS-002",
            Self::EmptySpecifier { .. } => "SASS-010",
            Self::NormalizeFailed { .. } => "SASS-020",
            Self::LocateFailed { .. } => "SASS-021",
            Self::FetchFailed { .. } => "SASS-022",
            Self::CircularImport { .. } => "SASS-030",
            Self::CompilerUnavailable { .. } => "SASS-040",
            Self::CompileFailed { .. } => "SASS-041",
            Self::ArtifactWriteFailed { .. } => "SASS-050",
            Self::NoEntries { .. } => "SASS-060",
            Self::Io { .. } => "SASS-061",
        }
    }

    /// Whether the error came from a loader collaborator (taxonomy (a))
    pub fn is_loader_error(&self) -> bool {
        matches!(
            self,
            Self::NormalizeFailed { .. } | Self::LocateFailed { .. } | Self::FetchFailed { .. }
        )
    }

    pub(crate) fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

impl FixSuggestion for SasslineError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            Self::ConfigError { .. } => Some("Check sassline.toml syntax and field names"),
            Self::InvalidEnvFlag { .. } => Some("Use true/false or 1/0 for environment flags"),
            Self::EmptySpecifier { .. } => Some("Remove the empty @import \"\" directive"),
            Self::NormalizeFailed { .. } => Some("Check the import path is relative to the file"),
            Self::LocateFailed { .. } => {
                Some("Partials are looked up as '_name.scss' next to the importing file")
            }
            Self::FetchFailed { .. } => Some("Check the file exists and is readable UTF-8"),
            Self::CircularImport { .. } => {
                Some("Break the cycle by moving shared rules into a separate partial")
            }
            Self::CompilerUnavailable { .. } => {
                Some("Install the compiler or set SASSLINE_COMPILER / --compiler")
            }
            Self::CompileFailed { .. } => {
                Some("The compiler rejected the batch; fix the reported stylesheet error")
            }
            Self::ArtifactWriteFailed { .. } => Some("Check the artifact directory is writable"),
            Self::NoEntries { .. } => {
                Some("Pass .scss files or directories containing non-partial .scss files")
            }
            Self::Io { .. } => Some("Check file path and permissions"),
        }
    }
}
