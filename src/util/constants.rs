//! Centralized constants for the import pipeline
//!
//! Defaults for configuration and the textual conventions of the key format.

// ═══════════════════════════════════════════════════════════════
// Stylesheet conventions
// ═══════════════════════════════════════════════════════════════

/// Stylesheet file extension (without the dot)
pub const DEFAULT_EXTENSION: &str = "scss";

/// Directive keyword recognized by the extractor
pub const IMPORT_KEYWORD: &str = "@import";

/// Separator between base path and specifier in a canonical key.
/// Not valid in any path the loaders produce.
pub const KEY_SEPARATOR: char = '|';

/// Loader plugin suffix marker stripped from located addresses
pub const PLUGIN_SUFFIX: char = '!';

// ═══════════════════════════════════════════════════════════════
// Batching
// ═══════════════════════════════════════════════════════════════

/// Cooperative yields between a load finishing resolution and leaving the batch
pub const DEFAULT_SETTLE_TICKS: u32 = 1;

// ═══════════════════════════════════════════════════════════════
// Persisted artifact
// ═══════════════════════════════════════════════════════════════

/// Directory of the dev artifact, relative to the working directory
pub const DEFAULT_ARTIFACT_DIR: &str = "src/css/dev";

/// File name of the dev artifact
pub const DEFAULT_ARTIFACT_FILE: &str = "dev-css.css";

// ═══════════════════════════════════════════════════════════════
// Compiler
// ═══════════════════════════════════════════════════════════════

/// Default external compiler command
pub const DEFAULT_COMPILER: &str = "sass";

/// Default compiler arguments (read source from stdin)
pub const DEFAULT_COMPILER_ARGS: &[&str] = &["--stdin"];
