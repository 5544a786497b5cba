//! Import Module - directive extraction and specifier normalization
//!
//! Pure, synchronous building blocks of the resolver:
//! - `extract`: ordered `@import` specifiers (tokenizer, no regex)
//! - `normalize`: partial/relative conventions, canonical keys, base paths

mod extract;
mod normalize;

pub use extract::{extract_imports, replace_directives, scan_directives, Directives, ImportDirective};
pub use normalize::{base_of, normalize_specifier, CanonicalKey, NormalizedImport, ResolvedLocation};
