//! Specifier Normalizer - raw specifier + base path → canonical key
//!
//! Rules, applied in order:
//! 1. Partial-file convention: `foo/bar` → `foo/_bar.scss`
//!    (skipped when the specifier already carries the extension)
//! 2. Relative paths: prefix `./` unless the specifier starts with
//!    `./`, `../` or the base path itself
//! 3. Key: `base + "|" + specifier`
//!
//! The base path is always part of the key: the same specifier imported
//! from two directories names two different files.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::util::{KEY_SEPARATOR, PLUGIN_SUFFIX};

/// Origin prefix of an http(s) address (first occurrence only)
static ORIGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^/]+/").expect("valid origin regex"));

/// Cache identity of an import before its location is known
///
/// Uses `Arc<str>` for zero-cost cloning between the cache, events and
/// source placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalKey(Arc<str>);

impl CanonicalKey {
    /// Build a key from a base path and an already-normalized specifier
    pub fn new(base: &str, file: &str) -> Self {
        let mut key = String::with_capacity(base.len() + file.len() + 1);
        key.push_str(base);
        key.push(KEY_SEPARATOR);
        key.push_str(file);
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base path part of the key
    pub fn base(&self) -> &str {
        self.0
            .split_once(KEY_SEPARATOR)
            .map(|(base, _)| base)
            .unwrap_or("")
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute location returned by the loader after normalize + locate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedLocation(Arc<str>);

impl ResolvedLocation {
    /// Wrap a located address, dropping any loader plugin suffix (`a.scss!css` → `a.scss`)
    pub fn from_located(address: &str) -> Self {
        let address = address
            .split_once(PLUGIN_SUFFIX)
            .map(|(path, _)| path)
            .unwrap_or(address);
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of normalizing one specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImport {
    /// Cache key (`base|file`)
    pub key: CanonicalKey,
    /// Normalized file path handed to the loader's `normalize`
    pub file: String,
}

/// Normalize a raw specifier against the base path of the importing file
pub fn normalize_specifier(specifier: &str, base: &str, extension: &str) -> NormalizedImport {
    let mut file = partial_file(specifier, extension);

    if !is_relative(&file) && !file.starts_with(base) {
        file.insert_str(0, "./");
    }

    NormalizedImport {
        key: CanonicalKey::new(base, &file),
        file,
    }
}

/// Apply the partial-file convention to the last path segment
fn partial_file(specifier: &str, extension: &str) -> String {
    let has_extension = specifier
        .strip_suffix(extension)
        .is_some_and(|stem| stem.ends_with('.'));
    if has_extension {
        return specifier.to_string();
    }

    match specifier.rsplit_once('/') {
        Some((dir, name)) => format!("{}/_{}.{}", dir, name, extension),
        None => format!("_{}.{}", specifier, extension),
    }
}

fn is_relative(path: &str) -> bool {
    path.starts_with("./") || path.starts_with("../")
}

/// Directory part of an address, with a trailing `/`
///
/// `cwd` is stripped as a `file:<cwd>/` prefix (authoritative environment,
/// where addresses are `file:` URLs). The first `http(s)://host/` origin is
/// stripped too, so browser and server addresses share one key space.
pub fn base_of(address: &str, cwd: Option<&str>) -> String {
    let mut path = match cwd {
        Some(cwd) => address.replacen(&format!("file:{}/", cwd), "", 1),
        None => address.to_string(),
    };
    path = ORIGIN_RE.replace(&path, "").into_owned();

    match path.rsplit_once('/') {
        Some((dir, _)) => format!("{}/", dir),
        None => "/".to_string(),
    }
}
