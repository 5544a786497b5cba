//! Import Extractor - `@import "..."` directive scanning
//!
//! A small tokenizer for the one directive form the pipeline inlines:
//! the `@import` keyword, arbitrary characters on the same statement,
//! then a quoted specifier. Comments and string literals outside
//! directives are skipped so commented-out imports are never inlined.
//!
//! Performance:
//! - Byte-level scan (all delimiters are ASCII, slices stay on char boundaries)
//! - SmallVec for directive collection (most files import fewer than 8 partials)
//! - `Cow::Borrowed` from `replace_directives` when there is nothing to replace

use std::borrow::Cow;
use std::ops::Range;

use smallvec::SmallVec;

use crate::util::IMPORT_KEYWORD;

/// One import directive found in a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    /// Raw specifier between the quotes, e.g. `foo/bar`
    pub specifier: String,
    /// Byte range from the `@` of the keyword through the closing quote
    pub span: Range<usize>,
}

/// Directives of a single source, in order of appearance
pub type Directives = SmallVec<[ImportDirective; 8]>;

/// Extract raw import specifiers in order of appearance.
///
/// No deduplication: a specifier imported twice appears twice.
pub fn extract_imports(source: &str) -> Vec<String> {
    scan_directives(source)
        .into_iter()
        .map(|d| d.specifier)
        .collect()
}

/// Scan a source for import directives (with their byte spans)
pub fn scan_directives(source: &str) -> Directives {
    let mut directives = Directives::new();
    if !source.contains(IMPORT_KEYWORD) {
        return directives;
    }

    let bytes = source.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos = skip_block_comment(bytes, pos + 2);
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos = skip_line(bytes, pos + 2);
            }
            quote @ (b'"' | b'\'') => {
                pos = skip_string(bytes, pos + 1, quote);
            }
            b'@' if starts_keyword(bytes, pos) => {
                let after_keyword = pos + IMPORT_KEYWORD.len();
                match parse_directive(source, pos, after_keyword) {
                    Some(directive) => {
                        pos = directive.span.end;
                        directives.push(directive);
                    }
                    None => pos = after_keyword,
                }
            }
            _ => pos += 1,
        }
    }

    directives
}

/// Rebuild `source` with every directive replaced by `replacement(directive)`.
///
/// Returns `Cow::Borrowed` when the source has no directives.
pub fn replace_directives<'a>(
    source: &'a str,
    directives: &[ImportDirective],
    mut replacement: impl FnMut(&ImportDirective) -> String,
) -> Cow<'a, str> {
    if directives.is_empty() {
        return Cow::Borrowed(source);
    }

    let mut result = String::with_capacity(source.len() + directives.len() * 32);
    let mut last_end = 0;
    for directive in directives {
        result.push_str(&source[last_end..directive.span.start]);
        result.push_str(&replacement(directive));
        last_end = directive.span.end;
    }
    result.push_str(&source[last_end..]);

    Cow::Owned(result)
}

fn starts_keyword(bytes: &[u8], pos: usize) -> bool {
    let keyword = IMPORT_KEYWORD.as_bytes();
    if !bytes[pos..].starts_with(keyword) {
        return false;
    }
    // `@imports` or `@import-x` is a different at-rule
    match bytes.get(pos + keyword.len()) {
        Some(b) => !(b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_'),
        None => false,
    }
}

/// Parse from just after the keyword up to the closing quote.
///
/// The statement may hold anything before the quote (whitespace, `url(`),
/// but not a `;` or line break. The specifier must be non-empty and is
/// closed by the same quote character that opened it.
fn parse_directive(source: &str, start: usize, after_keyword: usize) -> Option<ImportDirective> {
    let bytes = source.as_bytes();
    let mut pos = after_keyword;

    let quote = loop {
        match bytes.get(pos)? {
            b';' | b'\n' | b'\r' => return None,
            q @ (b'"' | b'\'') => break *q,
            _ => pos += 1,
        }
    };

    // At least one character between keyword and quote
    if pos == after_keyword {
        return None;
    }

    let spec_start = pos + 1;
    let mut end = spec_start;
    loop {
        match bytes.get(end)? {
            b'\n' | b'\r' => return None,
            b if *b == quote => break,
            _ => end += 1,
        }
    }

    if end == spec_start {
        return None;
    }

    Some(ImportDirective {
        specifier: source[spec_start..end].to_string(),
        span: start..end + 1,
    })
}

fn skip_block_comment(bytes: &[u8], mut pos: usize) -> usize {
    while pos + 1 < bytes.len() {
        if bytes[pos] == b'*' && bytes[pos + 1] == b'/' {
            return pos + 2;
        }
        pos += 1;
    }
    bytes.len()
}

fn skip_line(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos] != b'\n' {
        pos += 1;
    }
    pos
}

fn skip_string(bytes: &[u8], mut pos: usize, quote: u8) -> usize {
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b'\n' => return pos,
            b if b == quote => return pos + 1,
            _ => pos += 1,
        }
    }
    bytes.len()
}
