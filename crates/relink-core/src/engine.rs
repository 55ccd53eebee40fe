//! Per-field rewrite: classify, rewrite, and gate out no-op results.
//!
//! [`process`] is the one entry point the migration runner needs. It is pure:
//! no I/O, no shared state, safe to call from any number of threads.

use crate::classify::is_encoded;
use crate::decoder::decode;
use crate::encoder::encode;
use crate::rewrite::{replace_all_counted, rewrite_counted};

/// How a payload was treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Decoded, rewritten leaf by leaf and re-encoded.
    Structured,
    /// Rewritten as plain bytes.
    Opaque,
}

/// Result of rewriting one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcome {
    pub kind: PayloadKind,
    /// Occurrences of the old text that were replaced.
    pub replacements: usize,
    /// The new payload, or `None` when nothing observable changed.
    pub payload: Option<Vec<u8>>,
}

impl FieldOutcome {
    fn unchanged(kind: PayloadKind) -> Self {
        Self {
            kind,
            replacements: 0,
            payload: None,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.payload.is_some()
    }
}

/// Rewrite `old` to `new` in one raw field.
///
/// Returns `Some(new_payload)` only when the payload actually changed.
/// Serialized payloads are rewritten structurally so their length prefixes
/// stay correct; anything else, including payloads that merely look
/// serialized but fail to decode, gets a literal replacement.
///
/// # Example
/// ```
/// use relink_core::process;
/// let raw = br#"a:1:{s:3:"url";s:15:"https://a.com/x";}"#;
/// let out = process(raw, b"https://a.com", b"https://bb.com").unwrap();
/// assert_eq!(out, br#"a:1:{s:3:"url";s:16:"https://bb.com/x";}"#.to_vec());
///
/// assert_eq!(process(b"no match here", b"https://a.com", b"https://bb.com"), None);
/// ```
pub fn process(raw: &[u8], old: &[u8], new: &[u8]) -> Option<Vec<u8>> {
    process_detailed(raw, old, new).payload
}

/// Like [`process`], also reporting how the payload was treated.
pub fn process_detailed(raw: &[u8], old: &[u8], new: &[u8]) -> FieldOutcome {
    if raw.is_empty() {
        return FieldOutcome::unchanged(PayloadKind::Opaque);
    }

    if is_encoded(raw) {
        if let Ok(tree) = decode(raw) {
            let (tree, replacements) = rewrite_counted(tree, old, new);
            // Re-encoding an untouched tree could still normalize a valid but
            // non-canonical input (`i:+5;`), which is not ours to change.
            if replacements == 0 {
                return FieldOutcome::unchanged(PayloadKind::Structured);
            }
            return gate(PayloadKind::Structured, raw, encode(&tree), replacements);
        }
    }

    let (candidate, replacements) = replace_all_counted(raw, old, new);
    gate(PayloadKind::Opaque, raw, candidate, replacements)
}

fn gate(kind: PayloadKind, raw: &[u8], candidate: Vec<u8>, replacements: usize) -> FieldOutcome {
    if candidate == raw {
        return FieldOutcome {
            kind,
            replacements,
            payload: None,
        };
    }
    FieldOutcome {
        kind,
        replacements,
        payload: Some(candidate),
    }
}

/// Trim trailing `/` from a base URL. This is the only normalization applied
/// to the old and new URLs.
///
/// ```
/// use relink_core::normalize_base_url;
/// assert_eq!(normalize_base_url("https://a.com//"), "https://a.com");
/// assert_eq!(normalize_base_url("https://a.com/blog"), "https://a.com/blog");
/// ```
pub fn normalize_base_url(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Build a SQL `LIKE` pattern matching any value that contains `needle`.
///
/// `\`, `%` and `_` are escaped with a backslash, so the pattern must be used
/// with the default `\` escape character. Without escaping, an `_` in a URL
/// would match any character and a `%` any run, and rows could be missed or
/// wrongly selected.
///
/// ```
/// use relink_core::like_pattern;
/// assert_eq!(like_pattern("https://my_site.com/100%"), r"%https://my\_site.com/100\%%");
/// ```
pub fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}
