//! Literal substring replacement, on raw bytes and across a value tree.
//!
//! Replacement is literal (no pattern syntax), scans left to right and never
//! overlaps: after a match the scan resumes at the end of the matched text,
//! so the inserted replacement is never rescanned. An empty search string
//! replaces nothing.
//!
//! Tree rewriting touches only [`Value::Bytes`] leaves. Sequence keys, struct
//! class names and struct field names are left alone even when they contain
//! the search string.

use memchr::memmem::Finder;

use crate::types::Value;

/// A prepared literal replacement, reusable across many inputs.
pub struct Replacer<'a> {
    finder: Finder<'a>,
    new: &'a [u8],
}

impl<'a> Replacer<'a> {
    /// Returns `None` for an empty `old`, which would otherwise match between
    /// every byte.
    pub fn new(old: &'a [u8], new: &'a [u8]) -> Option<Self> {
        if old.is_empty() {
            return None;
        }
        Some(Self {
            finder: Finder::new(old),
            new,
        })
    }

    /// Replace every occurrence in `text`. Returns `None` when there was
    /// nothing to replace, so callers can skip the copy.
    pub fn apply(&self, text: &[u8]) -> Option<(Vec<u8>, usize)> {
        let old_len = self.finder.needle().len();
        let mut matches = self.finder.find_iter(text).peekable();
        matches.peek()?;

        let mut out = Vec::with_capacity(text.len());
        let mut last = 0;
        let mut count = 0;
        for idx in matches {
            out.extend_from_slice(&text[last..idx]);
            out.extend_from_slice(self.new);
            last = idx + old_len;
            count += 1;
        }
        out.extend_from_slice(&text[last..]);
        Some((out, count))
    }
}

/// Replace every non-overlapping occurrence of `old` in `text` with `new`.
///
/// # Example
/// ```
/// use relink_core::replace_all;
/// assert_eq!(replace_all(b"a.com and a.com", b"a.com", b"b.org"), b"b.org and b.org");
/// assert_eq!(replace_all(b"unchanged", b"", b"x"), b"unchanged");
/// ```
pub fn replace_all(text: &[u8], old: &[u8], new: &[u8]) -> Vec<u8> {
    replace_all_counted(text, old, new).0
}

/// Like [`replace_all`], also returning how many occurrences were replaced.
pub fn replace_all_counted(text: &[u8], old: &[u8], new: &[u8]) -> (Vec<u8>, usize) {
    Replacer::new(old, new)
        .and_then(|r| r.apply(text))
        .unwrap_or_else(|| (text.to_vec(), 0))
}

/// Rewrite every byte-string leaf of `value`, keeping the tree's shape.
pub fn rewrite(value: Value, old: &[u8], new: &[u8]) -> Value {
    rewrite_counted(value, old, new).0
}

/// Like [`rewrite`], also returning the total number of replacements made
/// across all leaves.
///
/// Traversal is depth-first preorder on an explicit work stack, so nesting
/// depth is limited by memory rather than by the call stack.
pub fn rewrite_counted(mut value: Value, old: &[u8], new: &[u8]) -> (Value, usize) {
    let Some(replacer) = Replacer::new(old, new) else {
        return (value, 0);
    };

    let mut count = 0;
    let mut stack: Vec<&mut Value> = vec![&mut value];
    while let Some(node) = stack.pop() {
        match node {
            Value::Bytes(content) => {
                if let Some((replaced, n)) = replacer.apply(content) {
                    *content = replaced;
                    count += n;
                }
            }
            // Reversed so children are visited in source order.
            Value::Sequence(entries) => stack.extend(entries.iter_mut().rev().map(|(_, v)| v)),
            Value::Struct { fields, .. } => stack.extend(fields.iter_mut().rev().map(|(_, v)| v)),
            Value::Null | Value::Bool(_) | Value::Integer(_) | Value::Float(_) => {}
        }
    }
    (value, count)
}
