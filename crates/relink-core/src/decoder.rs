//! Decoder for the legacy length-prefixed serialization grammar.
//!
//! The grammar is a recursive, tag-first text format:
//!
//! - `N;` null
//! - `b:0;` / `b:1;` booleans
//! - `i:<int>;` signed integers
//! - `d:<float>;` floats, including `NAN`, `INF` and `-INF`
//! - `s:<len>:"<len bytes>";` byte strings (length in bytes)
//! - `a:<count>:{<key><value>...}` ordered sequences with `i` or `s` keys
//! - `O:<len>:"<class>":<count>:{<name><value>...}` named objects
//!
//! # Key design decisions
//!
//! - **Whole-input parse**: a payload decodes only if exactly one value
//!   spans the entire input. Anything left over is an error, never ignored.
//! - **Declared lengths are checked, not trusted**: a string whose closing
//!   quote is not exactly `len` bytes after the opening one fails with
//!   [`DecodeError::LengthMismatch`]. This is what detects payloads that an
//!   earlier literal replace has already corrupted.
//! - **Bounded nesting**: recursion stops at [`MAX_DEPTH`] levels.

use crate::error::DecodeError;
use crate::types::{Key, Value};

/// Deepest nesting of sequences and structs the decoder accepts.
pub const MAX_DEPTH: usize = 512;

type Result<T> = std::result::Result<T, DecodeError>;

/// Decode one serialized payload into a [`Value`] tree.
///
/// Fails if the input is truncated, malformed, has a length prefix that
/// disagrees with its content, or carries bytes after the top-level value.
///
/// # Example
/// ```
/// use relink_core::{decode, Key, Value};
/// let value = decode(br#"a:1:{s:3:"url";s:5:"https";}"#).unwrap();
/// assert_eq!(
///     value,
///     Value::Sequence(vec![(Key::from("url"), Value::from("https"))])
/// );
/// ```
pub fn decode(input: &[u8]) -> Result<Value> {
    let mut cur = Cursor::new(input);
    let value = read_value(&mut cur, 0)?;
    if cur.pos != input.len() {
        return Err(DecodeError::TrailingBytes { offset: cur.pos });
    }
    Ok(value)
}

/// Byte cursor over the input. All reads are bounds-checked and report
/// truncation as [`DecodeError::UnexpectedEof`].
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn peek(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::UnexpectedEof { offset: self.pos })
    }

    fn next(&mut self) -> Result<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        let at = self.pos;
        if self.next()? == byte {
            Ok(())
        } else {
            Err(DecodeError::Expected {
                expected: byte as char,
                offset: at,
            })
        }
    }

    /// Return the bytes up to (not including) `delim` and move past it.
    fn take_until(&mut self, delim: u8) -> Result<&'a [u8]> {
        let rest = &self.data[self.pos..];
        match memchr::memchr(delim, rest) {
            Some(idx) => {
                self.pos += idx + 1;
                Ok(&rest[..idx])
            }
            None => Err(DecodeError::UnexpectedEof {
                offset: self.data.len(),
            }),
        }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

fn read_value(cur: &mut Cursor<'_>, depth: usize) -> Result<Value> {
    let at = cur.pos;
    match cur.next()? {
        b'N' => {
            cur.expect(b';')?;
            Ok(Value::Null)
        }
        b'b' => {
            cur.expect(b':')?;
            let flag_at = cur.pos;
            let flag = match cur.next()? {
                b'0' => false,
                b'1' => true,
                _ => return Err(DecodeError::InvalidNumber { offset: flag_at }),
            };
            cur.expect(b';')?;
            Ok(Value::Bool(flag))
        }
        b'i' => {
            cur.expect(b':')?;
            Ok(Value::Integer(read_integer(cur)?))
        }
        b'd' => {
            cur.expect(b':')?;
            Ok(Value::Float(read_float(cur)?))
        }
        b's' => {
            cur.expect(b':')?;
            Ok(Value::Bytes(read_string_body(cur)?))
        }
        b'a' => {
            cur.expect(b':')?;
            read_sequence(cur, depth)
        }
        b'O' => {
            cur.expect(b':')?;
            read_struct(cur, depth)
        }
        other => Err(DecodeError::UnknownTag {
            tag: other as char,
            offset: at,
        }),
    }
}

/// `<digits>:` - a non-negative length or count followed by a colon.
fn read_length(cur: &mut Cursor<'_>) -> Result<usize> {
    let at = cur.pos;
    let digits = cur.take_until(b':')?;
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(DecodeError::InvalidNumber { offset: at });
    }
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(DecodeError::InvalidNumber { offset: at })
}

/// `[+-]<digits>;` - the body of an `i:` token.
fn read_integer(cur: &mut Cursor<'_>) -> Result<i64> {
    let at = cur.pos;
    let token = cur.take_until(b';')?;
    let digits = match token.first() {
        Some(b'+') | Some(b'-') => &token[1..],
        _ => token,
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(DecodeError::InvalidNumber { offset: at });
    }
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(DecodeError::InvalidNumber { offset: at })
}

/// The body of a `d:` token. Accepts the special tokens `NAN`, `INF` and
/// `-INF` verbatim and otherwise only decimal notation; Rust's own spellings
/// such as `inf` or `NaN` are rejected.
fn read_float(cur: &mut Cursor<'_>) -> Result<f64> {
    let at = cur.pos;
    let token = cur.take_until(b';')?;
    match token {
        b"NAN" => return Ok(f64::NAN),
        b"INF" => return Ok(f64::INFINITY),
        b"-INF" => return Ok(f64::NEG_INFINITY),
        _ => {}
    }
    let well_formed = token.iter().any(u8::is_ascii_digit)
        && token
            .iter()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !well_formed {
        return Err(DecodeError::InvalidNumber { offset: at });
    }
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(DecodeError::InvalidNumber { offset: at })
}

/// `<len>:"<len bytes>";` - everything after the `s:` tag.
fn read_string_body(cur: &mut Cursor<'_>) -> Result<Vec<u8>> {
    let bytes = read_quoted(cur)?;
    cur.expect(b';')?;
    Ok(bytes)
}

/// `<len>:"<len bytes>"` - shared by strings and struct class names.
fn read_quoted(cur: &mut Cursor<'_>) -> Result<Vec<u8>> {
    let declared = read_length(cur)?;
    cur.expect(b'"')?;
    let start = cur.pos;
    if declared >= cur.remaining() || cur.data[start + declared] != b'"' {
        return Err(DecodeError::LengthMismatch {
            declared,
            offset: start,
        });
    }
    let bytes = cur.data[start..start + declared].to_vec();
    cur.pos = start + declared + 1;
    Ok(bytes)
}

fn enter(cur: &Cursor<'_>, depth: usize) -> Result<usize> {
    let next = depth + 1;
    if next > MAX_DEPTH {
        return Err(DecodeError::TooDeep {
            limit: MAX_DEPTH,
            offset: cur.pos,
        });
    }
    Ok(next)
}

/// Cap on up-front allocation so a forged count cannot reserve huge buffers.
fn capacity_hint(count: usize, cur: &Cursor<'_>) -> usize {
    // The smallest entry (`i:0;N;`) is six bytes.
    count.min(cur.remaining() / 6)
}

/// `<count>:{<key><value>...}` - everything after the `a:` tag.
fn read_sequence(cur: &mut Cursor<'_>, depth: usize) -> Result<Value> {
    let depth = enter(cur, depth)?;
    let count = read_length(cur)?;
    cur.expect(b'{')?;
    let mut entries = Vec::with_capacity(capacity_hint(count, cur));
    for _ in 0..count {
        let key = read_key(cur)?;
        let value = read_value(cur, depth)?;
        entries.push((key, value));
    }
    cur.expect(b'}')?;
    Ok(Value::Sequence(entries))
}

fn read_key(cur: &mut Cursor<'_>) -> Result<Key> {
    let at = cur.pos;
    match cur.next()? {
        b'i' => {
            cur.expect(b':')?;
            Ok(Key::Int(read_integer(cur)?))
        }
        b's' => {
            cur.expect(b':')?;
            Ok(Key::Bytes(read_string_body(cur)?))
        }
        _ => Err(DecodeError::InvalidKey { offset: at }),
    }
}

/// `<len>:"<class>":<count>:{<name><value>...}` - everything after `O:`.
fn read_struct(cur: &mut Cursor<'_>, depth: usize) -> Result<Value> {
    let depth = enter(cur, depth)?;
    let name = read_quoted(cur)?;
    cur.expect(b':')?;
    let count = read_length(cur)?;
    cur.expect(b'{')?;
    let mut fields = Vec::with_capacity(capacity_hint(count, cur));
    for _ in 0..count {
        let at = cur.pos;
        if cur.next()? != b's' {
            return Err(DecodeError::InvalidKey { offset: at });
        }
        cur.expect(b':')?;
        let field = read_string_body(cur)?;
        let value = read_value(cur, depth)?;
        fields.push((field, value));
    }
    cur.expect(b'}')?;
    Ok(Value::Struct { name, fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_rust_float_spellings() {
        assert!(decode(b"d:inf;").is_err());
        assert!(decode(b"d:NaN;").is_err());
        assert!(decode(b"d:infinity;").is_err());
    }

    #[test]
    fn length_check_uses_bytes() {
        // "é" is two bytes in UTF-8.
        assert_eq!(
            decode("s:2:\"é\";".as_bytes()).unwrap(),
            Value::Bytes("é".as_bytes().to_vec())
        );
        assert!(decode("s:1:\"é\";".as_bytes()).is_err());
    }

    #[test]
    fn depth_limit() {
        let mut nested = Vec::new();
        for _ in 0..=MAX_DEPTH {
            nested.extend_from_slice(b"a:1:{i:0;");
        }
        nested.extend_from_slice(b"N;");
        for _ in 0..=MAX_DEPTH {
            nested.push(b'}');
        }
        assert!(matches!(
            decode(&nested),
            Err(DecodeError::TooDeep { limit: MAX_DEPTH, .. })
        ));
    }
}
