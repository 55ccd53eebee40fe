//! Encoder for the legacy length-prefixed serialization grammar.
//!
//! The encoder is the inverse of [`crate::decode`]. It never trusts a length
//! it was handed: every `s:` length and every `a:`/`O:` count is recomputed
//! from the tree as it is now, which is what keeps a payload valid after its
//! strings have been rewritten to a different length.
//!
//! Output is canonical:
//!
//! - integers in plain decimal, no `+` sign
//! - floats in shortest round-trip form with the legacy spelling
//!   (`d:2;`, `d:0.1;`, `d:-0;`, `d:1.0E+25;`, `d:NAN;`, `d:INF;`)
//! - struct class names and field names copied byte for byte
//!
//! # Example
//! ```
//! use relink_core::{encode, Key, Value};
//! let value = Value::Sequence(vec![(Key::from("url"), Value::from("https://bb.com/x"))]);
//! assert_eq!(encode(&value), br#"a:1:{s:3:"url";s:16:"https://bb.com/x";}"#.to_vec());
//! ```

use crate::types::{Key, Value};

/// Encode a [`Value`] tree. Infallible: any tree can be written.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.extend_from_slice(b"N;"),
        Value::Bool(b) => out.extend_from_slice(if *b { b"b:1;" } else { b"b:0;" }),
        Value::Integer(i) => write_integer(*i, out),
        Value::Float(f) => {
            out.extend_from_slice(b"d:");
            out.extend_from_slice(format_float(*f).as_bytes());
            out.push(b';');
        }
        Value::Bytes(bytes) => write_string(bytes, out),
        Value::Sequence(entries) => {
            out.extend_from_slice(format!("a:{}:{{", entries.len()).as_bytes());
            for (key, value) in entries {
                match key {
                    Key::Int(i) => write_integer(*i, out),
                    Key::Bytes(b) => write_string(b, out),
                }
                write_value(value, out);
            }
            out.push(b'}');
        }
        Value::Struct { name, fields } => {
            out.extend_from_slice(b"O:");
            write_quoted(name, out);
            out.extend_from_slice(format!(":{}:{{", fields.len()).as_bytes());
            for (field, value) in fields {
                write_string(field, out);
                write_value(value, out);
            }
            out.push(b'}');
        }
    }
}

fn write_integer(i: i64, out: &mut Vec<u8>) {
    out.extend_from_slice(format!("i:{};", i).as_bytes());
}

/// `s:<len>:"<bytes>";`
fn write_string(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(b"s:");
    write_quoted(bytes, out);
    out.push(b';');
}

/// `<len>:"<bytes>"` with `len` taken from the bytes themselves.
fn write_quoted(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(format!("{}:\"", bytes.len()).as_bytes());
    out.extend_from_slice(bytes);
    out.push(b'"');
}

/// Format a float the way the legacy writer does.
///
/// Digits are the shortest sequence that round-trips (what `{:e}` yields).
/// Placement follows the legacy rules:
/// - exponential form when the decimal point would sit more than three
///   places left of the first digit (below `1e-4`) or more than 15 places
///   right of it; the mantissa always has a fractional part (`1.0E+25`)
/// - otherwise plain decimal with no trailing `.0` for integral values
/// - signed zero keeps its sign (`-0`)
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }

    let mut out = String::new();
    if f.is_sign_negative() {
        out.push('-');
    }
    if f == 0.0 {
        out.push('0');
        return out;
    }

    let sci = format!("{:e}", f.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    // Number of digits before the decimal point; may be zero or negative.
    let decpt = exp + 1;

    if decpt < -3 || decpt > 15 {
        out.push_str(&digits[..1]);
        out.push('.');
        if digits.len() == 1 {
            out.push('0');
        } else {
            out.push_str(&digits[1..]);
        }
        out.push('E');
        out.push(if exp < 0 { '-' } else { '+' });
        out.push_str(&exp.abs().to_string());
    } else if decpt <= 0 {
        out.push_str("0.");
        for _ in 0..-decpt {
            out.push('0');
        }
        out.push_str(&digits);
    } else {
        let decpt = decpt as usize;
        if digits.len() <= decpt {
            out.push_str(&digits);
            for _ in digits.len()..decpt {
                out.push('0');
            }
        } else {
            out.push_str(&digits[..decpt]);
            out.push('.');
            out.push_str(&digits[decpt..]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::format_float;

    #[test]
    fn float_spellings() {
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(2.0), "2");
        assert_eq!(format_float(-1.5), "-1.5");
        assert_eq!(format_float(-0.0), "-0");
        assert_eq!(format_float(0.0), "0");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(0.00001), "1.0E-5");
        assert_eq!(format_float(1.5e-7), "1.5E-7");
        assert_eq!(format_float(100_000_000_000_000.0), "100000000000000");
        assert_eq!(format_float(1e15), "1.0E+15");
        assert_eq!(format_float(1e25), "1.0E+25");
        assert_eq!(format_float(123.456), "123.456");
        assert_eq!(format_float(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_float(f64::NAN), "NAN");
        assert_eq!(format_float(f64::INFINITY), "INF");
        assert_eq!(format_float(f64::NEG_INFINITY), "-INF");
    }
}
