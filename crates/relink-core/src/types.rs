//! In-memory value tree for serialized payloads.
//!
//! A [`Value`] is built per field by [`crate::decode`], rewritten, encoded
//! again and dropped. Entries keep their source order so that re-encoding an
//! untouched tree reproduces the canonical input byte for byte.

use serde_json::{Map, Number};

/// Key of a [`Value::Sequence`] entry. The grammar only allows integer and
/// byte-string keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Bytes(Vec<u8>),
}

/// A decoded payload value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    /// Includes the `NAN`, `INF` and `-INF` tokens.
    Float(f64),
    /// Raw string content. Lengths are byte counts, never character counts.
    Bytes(Vec<u8>),
    /// Ordered key/value entries.
    Sequence(Vec<(Key, Value)>),
    /// Named object with ordered fields. Neither the class name nor the field
    /// names are ever rewritten.
    Struct {
        name: Vec<u8>,
        fields: Vec<(Vec<u8>, Value)>,
    },
}

/// Structural equality. Floats compare by bit pattern so that a decoded
/// `NAN` equals itself and `-0` stays distinct from `0`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (
                Value::Struct {
                    name: na,
                    fields: fa,
                },
                Value::Struct {
                    name: nb,
                    fields: fb,
                },
            ) => na == nb && fa == fb,
            _ => false,
        }
    }
}

impl Value {
    /// Short lowercase name of the variant, used in logs and `inspect` output.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::Sequence(_) => "sequence",
            Value::Struct { .. } => "struct",
        }
    }

    /// Convert into a JSON view for display.
    ///
    /// Byte strings are decoded lossily as UTF-8. Sequences become objects
    /// keyed by the key's text, structs become `{"class": .., "fields": {..}}`.
    /// Non-finite floats render as strings. The conversion is one-way; it
    /// exists for humans, not for storage.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => match Number::from_f64(*f) {
                Some(n) => serde_json::Value::Number(n),
                None => serde_json::Value::String(f.to_string()),
            },
            Value::Bytes(b) => serde_json::Value::String(lossy(b)),
            Value::Sequence(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    let key = match key {
                        Key::Int(i) => i.to_string(),
                        Key::Bytes(b) => lossy(b),
                    };
                    map.insert(key, value.to_json());
                }
                serde_json::Value::Object(map)
            }
            Value::Struct { name, fields } => {
                let mut map = Map::new();
                for (field, value) in fields {
                    map.insert(lossy(field), value.to_json());
                }
                let mut outer = Map::new();
                outer.insert("class".to_string(), serde_json::Value::String(lossy(name)));
                outer.insert("fields".to_string(), serde_json::Value::Object(map));
                serde_json::Value::Object(outer)
            }
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bytes(s.as_bytes().to_vec())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Bytes(s.as_bytes().to_vec())
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}
