//! Decoded values and the wire descriptors that accompany a field.
//!
//! Reference: https://www.postgresql.org/docs/current/protocol-overview.html#PROTOCOL-FORMAT-CODES

use serde::ser::{Serialize, SerializeSeq, Serializer};

// ============================================================================
// Wire Descriptors
// ============================================================================

/// Format codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum Format {
    Text = 0,
    Binary = 1,
}

impl From<i16> for Format {
    fn from(code: i16) -> Self {
        match code {
            1 => Format::Binary,
            _ => Format::Text,
        }
    }
}

/// Character encoding of text-format payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// No validation; bytes above 0x7f are replaced.
    SqlAscii,
    /// ISO-8859-1, one byte per code point
    Latin1,
}

impl TextEncoding {
    /// Resolve a server encoding name as reported in `client_encoding`.
    pub fn from_pg_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "UTF8" | "UTF-8" | "UNICODE" => Some(TextEncoding::Utf8),
            "SQL_ASCII" => Some(TextEncoding::SqlAscii),
            "LATIN1" | "ISO88591" | "ISO_8859_1" => Some(TextEncoding::Latin1),
            _ => None,
        }
    }

    /// The canonical PostgreSQL name of this encoding.
    pub fn pg_name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF8",
            TextEncoding::SqlAscii => "SQL_ASCII",
            TextEncoding::Latin1 => "LATIN1",
        }
    }
}

// ============================================================================
// Decoded Values
// ============================================================================

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Uninterpreted bytes (bytea); no text encoding attached
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<DecodedValue>),
}

impl DecodedValue {
    /// Check if this value is NULL
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, DecodedValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DecodedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64. Integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Float(f) => Some(*f),
            DecodedValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DecodedValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DecodedValue]> {
        match self {
            DecodedValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Convert to a JSON value. Byte strings are rendered in PostgreSQL's
    /// hex output form (`\x0a0b`), non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<bool> for DecodedValue {
    fn from(v: bool) -> Self {
        DecodedValue::Bool(v)
    }
}

impl From<i64> for DecodedValue {
    fn from(v: i64) -> Self {
        DecodedValue::Int(v)
    }
}

impl From<f64> for DecodedValue {
    fn from(v: f64) -> Self {
        DecodedValue::Float(v)
    }
}

impl From<&str> for DecodedValue {
    fn from(v: &str) -> Self {
        DecodedValue::Text(v.to_string())
    }
}

impl From<String> for DecodedValue {
    fn from(v: String) -> Self {
        DecodedValue::Text(v)
    }
}

impl From<Vec<DecodedValue>> for DecodedValue {
    fn from(v: Vec<DecodedValue>) -> Self {
        DecodedValue::Array(v)
    }
}

impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DecodedValue::Null => serializer.serialize_unit(),
            DecodedValue::Bool(b) => serializer.serialize_bool(*b),
            DecodedValue::Int(i) => serializer.serialize_i64(*i),
            DecodedValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            DecodedValue::Float(_) => serializer.serialize_unit(),
            DecodedValue::Bytes(b) => serializer.serialize_str(&hex_literal(b)),
            DecodedValue::Text(s) => serializer.serialize_str(s),
            DecodedValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

fn hex_literal(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}
