//! Text-format scalar decoders.

use crate::error::{DecodeError, DecodeResult};

use super::request::DecodeRequest;
use super::types::{DecodedValue, Format, TextEncoding};
use super::SimpleDecoder;

pub const BOOLEAN: SimpleDecoder = SimpleDecoder::new("Boolean", Format::Text, decode_boolean);
pub const INTEGER: SimpleDecoder = SimpleDecoder::new("Integer", Format::Text, decode_integer);
pub const FLOAT: SimpleDecoder = SimpleDecoder::new("Float", Format::Text, decode_float);
pub const TEXT: SimpleDecoder = SimpleDecoder::new("Text", Format::Text, decode_text);
pub const BYTEA: SimpleDecoder = SimpleDecoder::new("Bytea", Format::Text, decode_bytea);

/// Only the first character is inspected: `t` is true, anything else false.
pub fn decode_boolean(req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
    match req.data.first() {
        Some(c) => Ok(DecodedValue::Bool(*c == b't')),
        None => Err(DecodeError::InvalidLength {
            decoder: "text boolean",
            tuple: req.tuple,
            field: req.field,
            length: 0,
            expected: "at least 1",
        }),
    }
}

/// Base-10 signed integer within the i64 range.
pub fn decode_integer(req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
    let text = String::from_utf8_lossy(req.data);
    text.trim()
        .parse::<i64>()
        .map(DecodedValue::Int)
        .map_err(|source| DecodeError::InvalidInteger {
            tuple: req.tuple,
            field: req.field,
            text: text.into_owned(),
            source,
        })
}

/// Longest numeric prefix, `strtod` style. Input without any numeric prefix
/// decodes to `0.0`.
pub fn decode_float(req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
    Ok(DecodedValue::Float(parse_float_prefix(req.data)))
}

/// Payload as a string in the request's text encoding.
pub fn decode_text(req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
    decode_string(req).map(DecodedValue::Text)
}

pub fn decode_bytea(req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
    Ok(DecodedValue::Bytes(unescape_bytea(req.data)))
}

/// Transcode a text payload into a `String`.
pub fn decode_string(req: &DecodeRequest<'_>) -> DecodeResult<String> {
    match req.encoding {
        TextEncoding::Utf8 => std::str::from_utf8(req.data)
            .map(str::to_owned)
            .map_err(|source| DecodeError::InvalidText {
                tuple: req.tuple,
                field: req.field,
                encoding: req.encoding,
                source,
            }),
        TextEncoding::Latin1 => Ok(req.data.iter().map(|&b| b as char).collect()),
        TextEncoding::SqlAscii => Ok(String::from_utf8_lossy(req.data).into_owned()),
    }
}

// ============================================================================
// Float Prefix Scanning
// ============================================================================

pub(crate) fn parse_float_prefix(input: &[u8]) -> f64 {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    let s = &input[start..];

    let (negative, body) = match s.first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = if starts_with_ignore_case(body, b"inf") {
        f64::INFINITY
    } else if starts_with_ignore_case(body, b"nan") {
        f64::NAN
    } else {
        let end = numeric_prefix_len(body);
        std::str::from_utf8(&body[..end])
            .ok()
            .and_then(|t| t.parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn starts_with_ignore_case(s: &[u8], prefix: &[u8]) -> bool {
    s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Length of `digits [. digits] [e [sign] digits]`, requiring at least one
/// mantissa digit; zero when there is none.
fn numeric_prefix_len(s: &[u8]) -> usize {
    let digits = |from: usize| s[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = digits(0);
    let mut mantissa = end;
    if s.get(end) == Some(&b'.') {
        let frac = digits(end + 1);
        mantissa += frac;
        end += 1 + frac;
    }
    if mantissa == 0 {
        return 0;
    }

    if matches!(s.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(s.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    end
}

// ============================================================================
// Bytea Unescaping
// ============================================================================

/// Undo PostgreSQL's text-mode bytea escaping.
///
/// Accepts both output styles libpq understands:
/// - hex: `\x` followed by hex digit pairs; non-hex characters are skipped
/// - escape: `\\` for a backslash, `\ooo` (first digit 0-3) for any byte;
///   a backslash before anything else is dropped
pub fn unescape_bytea(input: &[u8]) -> Vec<u8> {
    match input {
        [b'\\', b'x', hex @ ..] => unescape_hex(hex),
        _ => unescape_octal(input),
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn unescape_hex(hex: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(hex.len() / 2);
    let mut i = 0;
    while i < hex.len() {
        let high = hex_value(hex[i]);
        i += 1;
        let Some(high) = high else { continue };
        let Some(&next) = hex.get(i) else { break };
        i += 1;
        if let Some(low) = hex_value(next) {
            out.push((high << 4) | low);
        }
    }
    out
}

fn is_octal(c: u8) -> bool {
    (b'0'..=b'7').contains(&c)
}

fn unescape_octal(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] != b'\\' {
            out.push(input[i]);
            i += 1;
            continue;
        }

        i += 1;
        match input.get(i..i + 3) {
            Some(&[a, b, c]) if (b'0'..=b'3').contains(&a) && is_octal(b) && is_octal(c) => {
                out.push(((a - b'0') << 6) | ((b - b'0') << 3) | (c - b'0'));
                i += 3;
            }
            _ => {
                if input.get(i) == Some(&b'\\') {
                    out.push(b'\\');
                    i += 1;
                }
                // unrecognized escape: the next character is emitted as data
            }
        }
    }
    out
}
