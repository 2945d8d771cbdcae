//! Binary-format scalar decoders.
//!
//! PostgreSQL sends fixed-width numeric values in network byte order. A
//! payload whose length is not one of the widths the type allows is rejected,
//! never truncated or padded.

use crate::error::{DecodeError, DecodeResult};

use super::request::DecodeRequest;
use super::types::{DecodedValue, Format};
use super::SimpleDecoder;

pub const BOOLEAN: SimpleDecoder = SimpleDecoder::new("Boolean", Format::Binary, decode_boolean);
pub const INTEGER: SimpleDecoder = SimpleDecoder::new("Integer", Format::Binary, decode_integer);
pub const FLOAT: SimpleDecoder = SimpleDecoder::new("Float", Format::Binary, decode_float);
pub const BYTEA: SimpleDecoder = SimpleDecoder::new("Bytea", Format::Binary, decode_bytea);

fn invalid_length(
    decoder: &'static str,
    req: &DecodeRequest<'_>,
    expected: &'static str,
) -> DecodeError {
    DecodeError::InvalidLength {
        decoder,
        tuple: req.tuple,
        field: req.field,
        length: req.len(),
        expected,
    }
}

/// `0x00` is false, any other first byte is true.
pub fn decode_boolean(req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
    match req.data.first() {
        Some(b) => Ok(DecodedValue::Bool(*b != 0)),
        None => Err(invalid_length("binary boolean", req, "at least 1")),
    }
}

/// Signed big-endian int2, int4 or int8, widened to i64.
pub fn decode_integer(req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
    let value = match *req.data {
        [a, b] => i16::from_be_bytes([a, b]) as i64,
        [a, b, c, d] => i32::from_be_bytes([a, b, c, d]) as i64,
        [a, b, c, d, e, f, g, h] => i64::from_be_bytes([a, b, c, d, e, f, g, h]),
        _ => return Err(invalid_length("binary integer", req, "2, 4 or 8")),
    };
    Ok(DecodedValue::Int(value))
}

/// Big-endian IEEE-754 float4 or float8.
pub fn decode_float(req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
    let value = match *req.data {
        [a, b, c, d] => f64::from(f32::from_be_bytes([a, b, c, d])),
        [a, b, c, d, e, f, g, h] => f64::from_be_bytes([a, b, c, d, e, f, g, h]),
        _ => return Err(invalid_length("binary float", req, "4 or 8")),
    };
    Ok(DecodedValue::Float(value))
}

/// Raw bytes, any length.
pub fn decode_bytea(req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
    Ok(DecodedValue::Bytes(req.data.to_vec()))
}
