//! The unit of work handed to every decoder.

use super::types::{Format, TextEncoding};

/// A single field payload plus the metadata needed to decode it.
///
/// The payload is borrowed from the caller's row buffer for the duration of
/// one decode call. Tuple and field indices are only used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeRequest<'a> {
    /// Raw field payload (length-prefixed on the wire, not NUL-terminated)
    pub data: &'a [u8],
    pub tuple: usize,
    pub field: usize,
    /// Encoding of text-format payloads
    pub encoding: TextEncoding,
    pub format: Format,
}

impl<'a> DecodeRequest<'a> {
    /// Create a text-format request at tuple 0, field 0.
    pub fn text(data: &'a [u8]) -> Self {
        Self {
            data,
            tuple: 0,
            field: 0,
            encoding: TextEncoding::Utf8,
            format: Format::Text,
        }
    }

    /// Create a binary-format request at tuple 0, field 0.
    pub fn binary(data: &'a [u8]) -> Self {
        Self {
            format: Format::Binary,
            ..Self::text(data)
        }
    }

    /// Set the diagnostic position.
    pub fn at(mut self, tuple: usize, field: usize) -> Self {
        self.tuple = tuple;
        self.field = field;
        self
    }

    /// Set the text encoding.
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Same position, encoding and format over a different payload.
    ///
    /// Used for array elements, which inherit the enclosing field's metadata.
    pub fn with_data<'b>(&self, data: &'b [u8]) -> DecodeRequest<'b> {
        DecodeRequest {
            data,
            tuple: self.tuple,
            field: self.field,
            encoding: self.encoding,
            format: self.format,
        }
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
