//! Per-column decoder dispatch.
//!
//! Takes the body of a DataRow message, splits it into fields and decodes
//! each field with the decoder chosen for its column. Choosing decoders from
//! type OIDs is left to the caller.

use std::sync::Arc;

use bytes::{Buf, Bytes};
use smallvec::SmallVec;

use crate::decoder::{binary, text, Decode, DecodeRequest, DecodedValue, Decoder, Format, TextEncoding};
use crate::error::{DecodeError, DecodeResult};

/// A decoded row. Inline storage covers rows with up to 16 columns.
pub type DecodedRow = SmallVec<[DecodedValue; 16]>;

/// Decoders for each column of a result set.
///
/// A column without a decoder yields text (text format) or raw bytes
/// (binary format).
#[derive(Debug, Clone, Default)]
pub struct ColumnDecoders {
    columns: Vec<Option<Arc<Decoder>>>,
    encoding: TextEncoding,
}

impl ColumnDecoders {
    pub fn new(columns: Vec<Option<Arc<Decoder>>>) -> Self {
        Self {
            columns,
            encoding: TextEncoding::default(),
        }
    }

    /// Set the encoding used for text-format payloads.
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Decode one field. `None` is SQL NULL and skips the decoder.
    pub fn decode_field(
        &self,
        data: Option<&[u8]>,
        tuple: usize,
        field: usize,
        format: Format,
    ) -> DecodeResult<DecodedValue> {
        let Some(data) = data else {
            return Ok(DecodedValue::Null);
        };

        let req = DecodeRequest {
            data,
            tuple,
            field,
            encoding: self.encoding,
            format,
        };

        match self.columns.get(field).and_then(Option::as_ref) {
            Some(decoder) => {
                if decoder.format() != format {
                    tracing::warn!(
                        tuple,
                        field,
                        decoder = decoder.name(),
                        expected = ?decoder.format(),
                        actual = ?format,
                        "column decoder does not match the field's wire format"
                    );
                }
                tracing::trace!(tuple, field, decoder = decoder.name(), len = data.len(), "decoding field");
                decoder.decode(&req)
            }
            None => match format {
                Format::Text => text::TEXT.decode(&req),
                Format::Binary => binary::BYTEA.decode(&req),
            },
        }
    }

    /// Decode a DataRow message body.
    ///
    /// `formats` follows the result-format convention of Bind: empty means
    /// all text, a single entry applies to every column, otherwise one entry
    /// per column.
    pub fn decode_row(&self, mut body: Bytes, tuple: usize, formats: &[Format]) -> DecodeResult<DecodedRow> {
        if body.remaining() < 2 {
            return Err(DecodeError::InvalidRow("missing column count".to_string()));
        }
        let num_cols = body.get_i16();
        if num_cols < 0 || num_cols as usize != self.columns.len() {
            return Err(DecodeError::InvalidRow(format!(
                "row has {} columns, decoders cover {}",
                num_cols,
                self.columns.len()
            )));
        }

        let mut values = DecodedRow::with_capacity(num_cols as usize);

        for field in 0..num_cols as usize {
            if body.remaining() < 4 {
                return Err(DecodeError::InvalidRow(format!(
                    "missing length for column {}",
                    field
                )));
            }
            let len = body.get_i32();
            let data = if len < 0 {
                None
            } else {
                let len = len as usize;
                if body.remaining() < len {
                    return Err(DecodeError::InvalidRow(format!(
                        "column {} declares {} bytes, {} remain",
                        field,
                        len,
                        body.remaining()
                    )));
                }
                Some(body.split_to(len))
            };

            let format = format_for(formats, field);
            values.push(self.decode_field(data.as_deref(), tuple, field, format)?);
        }

        Ok(values)
    }
}

fn format_for(formats: &[Format], field: usize) -> Format {
    match formats {
        [] => Format::Text,
        [single] => *single,
        many => many.get(field).copied().unwrap_or(Format::Text),
    }
}
