//! Text-format array literal parsing.
//!
//! Parses PostgreSQL's `{...}` array output into nested [`DecodedValue::Array`]s.
//! Reference: https://www.postgresql.org/docs/current/arrays.html#ARRAYS-IO
//!
//! Grammar handled per nesting level:
//! - elements are separated by `,` and the level ends at `}`
//! - `{` opens a nested level, parsed recursively with the same cursor
//! - `"` quotes an element; inside quotes `\` takes the next byte literally
//! - an unquoted, case-sensitive `NULL` is the null value

use tracing::warn;

use crate::config::DecodeConfig;
use crate::error::{DecodeError, DecodeResult};

use super::request::DecodeRequest;
use super::types::{DecodedValue, Format};
use super::{CompositeDecoder, Decode};

pub const ARRAY: CompositeDecoder = CompositeDecoder::new("Array", Format::Text, decode_text_array);

/// Decode a text array literal, delegating elements to the composite's
/// element strategy.
pub fn decode_text_array(
    conv: &CompositeDecoder,
    req: &DecodeRequest<'_>,
) -> DecodeResult<DecodedValue> {
    let elem = conv.element_decoder();
    ArrayParser::new(req, elem, *conv.config())
        .parse()
        .map(DecodedValue::Array)
}

/// Quoting state of the element currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    /// Outside quotes, element never quoted
    Bare,
    /// Inside a quoted section
    Open,
    /// Outside quotes, element was quoted earlier
    Closed,
}

/// Recursive-descent parser over one array literal.
///
/// All nesting levels share a single word buffer sized to the input, which
/// bounds the total unescaped length of every element in flight.
pub struct ArrayParser<'a, 'd> {
    input: &'a [u8],
    request: DecodeRequest<'a>,
    elem: &'d dyn Decode,
    config: DecodeConfig,
    word: Vec<u8>,
    deepest: usize,
}

impl<'a, 'd> ArrayParser<'a, 'd> {
    pub fn new(request: &DecodeRequest<'a>, elem: &'d dyn Decode, config: DecodeConfig) -> Self {
        Self {
            input: request.data,
            request: *request,
            elem,
            config,
            word: Vec::with_capacity(request.len() + 1),
            deepest: 0,
        }
    }

    /// Deepest nesting level entered so far; the top level is 1.
    pub fn depth_reached(&self) -> usize {
        self.deepest
    }

    /// Parse the whole literal.
    pub fn parse(&mut self) -> DecodeResult<Vec<DecodedValue>> {
        let start = self.literal_start()?;
        let mut pos = start + 1;
        self.read_array(&mut pos, 1)
    }

    /// Offset of the opening brace, skipping an optional dimension
    /// decoration such as `[0:1]=`.
    fn literal_start(&self) -> DecodeResult<usize> {
        let mut start = 0;
        if self.input.first() == Some(&b'[') {
            if let Some(eq) = self.input.iter().position(|&b| b == b'=') {
                start = eq + 1;
            }
        }

        if self.input.get(start) != Some(&b'{') && self.config.strict_literals {
            return Err(self.malformed(start, "array literal must start with '{'"));
        }
        Ok(start)
    }

    /// Read one nesting level. `pos` points just past the level's `{` and is
    /// left on its closing `}`.
    pub fn read_array(&mut self, pos: &mut usize, depth: usize) -> DecodeResult<Vec<DecodedValue>> {
        // the top level is always allowed, even when the fields were set directly
        let limit = self.config.max_array_depth.max(1);
        if depth > limit {
            return Err(DecodeError::NestingTooDeep {
                tuple: self.request.tuple,
                field: self.request.field,
                limit,
            });
        }
        self.deepest = self.deepest.max(depth);

        let mut array = Vec::new();

        if self.input.get(*pos) == Some(&b'}') {
            return Ok(array);
        }

        let word_start = self.word.len();
        let mut quote = Quote::Bare;
        // Inside quotes: take the next byte literally.
        // Outside quotes: the slot was filled by a nested array, push no word.
        let mut escape_next = false;

        while *pos < self.input.len() {
            let c = self.input[*pos];

            if quote != Quote::Open {
                match c {
                    b',' | b'}' => {
                        if !escape_next {
                            let value = self.finish_word(word_start, quote)?;
                            array.push(value);
                        }
                        self.word.truncate(word_start);
                        if c == b'}' {
                            return Ok(array);
                        }
                        escape_next = false;
                        quote = Quote::Bare;
                    }
                    b'"' => quote = Quote::Open,
                    b'{' => {
                        *pos += 1;
                        let nested = self.read_array(pos, depth + 1)?;
                        array.push(DecodedValue::Array(nested));
                        escape_next = true;
                    }
                    _ => self.word.push(c),
                }
            } else if escape_next {
                self.word.push(c);
                escape_next = false;
            } else if c == b'\\' {
                escape_next = true;
            } else if c == b'"' {
                quote = Quote::Closed;
            } else {
                self.word.push(c);
            }

            *pos += 1;
        }

        self.word.truncate(word_start);
        self.unterminated(array, quote)
    }

    fn finish_word(&self, word_start: usize, quote: Quote) -> DecodeResult<DecodedValue> {
        let word = &self.word[word_start..];
        if quote == Quote::Bare && word == b"NULL" {
            return Ok(DecodedValue::Null);
        }
        self.elem.decode(&self.request.with_data(word))
    }

    fn unterminated(&self, array: Vec<DecodedValue>, quote: Quote) -> DecodeResult<Vec<DecodedValue>> {
        let reason = if quote == Quote::Open {
            "unterminated quoted element"
        } else {
            "missing closing '}'"
        };

        if self.config.strict_literals {
            return Err(self.malformed(self.input.len(), reason));
        }

        warn!(
            tuple = self.request.tuple,
            field = self.request.field,
            elements = array.len(),
            reason,
            "truncated array literal"
        );
        Ok(array)
    }

    fn malformed(&self, position: usize, reason: &'static str) -> DecodeError {
        DecodeError::MalformedLiteral {
            tuple: self.request.tuple,
            field: self.request.field,
            position,
            reason,
        }
    }
}
