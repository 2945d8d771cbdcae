//! PostgreSQL field decoders.
//!
//! This module turns wire-format field payloads into [`DecodedValue`]s:
//! - Binary scalars in network byte order
//! - Text scalars, including escaped bytea
//! - Text array literals, delegating each element to an element decoder
//!
//! Architecture:
//! - `types`: Format codes, text encodings, decoded values
//! - `request`: The per-field `DecodeRequest`
//! - `binary`: Binary scalar decoders
//! - `text`: Text scalar decoders
//! - `array`: Array literal parser
//! - `custom`: Adapter for user-supplied decoding routines
//!
//! Every decoder satisfies the [`Decode`] capability. [`Decoder`] is the
//! closed set of built-in forms: simple leaf decoders and composite decoders
//! that hold an optional, shared element decoder.

pub mod array;
pub mod binary;
pub mod custom;
pub mod request;
pub mod text;
pub mod types;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use crate::config::DecodeConfig;
use crate::error::DecodeResult;

pub use custom::{CustomDecoder, CustomDecoderBridge};
pub use request::DecodeRequest;
pub use types::{DecodedValue, Format, TextEncoding};

/// Signature shared by all leaf decode functions.
pub type DecodeFn = fn(&DecodeRequest<'_>) -> DecodeResult<DecodedValue>;

/// Signature of composite decode functions.
pub type CompositeFn = fn(&CompositeDecoder, &DecodeRequest<'_>) -> DecodeResult<DecodedValue>;

/// The decode capability.
///
/// Implementations are stateless with respect to the request: they never
/// mutate it and may be called from any number of threads at once.
pub trait Decode: Send + Sync {
    /// Name under which the decoder is registered (e.g. `"Integer"`).
    fn name(&self) -> &str;

    fn decode(&self, req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue>;
}

// ============================================================================
// Simple Decoders
// ============================================================================

/// A leaf decoder wrapping a plain function.
#[derive(Clone, Copy)]
pub struct SimpleDecoder {
    name: &'static str,
    format: Format,
    func: DecodeFn,
}

impl SimpleDecoder {
    pub const fn new(name: &'static str, format: Format, func: DecodeFn) -> Self {
        Self { name, format, func }
    }

    /// Wire format this decoder understands.
    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }
}

impl fmt::Debug for SimpleDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleDecoder")
            .field("name", &self.name)
            .field("format", &self.format)
            .finish()
    }
}

impl Decode for SimpleDecoder {
    fn name(&self) -> &str {
        self.name
    }

    #[inline]
    fn decode(&self, req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
        (self.func)(req)
    }
}

// ============================================================================
// Composite Decoders
// ============================================================================

/// A decoder for a structured type that delegates per-element decoding.
///
/// Element resolution order: the element decoder if one is set, then the
/// custom routine if one is set, then plain text decoding.
#[derive(Clone)]
pub struct CompositeDecoder {
    name: &'static str,
    format: Format,
    func: CompositeFn,
    elem: Option<Arc<Decoder>>,
    custom: Option<Arc<CustomDecoderBridge>>,
    config: DecodeConfig,
}

impl CompositeDecoder {
    pub const fn new(name: &'static str, format: Format, func: CompositeFn) -> Self {
        Self {
            name,
            format,
            func,
            elem: None,
            custom: None,
            config: DecodeConfig::new(),
        }
    }

    /// Set the decoder used for each element.
    pub fn with_element(mut self, elem: Arc<Decoder>) -> Self {
        self.elem = Some(elem);
        self
    }

    /// Set a user routine for elements when no element decoder is set.
    pub fn with_custom(mut self, custom: impl Into<Arc<CustomDecoderBridge>>) -> Self {
        self.custom = Some(custom.into());
        self
    }

    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline]
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn element(&self) -> Option<&Arc<Decoder>> {
        self.elem.as_ref()
    }

    pub fn custom(&self) -> Option<&Arc<CustomDecoderBridge>> {
        self.custom.as_ref()
    }

    /// Resolve the element strategy once per decode call.
    pub fn element_decoder(&self) -> &dyn Decode {
        match (&self.elem, &self.custom) {
            (Some(elem), _) => &**elem,
            (None, Some(custom)) => {
                tracing::debug!(
                    decoder = self.name,
                    routine = custom.name(),
                    "elements use custom decoder"
                );
                &**custom
            }
            (None, None) => {
                tracing::debug!(decoder = self.name, "no element decoder, elements decode as text");
                &text::TEXT
            }
        }
    }
}

impl fmt::Debug for CompositeDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeDecoder")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("elem", &self.elem)
            .field("custom", &self.custom)
            .field("config", &self.config)
            .finish()
    }
}

impl Decode for CompositeDecoder {
    fn name(&self) -> &str {
        self.name
    }

    fn decode(&self, req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
        (self.func)(self, req)
    }
}

// ============================================================================
// Decoder
// ============================================================================

/// A built-in decoder: either a leaf or a composite.
#[derive(Debug, Clone)]
pub enum Decoder {
    Simple(SimpleDecoder),
    Composite(CompositeDecoder),
}

impl Decoder {
    #[inline]
    pub fn format(&self) -> Format {
        match self {
            Decoder::Simple(d) => d.format(),
            Decoder::Composite(d) => d.format(),
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeDecoder> {
        match self {
            Decoder::Composite(d) => Some(d),
            Decoder::Simple(_) => None,
        }
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self, Decoder::Composite(_))
    }
}

impl Decode for Decoder {
    fn name(&self) -> &str {
        match self {
            Decoder::Simple(d) => d.name(),
            Decoder::Composite(d) => d.name(),
        }
    }

    #[inline]
    fn decode(&self, req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
        match self {
            Decoder::Simple(d) => d.decode(req),
            Decoder::Composite(d) => d.decode(req),
        }
    }
}

impl From<SimpleDecoder> for Decoder {
    fn from(d: SimpleDecoder) -> Self {
        Decoder::Simple(d)
    }
}

impl From<CompositeDecoder> for Decoder {
    fn from(d: CompositeDecoder) -> Self {
        Decoder::Composite(d)
    }
}
