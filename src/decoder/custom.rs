//! Bridge from user-supplied decoding routines to the [`Decode`] capability.
//!
//! A routine receives the element text (already decoded in the request's
//! text encoding) together with the tuple and field index. Whatever error it
//! returns reaches the caller unchanged as [`DecodeError::User`].

use std::fmt;
use std::sync::Arc;

use crate::error::{DecodeError, DecodeResult, UserError};

use super::request::DecodeRequest;
use super::text::decode_string;
use super::types::DecodedValue;
use super::Decode;

/// A user-level decoding routine.
pub trait CustomDecoder: Send + Sync {
    fn call(&self, text: String, tuple: usize, field: usize) -> Result<DecodedValue, UserError>;
}

impl<F> CustomDecoder for F
where
    F: Fn(String, usize, usize) -> Result<DecodedValue, UserError> + Send + Sync,
{
    fn call(&self, text: String, tuple: usize, field: usize) -> Result<DecodedValue, UserError> {
        self(text, tuple, field)
    }
}

/// Adapts a [`CustomDecoder`] into a decoder.
#[derive(Clone)]
pub struct CustomDecoderBridge {
    name: String,
    routine: Arc<dyn CustomDecoder>,
}

impl CustomDecoderBridge {
    pub fn new(routine: impl CustomDecoder + 'static) -> Self {
        Self::from_arc(Arc::new(routine))
    }

    /// Wrap a closure; its signature is inferred from this bound.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(String, usize, usize) -> Result<DecodedValue, UserError> + Send + Sync + 'static,
    {
        Self::new(f)
    }

    pub fn from_arc(routine: Arc<dyn CustomDecoder>) -> Self {
        Self {
            name: "Custom".to_string(),
            routine,
        }
    }

    /// Set the name reported in diagnostics.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl fmt::Debug for CustomDecoderBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomDecoderBridge")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Decode for CustomDecoderBridge {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, req: &DecodeRequest<'_>) -> DecodeResult<DecodedValue> {
        let text = decode_string(req)?;
        self.routine
            .call(text, req.tuple, req.field)
            .map_err(DecodeError::User)
    }
}
