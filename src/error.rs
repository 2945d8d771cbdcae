//! Error types for field decoding.
//!
//! Every variant that can be traced back to a column carries the tuple and
//! field index so callers can locate the offending value in a result set.

use std::num::ParseIntError;
use std::str::Utf8Error;

use thiserror::Error;

use crate::decoder::TextEncoding;

/// Failure raised by a user-supplied decoding routine.
pub type UserError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(
        "wrong data for {decoder} decoder in tuple {tuple} field {field}: length {length}, expected {expected}"
    )]
    InvalidLength {
        decoder: &'static str,
        tuple: usize,
        field: usize,
        length: usize,
        expected: &'static str,
    },

    #[error("invalid integer {text:?} in tuple {tuple} field {field}: {source}")]
    InvalidInteger {
        tuple: usize,
        field: usize,
        text: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid {} text in tuple {tuple} field {field}: {source}", .encoding.pg_name())]
    InvalidText {
        tuple: usize,
        field: usize,
        encoding: TextEncoding,
        #[source]
        source: Utf8Error,
    },

    #[error("malformed array literal in tuple {tuple} field {field} at byte {position}: {reason}")]
    MalformedLiteral {
        tuple: usize,
        field: usize,
        position: usize,
        reason: &'static str,
    },

    #[error("array literal in tuple {tuple} field {field} nests deeper than {limit} levels")]
    NestingTooDeep {
        tuple: usize,
        field: usize,
        limit: usize,
    },

    #[error("invalid data row: {0}")]
    InvalidRow(String),

    /// Raised by a custom decoder; passed through unchanged.
    #[error(transparent)]
    User(UserError),
}

impl DecodeError {
    /// Tuple and field index of the value that failed, when known.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            DecodeError::InvalidLength { tuple, field, .. }
            | DecodeError::InvalidInteger { tuple, field, .. }
            | DecodeError::InvalidText { tuple, field, .. }
            | DecodeError::MalformedLiteral { tuple, field, .. }
            | DecodeError::NestingTooDeep { tuple, field, .. } => Some((*tuple, *field)),
            DecodeError::InvalidRow(_) | DecodeError::User(_) => None,
        }
    }

    /// Check if this error came from a custom decoder.
    #[inline]
    pub fn is_user(&self) -> bool {
        matches!(self, DecodeError::User(_))
    }
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

#[cfg(feature = "python")]
impl From<DecodeError> for pyo3::PyErr {
    fn from(err: DecodeError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};

        match err {
            DecodeError::User(inner) => match inner.downcast::<pyo3::PyErr>() {
                Ok(py_err) => *py_err,
                Err(other) => PyRuntimeError::new_err(other.to_string()),
            },
            DecodeError::InvalidLength { .. } => PyTypeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}
