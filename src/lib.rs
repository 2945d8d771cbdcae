//! pgdecode - PostgreSQL wire-format value decoders.
//!
//! Converts field payloads from PostgreSQL's binary and text protocols into
//! [`DecodedValue`]s. Decoders are looked up by name in a [`Registry`];
//! array decoders delegate each element to an element decoder, a custom
//! routine, or plain text decoding.
//!
//! ```
//! use pgdecode::{Decode, DecodeRequest, DecodedValue, Namespace, Registry};
//!
//! let registry = Registry::global();
//! let int = registry.get(Namespace::TextSimple, "Integer").unwrap();
//! let array = registry.text_array_of(int);
//!
//! let value = array.decode(&DecodeRequest::text(b"{1,NULL,3}")).unwrap();
//! assert_eq!(
//!     value,
//!     DecodedValue::Array(vec![1i64.into(), DecodedValue::Null, 3i64.into()])
//! );
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod registry;
pub mod row;

#[cfg(feature = "python")]
pub mod python;

pub use config::DecodeConfig;
pub use decoder::{
    CompositeDecoder, CustomDecoder, CustomDecoderBridge, Decode, DecodeRequest, DecodedValue,
    Decoder, Format, SimpleDecoder, TextEncoding,
};
pub use error::{DecodeError, DecodeResult, UserError};
pub use registry::{Namespace, Registry};
pub use row::{ColumnDecoders, DecodedRow};
