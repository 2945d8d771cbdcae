//! Python bindings.
//!
//! Python callables can act as custom element decoders, and decoded values
//! are handed back as native Python objects.

use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyFloat, PyInt, PyList, PyString, PyTuple};

use crate::config::DecodeConfig;
use crate::decoder::{array, CustomDecoder, CustomDecoderBridge, Decode, DecodeRequest, DecodedValue, TextEncoding};
use crate::error::UserError;
use crate::registry::{Namespace, Registry};

/// A Python callable `(text, tuple, field) -> object` used as a custom decoder.
///
/// Exceptions raised by the callable are carried through unchanged and
/// re-raised as-is when the error reaches Python again.
pub struct PyCustomDecoder {
    callable: PyObject,
}

impl PyCustomDecoder {
    pub fn new(callable: PyObject) -> Self {
        Self { callable }
    }
}

impl CustomDecoder for PyCustomDecoder {
    fn call(&self, text: String, tuple: usize, field: usize) -> Result<DecodedValue, UserError> {
        Python::with_gil(|py| {
            let ret = self.callable.call1(py, (text, tuple, field))?;
            py_to_decoded(ret.bind(py))
        })
        .map_err(|e| Box::new(e) as UserError)
    }
}

/// Convert a Python object returned by a callback into a decoded value.
fn py_to_decoded(obj: &Bound<'_, PyAny>) -> PyResult<DecodedValue> {
    if obj.is_none() {
        return Ok(DecodedValue::Null);
    }
    // bool first: Python bools are ints
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(DecodedValue::Bool(b.is_true()));
    }
    if obj.is_instance_of::<PyInt>() {
        return Ok(DecodedValue::Int(obj.extract::<i64>()?));
    }
    if obj.is_instance_of::<PyFloat>() {
        return Ok(DecodedValue::Float(obj.extract::<f64>()?));
    }
    if let Ok(s) = obj.downcast::<PyString>() {
        return Ok(DecodedValue::Text(s.to_str()?.to_owned()));
    }
    if let Ok(b) = obj.downcast::<PyBytes>() {
        return Ok(DecodedValue::Bytes(b.as_bytes().to_vec()));
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return list
            .iter()
            .map(|item| py_to_decoded(&item))
            .collect::<PyResult<Vec<_>>>()
            .map(DecodedValue::Array);
    }
    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        return tuple
            .iter()
            .map(|item| py_to_decoded(&item))
            .collect::<PyResult<Vec<_>>>()
            .map(DecodedValue::Array);
    }
    Err(PyTypeError::new_err(format!(
        "custom decoder returned unsupported type {}",
        obj.get_type().name()?
    )))
}

/// Convert a decoded value to a Python object.
pub fn decoded_value_to_py(py: Python<'_>, value: &DecodedValue) -> PyResult<PyObject> {
    Ok(match value {
        DecodedValue::Null => py.None(),
        DecodedValue::Bool(b) => b.to_object(py),
        DecodedValue::Int(i) => i.to_object(py),
        DecodedValue::Float(f) => f.to_object(py),
        DecodedValue::Bytes(b) => PyBytes::new(py, b).into_any().unbind(),
        DecodedValue::Text(s) => s.to_object(py),
        DecodedValue::Array(items) => {
            let items = items
                .iter()
                .map(|item| decoded_value_to_py(py, item))
                .collect::<PyResult<Vec<_>>>()?;
            PyList::new(py, items)?.into_any().unbind()
        }
    })
}

fn parse_encoding(name: &str) -> PyResult<TextEncoding> {
    TextEncoding::from_pg_name(name)
        .ok_or_else(|| PyValueError::new_err(format!("Unsupported encoding: {}", name)))
}

/// Decode a single field with a registered decoder, e.g.
/// `decode("BinaryDecoder.Simple", "Integer", b"\x00\x2a")`.
#[pyfunction]
#[pyo3(signature = (namespace, name, data, tuple=0, field=0, encoding="UTF8"))]
fn decode(
    py: Python<'_>,
    namespace: &str,
    name: &str,
    data: &[u8],
    tuple: usize,
    field: usize,
    encoding: &str,
) -> PyResult<PyObject> {
    let ns = Namespace::from_path(namespace)
        .ok_or_else(|| PyValueError::new_err(format!("Unknown namespace: {}", namespace)))?;
    let decoder = Registry::global()
        .get(ns, name)
        .ok_or_else(|| PyValueError::new_err(format!("Unknown decoder: {}.{}", namespace, name)))?;

    let mut req = DecodeRequest::text(data)
        .at(tuple, field)
        .with_encoding(parse_encoding(encoding)?);
    req.format = decoder.format();

    let value = decoder.decode(&req)?;
    decoded_value_to_py(py, &value)
}

/// Decode a text array literal.
///
/// `elem` names a `TextDecoder.Simple` element decoder. Without one,
/// `callback(text, tuple, field)` is called for each non-NULL element if
/// given; otherwise elements are returned as strings.
#[pyfunction]
#[pyo3(signature = (data, elem=None, callback=None, tuple=0, field=0, encoding="UTF8", strict=true))]
#[allow(clippy::too_many_arguments)]
fn decode_text_array(
    py: Python<'_>,
    data: &[u8],
    elem: Option<&str>,
    callback: Option<PyObject>,
    tuple: usize,
    field: usize,
    encoding: &str,
    strict: bool,
) -> PyResult<PyObject> {
    let mut decoder = array::ARRAY.with_config(DecodeConfig::new().strict_literals(strict));

    if let Some(name) = elem {
        let elem = Registry::global()
            .get(Namespace::TextSimple, name)
            .ok_or_else(|| PyValueError::new_err(format!("Unknown text decoder: {}", name)))?;
        decoder = decoder.with_element(elem);
    }
    if let Some(callback) = callback {
        decoder = decoder.with_custom(CustomDecoderBridge::new(PyCustomDecoder::new(callback)));
    }

    let req = DecodeRequest::text(data)
        .at(tuple, field)
        .with_encoding(parse_encoding(encoding)?);
    let value = decoder.decode(&req)?;
    decoded_value_to_py(py, &value)
}

/// pgdecode - PostgreSQL wire-format value decoders
#[pymodule]
pub fn pgdecode(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(decode, m)?)?;
    m.add_function(wrap_pyfunction!(decode_text_array, m)?)?;
    Ok(())
}
