//! Python bindings exposing [`quickjson::encode`]/[`quickjson::decode`] as a
//! `quickjson` extension module, registering the `Error`/`EncodeError`/
//! `DecodeError` exception hierarchy the way `cjson.c`'s `initcjson` does.

mod convert;

use pyo3::create_exception;
use pyo3::exceptions::PyException;
use pyo3::prelude::*;

use convert::{py_to_value, value_to_py};
use quickjson::{DecodeOptions, EncodeOptions, Opaque};

create_exception!(
    quickjson,
    Error,
    PyException,
    "Base exception for quickjson encode/decode failures."
);
create_exception!(
    quickjson,
    EncodeError,
    Error,
    "Raised when a value cannot be represented as JSON."
);
create_exception!(
    quickjson,
    DecodeError,
    Error,
    "Raised when input text is not valid JSON."
);

fn to_py_err(err: quickjson::Error) -> PyErr {
    match err {
        quickjson::Error::Decode { .. } => DecodeError::new_err(err.to_string()),
        quickjson::Error::Encode(_) | quickjson::Error::Overflow(_) => {
            EncodeError::new_err(err.to_string())
        }
    }
}

/// `encode(value, default=None, fmt_datetime=None, fmt_date=None, fmt_time=None)`.
#[pyfunction]
#[pyo3(signature = (value, default=None, fmt_datetime=None, fmt_date=None, fmt_time=None))]
fn encode(
    value: Bound<'_, PyAny>,
    default: Option<Py<PyAny>>,
    fmt_datetime: Option<String>,
    fmt_date: Option<String>,
    fmt_time: Option<String>,
) -> PyResult<Vec<u8>> {
    let root = py_to_value(&value)?;

    let mut options = EncodeOptions::default();
    if let Some(pattern) = fmt_datetime {
        options.fmt_datetime = pattern;
    }
    if let Some(pattern) = fmt_date {
        options.fmt_date = pattern;
    }
    if let Some(pattern) = fmt_time {
        options.fmt_time = pattern;
    }
    if let Some(callback) = default {
        options.default = Some(Box::new(move |opaque: &Opaque| {
            let host = opaque
                .downcast_ref::<Py<PyAny>>()
                .expect("opaque values constructed by py_to_value always wrap Py<PyAny>");
            Python::with_gil(|py| {
                let resolved = callback
                    .call1(py, (host.clone_ref(py),))
                    .map_err(|err| quickjson::Error::Encode(err.to_string()))?;
                py_to_value(resolved.bind(py)).map_err(|err| quickjson::Error::Encode(err.to_string()))
            })
        }));
    }

    quickjson::encode(&root, &mut options).map_err(to_py_err)
}

/// `decode(text, all_unicode=False)`.
#[pyfunction]
#[pyo3(signature = (text, all_unicode=false))]
fn decode(py: Python<'_>, text: &str, all_unicode: bool) -> PyResult<Py<PyAny>> {
    let options = DecodeOptions {
        all_unicode,
        ..DecodeOptions::default()
    };
    let value = quickjson::decode_str(text, &options).map_err(to_py_err)?;
    value_to_py(py, &value)
}

#[pymodule]
fn quickjson(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("Error", py.get_type::<Error>())?;
    m.add("EncodeError", py.get_type::<EncodeError>())?;
    m.add("DecodeError", py.get_type::<DecodeError>())?;
    m.add_function(wrap_pyfunction!(encode, m)?)?;
    m.add_function(wrap_pyfunction!(decode, m)?)?;
    Ok(())
}
