//! Conversion between Python objects and [`quickjson::Value`].
//!
//! Mirrors the source library's duck-typed dispatch in `encode_object`
//! (`cjson.c`): try the concrete Python types the encoder understands
//! natively, then `datetime`/`date`/`time` by attribute shape, and fall back
//! to [`quickjson::Opaque`] for anything else so the host's `default`
//! callback gets a chance.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyList, PyLong, PyString};

use quickjson::{Opaque, Temporal, Value};

/// Converts a Python object to a [`Value`], without ever raising for a type
/// the encoder cannot represent — those become [`Value::Opaque`] and are
/// resolved later by the caller's `default` handler, if any.
pub fn py_to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(Value::Bool(b.is_true()));
    }
    if let Ok(s) = obj.downcast::<PyString>() {
        return Ok(Value::String(s.to_string()));
    }
    if let Ok(n) = obj.downcast::<PyLong>() {
        let digits: String = n.str()?.to_string();
        let value = BigInt::from_str(&digits)
            .map_err(|err| PyTypeError::new_err(format!("not an integer: {err}")))?;
        return Ok(Value::Integer(value));
    }
    if let Ok(f) = obj.downcast::<PyFloat>() {
        return Ok(Value::Float(f.value()));
    }
    if let Some(temporal) = try_temporal(obj)? {
        return Ok(Value::Temporal(temporal));
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        let mut items = Vec::with_capacity(list.len());
        for item in list.iter() {
            items.push(py_to_value(&item)?);
        }
        return Ok(Value::array_from(items));
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let mut pairs = Vec::with_capacity(dict.len());
        for (key, value) in dict.iter() {
            let key = key
                .downcast::<PyString>()
                .map_err(|_| PyTypeError::new_err("object keys must be strings"))?
                .to_string();
            pairs.push((key, py_to_value(&value)?));
        }
        return Ok(Value::object_from(pairs));
    }

    Ok(Value::Opaque(Opaque::new(
        obj.clone().unbind(),
        obj.get_type().name()?.to_string(),
    )))
}

/// Recognizes `datetime.datetime`/`datetime.date`/`datetime.time` instances
/// by isinstance check against the `datetime` module's classes, since
/// `datetime.datetime` is itself a `datetime.date` subclass and must be
/// checked first.
fn try_temporal(obj: &Bound<'_, PyAny>) -> PyResult<Option<Temporal>> {
    let py = obj.py();
    let datetime_mod = PyModule::import(py, "datetime")?;

    let datetime_cls = datetime_mod.getattr("datetime")?;
    if obj.is_instance(&datetime_cls)? {
        let date = naive_date_from(obj)?;
        let time = naive_time_from(obj)?;
        return Ok(Some(Temporal::DateTime(NaiveDateTime::new(date, time))));
    }

    let date_cls = datetime_mod.getattr("date")?;
    if obj.is_instance(&date_cls)? {
        return Ok(Some(Temporal::Date(naive_date_from(obj)?)));
    }

    let time_cls = datetime_mod.getattr("time")?;
    if obj.is_instance(&time_cls)? {
        return Ok(Some(Temporal::Time(naive_time_from(obj)?)));
    }

    Ok(None)
}

fn naive_date_from(obj: &Bound<'_, PyAny>) -> PyResult<NaiveDate> {
    let year: i32 = obj.getattr("year")?.extract()?;
    let month: u32 = obj.getattr("month")?.extract()?;
    let day: u32 = obj.getattr("day")?.extract()?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| PyValueError::new_err("invalid date"))
}

fn naive_time_from(obj: &Bound<'_, PyAny>) -> PyResult<NaiveTime> {
    let hour: u32 = obj.getattr("hour")?.extract()?;
    let minute: u32 = obj.getattr("minute")?.extract()?;
    let second: u32 = obj.getattr("second")?.extract()?;
    let microsecond: u32 = obj.getattr("microsecond")?.extract()?;
    NaiveTime::from_hms_micro_opt(hour, minute, second, microsecond)
        .ok_or_else(|| PyValueError::new_err("invalid time"))
}

/// Converts a decoded [`Value`] to a Python object. Never produces
/// `Temporal`/`Opaque` input, since [`quickjson::decode`] never returns
/// those variants.
pub fn value_to_py(py: Python<'_>, value: &Value) -> PyResult<Py<PyAny>> {
    match value {
        Value::Null => Ok(py.None()),
        Value::Bool(b) => Ok((*b).into_py(py)),
        Value::Integer(n) => Ok(n.clone().into_py(py)),
        Value::Float(f) => Ok((*f).into_py(py)),
        Value::String(s) => Ok(s.as_str().into_py(py)),
        Value::Array(items) => {
            let list = PyList::empty(py);
            for item in items.borrow().iter() {
                list.append(value_to_py(py, item)?)?;
            }
            Ok(list.into_py(py))
        }
        Value::Object(pairs) => {
            let dict = PyDict::new(py);
            for (key, value) in pairs.borrow().iter() {
                dict.set_item(key, value_to_py(py, value)?)?;
            }
            Ok(dict.into_py(py))
        }
        Value::Temporal(_) | Value::Opaque(_) => {
            unreachable!("decode never produces Temporal or Opaque values")
        }
    }
}
