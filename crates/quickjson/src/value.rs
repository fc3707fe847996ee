//! The JSON value tree shared by [`crate::decode`] and [`crate::encode`].

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;

use crate::temporal::Temporal;

/// Backing storage for [`Value::Array`].
///
/// Arrays are reference-counted and interior-mutable, not a bare `Vec`,
/// so that a host can build a self-referential array and hand it to
/// [`crate::encode`] — see the "Cycle rejection" property and scenario 9 in
/// `spec.md` §8. A plain owned `Vec<Value>` cannot alias itself in safe
/// Rust, so there would be nothing for [`crate::encode`]'s cycle detector to
/// ever catch.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Backing storage for [`Value::Object`].
///
/// A `Vec` of pairs rather than a map: `spec.md` §3 only requires
/// last-wins behavior on duplicate keys during decode (implemented by
/// scanning on insert), and §9's "Mapping order" note explicitly says no
/// test should rely on encoded key order, so there is nothing a `HashMap`
/// or `BTreeMap` would buy here over the simpler, cycle-capable `Rc<RefCell<_>>`
/// wrapper this type needs anyway.
pub type ObjectRef = Rc<RefCell<Vec<(String, Value)>>>;

/// A value the encoder does not natively understand.
///
/// Carries a description captured at construction time (the Rust analogue
/// of Python's `repr(object)`) so that [`crate::Error::Encode`] messages can
/// name the offending value without requiring `Value` itself to be generic
/// over a `Debug` bound.
#[derive(Clone)]
pub struct Opaque {
    description: String,
    payload: Rc<dyn Any>,
}

impl Opaque {
    /// Wraps `payload`, capturing `description` for error messages.
    pub fn new<T: Any>(payload: T, description: impl Into<String>) -> Self {
        Opaque {
            description: description.into(),
            payload: Rc::new(payload),
        }
    }

    /// Attempts to recover the concrete type passed to [`Opaque::new`].
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }

    /// The description captured at construction time.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.description).finish()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.payload, &other.payload)
    }
}

/// A JSON value as defined by [RFC 8259], extended with the non-finite
/// float tokens, arbitrary-precision integers, and host-only arms this
/// codec's spec adds on top of strict JSON.
///
/// - [`Value::Integer`] and [`Value::Float`] stay distinct across a
///   decode/encode round trip: a token containing `.`, `e`, or `E` decodes
///   to `Float`, anything else to `Integer` (`spec.md` §3).
/// - [`Value::Temporal`] and [`Value::Opaque`] are encode-only inputs; the
///   decoder never produces them.
///
/// [RFC 8259]: https://datatracker.ietf.org/doc/html/rfc8259
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// An arbitrary-precision signed integer, decoded from any numeral
    /// without a `.`, `e`, or `E`.
    Integer(BigInt),
    /// An IEEE-754 double, including the non-finite extension tokens
    /// `Infinity`, `-Infinity`, and `NaN`.
    Float(f64),
    /// A string of Unicode scalar values.
    String(String),
    /// An ordered, cycle-capable sequence of values. See [`ArrayRef`].
    Array(ArrayRef),
    /// A string-keyed, cycle-capable, last-wins mapping. See [`ObjectRef`].
    Object(ObjectRef),
    /// A date, time, or datetime formatted via `strftime`-style patterns on
    /// encode. Never produced by decode.
    Temporal(Temporal),
    /// A host value with no direct JSON representation, resolved at most
    /// once via [`crate::options::EncodeOptions::default`]. Never produced
    /// by decode.
    Opaque(Opaque),
}

impl Value {
    /// Builds an empty [`Value::Array`].
    #[must_use]
    pub fn array() -> Self {
        Value::Array(Rc::new(RefCell::new(Vec::new())))
    }

    /// Builds a [`Value::Array`] from an iterator of values.
    pub fn array_from(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// Builds an empty [`Value::Object`].
    #[must_use]
    pub fn object() -> Self {
        Value::Object(Rc::new(RefCell::new(Vec::new())))
    }

    /// Builds a [`Value::Object`] from an iterator of key/value pairs,
    /// keeping the last value for any repeated key (matching the decoder's
    /// last-wins behavior on duplicate keys).
    pub fn object_from(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut pairs: Vec<(String, Value)> = Vec::new();
        for (key, value) in entries {
            object_insert(&mut pairs, key, value);
        }
        Value::Object(Rc::new(RefCell::new(pairs)))
    }

    /// Returns `true` if the value is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` if the value is [`Value::Bool`].
    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(..))
    }

    /// Returns `true` if the value is [`Value::Integer`] or [`Value::Float`].
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(..) | Value::Float(..))
    }

    /// Returns `true` if the value is [`Value::String`].
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(..))
    }

    /// Returns `true` if the value is [`Value::Array`].
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(..))
    }

    /// Returns `true` if the value is [`Value::Object`].
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(..))
    }

    /// Returns the string slice if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Inserts `key`/`value` into `pairs`, overwriting any existing entry for
/// `key` in place (last-wins) rather than appending a duplicate.
pub(crate) fn object_insert(pairs: &mut Vec<(String, Value)>, key: String, value: Value) {
    if let Some(slot) = pairs.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        pairs.push((key, value));
    }
}
