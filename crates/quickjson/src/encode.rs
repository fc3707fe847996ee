//! [`Value`] to JSON text — `spec.md` §4.5–§4.7.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::options::EncodeOptions;
use crate::value::{ArrayRef, ObjectRef, Opaque, Value};

/// Serializes `value` to JSON text, per `spec.md` §6's
/// `encode(value, default=None, fmt_datetime=None, fmt_date=None, fmt_time=None) -> bytes`.
///
/// The output is always ASCII: every byte above `0x7e` is `\u`-escaped
/// (`spec.md` §4.5's Unicode-string form), so returning `Vec<u8>` rather
/// than `String` costs nothing and matches the source library's `bytes`
/// return type.
///
/// # Examples
///
/// ```
/// use quickjson::{encode, EncodeOptions, Value};
///
/// let value = Value::array_from([Value::Bool(true), Value::Null]);
/// assert_eq!(encode(&value, &mut EncodeOptions::default()).unwrap(), b"[true, null]");
/// ```
pub fn encode(value: &Value, options: &mut EncodeOptions<'_>) -> Result<Vec<u8>> {
    let mut out = String::new();
    let seen = InProgress::default();
    encode_value(value, options, &mut out, &seen, 0)?;
    Ok(out.into_bytes())
}

/// Tracks the identities of containers currently being encoded on the
/// current path, so a self-referential [`Value::Array`]/[`Value::Object`]
/// is caught instead of overflowing the stack (`spec.md` §4.7 step 8,
/// §5's "Cycle rejection", §8 scenario 9). Grounded on `cjson.c`'s
/// `Py_ReprEnter`/`Py_ReprLeave` pair, which marks/unmarks an object for the
/// duration of its own `repr()`-style traversal.
#[derive(Default)]
struct InProgress {
    active: RefCell<HashSet<usize>>,
}

/// Un-marks a container identity when its subtree is done encoding, even if
/// encoding that subtree returned early via `?`.
struct InProgressGuard<'a> {
    seen: &'a InProgress,
    key: usize,
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        self.seen.active.borrow_mut().remove(&self.key);
    }
}

impl InProgress {
    /// Marks `key` as in progress, failing if it already is. The returned
    /// guard un-marks it on drop, covering every early-return path through
    /// the recursive encoder. Takes `&self`, not `&mut self`, so a single
    /// `InProgress` can be threaded through the recursive encoder by shared
    /// reference instead of needing exclusive access at every level.
    fn enter(&self, key: usize) -> Result<InProgressGuard<'_>> {
        if !self.active.borrow_mut().insert(key) {
            return Err(Error::encode("circular reference detected"));
        }
        Ok(InProgressGuard { seen: self, key })
    }
}

fn enter_depth(depth: usize, max_depth: usize) -> Result<usize> {
    if depth >= max_depth {
        Err(Error::encode("maximum recursion depth exceeded"))
    } else {
        Ok(depth + 1)
    }
}

/// The dispatch of `spec.md` §4.7: try each value kind in turn, falling
/// back to `options.default` at most once for anything left unmatched.
fn encode_value(
    value: &Value,
    options: &mut EncodeOptions<'_>,
    out: &mut String,
    seen: &InProgress,
    depth: usize,
) -> Result<()> {
    match value {
        Value::Null => {
            out.push_str("null");
            Ok(())
        }
        Value::Bool(true) => {
            out.push_str("true");
            Ok(())
        }
        Value::Bool(false) => {
            out.push_str("false");
            Ok(())
        }
        Value::Integer(n) => {
            encode_integer(n, out);
            Ok(())
        }
        Value::Float(f) => {
            encode_float(*f, out);
            Ok(())
        }
        Value::String(s) => encode_string(s, out),
        Value::Array(items) => encode_array(items, options, out, seen, depth),
        Value::Object(pairs) => encode_object(pairs, options, out, seen, depth),
        Value::Temporal(t) => {
            let pattern = match t {
                crate::temporal::Temporal::Date(_) => options.resolved_date_format().to_owned(),
                crate::temporal::Temporal::Time(_) => options.resolved_time_format().to_owned(),
                crate::temporal::Temporal::DateTime(_) => options.resolved_datetime_format(),
            };
            let formatted = t.format_with(&pattern)?;
            encode_string(&formatted, out)
        }
        Value::Opaque(opaque) => encode_opaque(opaque, options, out, seen, depth),
    }
}

fn encode_integer(n: &BigInt, out: &mut String) {
    out.push_str(&n.to_string());
}

/// Formats a float per `spec.md` §4.5: the three non-finite tokens, or the
/// shortest round-tripping decimal via [`dtoa`].
///
/// `f64::to_string()` omits the trailing `.0` on a whole-number float (e.g.
/// `2.0.to_string() == "2"`), which would silently turn a `Float` back into
/// what looks like an `Integer` token on the next decode. `dtoa` has the
/// same behavior, so this always checks for a decimal point or exponent
/// marker and appends `.0` when neither is present.
fn encode_float(f: f64, out: &mut String) {
    if f.is_nan() {
        out.push_str("NaN");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        let mut buffer = dtoa::Buffer::new();
        let formatted = buffer.format(f);
        out.push_str(formatted);
        if !formatted.contains(['.', 'e', 'E']) {
            out.push_str(".0");
        }
    }
}

/// Worst-case bytes a single escaped character can expand to: a `\uXXXX`
/// surrogate pair, `\udXXX\udXXX`, 12 bytes.
const MAX_ESCAPE_EXPANSION: usize = 12;

/// Encodes the simple escapes plus `\uXXXX`/surrogate-pair form for
/// everything else (`spec.md` §4.5's "Unicode-string" form). The byte-string
/// form from the source library has no counterpart here: `spec.md` §3
/// collapses both string kinds into one Rust `String`, so there is nothing
/// left to choose the cheaper byte-string escaping for.
///
/// Before scanning, checks that the worst-case escaped size (every byte
/// expanding to a full surrogate-pair escape, plus the two quote bytes)
/// cannot overflow `usize` — `spec.md` §7's `OverflowError`, "output size
/// computation overflows a size type (pathological-size strings)", grounded
/// on `cjson.c`'s `encode_unicode`, which rejects a string with
/// `size > (PY_SSIZE_T_MAX - 2 - 1) / expandsize` before ever allocating an
/// output buffer.
fn encode_string(s: &str, out: &mut String) -> Result<()> {
    if s.len() > (usize::MAX - 2) / MAX_ESCAPE_EXPANSION {
        return Err(Error::Overflow(format!(
            "string of {} bytes is too large to encode",
            s.len()
        )));
    }
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c if (c as u32) < 0x7f => out.push(c),
            c if (c as u32) <= 0xffff => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => {
                // Above the BMP: split into a UTF-16 surrogate pair.
                let v = c as u32 - 0x10000;
                let high = 0xd800 + (v >> 10);
                let low = 0xdc00 + (v & 0x3ff);
                out.push_str(&format!("\\u{high:04x}\\u{low:04x}"));
            }
        }
    }
    out.push('"');
    Ok(())
}

fn encode_array(
    items: &ArrayRef,
    options: &mut EncodeOptions<'_>,
    out: &mut String,
    seen: &InProgress,
    depth: usize,
) -> Result<()> {
    let key = Rc::as_ptr(items) as *const () as usize;
    let _guard = seen.enter(key)?;
    let depth = enter_depth(depth, options.max_depth)?;

    let items = items.borrow();
    if items.is_empty() {
        out.push_str("[]");
        return Ok(());
    }

    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        encode_value(item, options, out, seen, depth)?;
    }
    out.push(']');
    Ok(())
}

fn encode_object(
    pairs: &ObjectRef,
    options: &mut EncodeOptions<'_>,
    out: &mut String,
    seen: &InProgress,
    depth: usize,
) -> Result<()> {
    let key = Rc::as_ptr(pairs) as *const () as usize;
    let _guard = seen.enter(key)?;
    let depth = enter_depth(depth, options.max_depth)?;

    let pairs = pairs.borrow();
    if pairs.is_empty() {
        out.push_str("{}");
        return Ok(());
    }

    out.push('{');
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        encode_string(k, out)?;
        out.push_str(": ");
        encode_value(v, options, out, seen, depth)?;
    }
    out.push('}');
    Ok(())
}

/// Resolves a [`Value::Opaque`] via `options.default`, per `spec.md` §4.7
/// step 10: called at most once, and its result is encoded normally but is
/// itself not eligible for another fallback call (an opaque result from the
/// fallback is a hard error, matching the source's refusal to loop).
fn encode_opaque(
    opaque: &Opaque,
    options: &mut EncodeOptions<'_>,
    out: &mut String,
    seen: &InProgress,
    depth: usize,
) -> Result<()> {
    let Some(fallback) = options.default.as_mut() else {
        return Err(Error::encode(format!(
            "cannot encode value of type {}",
            opaque.description()
        )));
    };
    let resolved = fallback(opaque)?;
    if let Value::Opaque(_) = resolved {
        return Err(Error::encode(format!(
            "default handler returned another unencodable value for {}",
            opaque.description()
        )));
    }
    encode_value(&resolved, options, out, seen, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn encode_default(value: &Value) -> Result<String> {
        encode(value, &mut EncodeOptions::default()).map(|bytes| String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn scalars_match_literal_tokens() {
        assert_eq!(encode_default(&Value::Null).unwrap(), "null");
        assert_eq!(encode_default(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(encode_default(&Value::Bool(false)).unwrap(), "false");
    }

    #[test]
    fn whole_number_float_keeps_its_decimal_point() {
        assert_eq!(encode_default(&Value::Float(2.0)).unwrap(), "2.0");
    }

    #[test]
    fn non_finite_floats_use_literal_tokens() {
        assert_eq!(encode_default(&Value::Float(f64::NAN)).unwrap(), "NaN");
        assert_eq!(
            encode_default(&Value::Float(f64::INFINITY)).unwrap(),
            "Infinity"
        );
        assert_eq!(
            encode_default(&Value::Float(f64::NEG_INFINITY)).unwrap(),
            "-Infinity"
        );
    }

    #[test]
    fn integer_keeps_full_precision() {
        let huge: BigInt = "123456789012345678901234567890".parse().unwrap();
        assert_eq!(
            encode_default(&Value::Integer(huge)).unwrap(),
            "123456789012345678901234567890"
        );
    }

    #[test]
    fn string_escapes_control_and_quote_characters() {
        assert_eq!(
            encode_default(&Value::String("a\"b\\c\nd".to_owned())).unwrap(),
            r#""a\"b\\c\nd""#
        );
    }

    #[test]
    fn non_bmp_character_splits_into_a_surrogate_pair() {
        assert_eq!(
            encode_default(&Value::String("\u{1D11E}".to_owned())).unwrap(),
            r#""\ud834\udd1e""#
        );
    }

    #[test]
    fn empty_containers_use_the_compact_form() {
        assert_eq!(encode_default(&Value::array()).unwrap(), "[]");
        assert_eq!(encode_default(&Value::object()).unwrap(), "{}");
    }

    #[test]
    fn array_items_are_joined_with_comma_space() {
        let value = Value::array_from([Value::Integer(1.into()), Value::Integer(2.into())]);
        assert_eq!(encode_default(&value).unwrap(), "[1, 2]");
    }

    #[test]
    fn object_entries_use_colon_space_and_comma_space() {
        let value = Value::object_from([
            ("a".to_owned(), Value::Integer(1.into())),
            ("b".to_owned(), Value::Integer(2.into())),
        ]);
        assert_eq!(encode_default(&value).unwrap(), r#"{"a": 1, "b": 2}"#);
    }

    #[test]
    fn self_referential_array_is_rejected_not_stack_overflowed() {
        let Value::Array(items) = Value::array() else {
            unreachable!()
        };
        items.borrow_mut().push(Value::Array(items.clone()));
        let err = encode_default(&Value::Array(items)).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn opaque_without_default_handler_is_an_error() {
        let value = Value::Opaque(Opaque::new(42u32, "my_type"));
        let err = encode_default(&value).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn opaque_resolved_through_default_handler() {
        let value = Value::Opaque(Opaque::new(42u32, "my_type"));
        let mut options = EncodeOptions {
            default: Some(Box::new(|opaque: &Opaque| {
                let n = *opaque.downcast_ref::<u32>().unwrap();
                Ok(Value::Integer(BigInt::from(n)))
            })),
            ..EncodeOptions::default()
        };
        assert_eq!(encode(&value, &mut options).unwrap(), b"42");
    }

    #[test]
    fn malformed_temporal_pattern_is_an_encode_error_not_a_panic() {
        use chrono::NaiveDate;

        let value = Value::Temporal(crate::temporal::Temporal::Date(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ));
        let mut options = EncodeOptions {
            fmt_date: "%Q".to_owned(),
            ..EncodeOptions::default()
        };
        let err = encode(&value, &mut options).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn depth_bound_rejects_excess_nesting() {
        let mut innermost = Value::array_from([Value::Integer(1.into())]);
        for _ in 0..10 {
            innermost = Value::array_from([innermost]);
        }
        let mut options = EncodeOptions {
            max_depth: 4,
            ..EncodeOptions::default()
        };
        assert!(encode(&innermost, &mut options).is_err());
    }
}
