//! JSON text to [`Value`] — `spec.md` §4.2–§4.4.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::number::decode_number;
use crate::options::DecodeOptions;
use crate::scanner::Cursor;
use crate::value::{object_insert, Value};

/// Parses `input` as JSON, per `spec.md` §6's `decode(json, all_unicode=False)`.
///
/// `input` must be valid UTF-8; invalid UTF-8 is reported as an
/// [`Error::Decode`] rather than panicking or silently lossy-converting.
/// `spec.md` §9's second Open Question notes that the source library
/// normalizes a Unicode input to bytes via a raw-Unicode-escape pre-pass
/// before scanning; this crate takes the "cleaner reimplementation" path
/// the spec itself recommends and parses UTF-8 bytes directly, treating
/// `\u` only inside JSON string literals.
///
/// # Examples
///
/// ```
/// use quickjson::{decode, DecodeOptions, Value};
///
/// let value = decode(b"[1, 2.0, 3e2, -0]", &DecodeOptions::default()).unwrap();
/// let Value::Array(items) = value else { panic!("expected array") };
/// assert_eq!(items.borrow().len(), 4);
/// ```
pub fn decode(input: &[u8], options: &DecodeOptions) -> Result<Value> {
    match std::str::from_utf8(input) {
        Ok(text) => decode_str(text, options),
        Err(err) => Err(Error::decode(
            format!("input is not valid UTF-8: {err}"),
            err.valid_up_to(),
        )),
    }
}

/// Parses `input` as JSON. Equivalent to [`decode`] but skips the UTF-8
/// validation, since a Rust `&str` is already guaranteed valid.
pub fn decode_str(input: &str, options: &DecodeOptions) -> Result<Value> {
    let mut cursor = Cursor::new(input.as_bytes());
    let value = decode_value(&mut cursor, options, 0)?;
    cursor.skip_spaces();
    if !cursor.is_at_end() {
        return Err(Error::decode(
            "extra data after JSON description",
            cursor.pos(),
        ));
    }
    Ok(value)
}

/// The top-level dispatch of `spec.md` §4.4: skip whitespace, then choose a
/// decoder by lead byte.
fn decode_value(cursor: &mut Cursor<'_>, options: &DecodeOptions, depth: usize) -> Result<Value> {
    cursor.skip_spaces();
    #[cfg(any(test, feature = "fuzzing"))]
    let pos_on_entry = cursor.pos();
    let Some(lead) = cursor.peek() else {
        return Err(Error::decode("empty JSON description", cursor.pos()));
    };
    let result = match lead {
        b'{' => {
            let depth = enter_depth(depth, options.max_depth, cursor.pos(), "object")?;
            decode_object(cursor, options, depth)
        }
        b'[' => {
            let depth = enter_depth(depth, options.max_depth, cursor.pos(), "array")?;
            decode_array(cursor, options, depth)
        }
        b'"' => decode_string(cursor, options.all_unicode),
        b't' | b'f' => decode_bool(cursor),
        b'n' => decode_null(cursor),
        b'N' => decode_nan(cursor),
        b'I' => decode_infinity(cursor),
        b'+' | b'-' => {
            if cursor.peek_at(1) == Some(b'I') {
                decode_infinity(cursor)
            } else {
                decode_number(cursor)
            }
        }
        b'0'..=b'9' => decode_number(cursor),
        _ => Err(cannot_parse(cursor)),
    };
    #[cfg(any(test, feature = "fuzzing"))]
    if result.is_ok() {
        assert!(
            cursor.pos() > pos_on_entry,
            "decode_value must consume at least one byte on success"
        );
    }
    result
}

fn enter_depth(depth: usize, max_depth: usize, pos: usize, kind: &str) -> Result<usize> {
    if depth >= max_depth {
        Err(Error::decode(
            format!("maximum recursion depth exceeded while decoding a JSON {kind}"),
            pos,
        ))
    } else {
        Ok(depth + 1)
    }
}

fn cannot_parse(cursor: &Cursor<'_>) -> Error {
    Error::decode(
        format!(
            "cannot parse JSON description: {}",
            cursor.peek_snippet(20)
        ),
        cursor.pos(),
    )
}

fn decode_null(cursor: &mut Cursor<'_>) -> Result<Value> {
    if cursor.match_keyword(b"null") {
        Ok(Value::Null)
    } else {
        Err(cannot_parse(cursor))
    }
}

fn decode_bool(cursor: &mut Cursor<'_>) -> Result<Value> {
    if cursor.match_keyword(b"true") {
        Ok(Value::Bool(true))
    } else if cursor.match_keyword(b"false") {
        Ok(Value::Bool(false))
    } else {
        Err(cannot_parse(cursor))
    }
}

/// Accepts `Infinity`, `+Infinity`, and `-Infinity` — an extension to
/// strict JSON that `spec.md` §4.2 requires the decoder to tolerate.
fn decode_infinity(cursor: &mut Cursor<'_>) -> Result<Value> {
    if cursor.match_keyword(b"Infinity") {
        Ok(Value::Float(f64::INFINITY))
    } else if cursor.match_keyword(b"+Infinity") {
        Ok(Value::Float(f64::INFINITY))
    } else if cursor.match_keyword(b"-Infinity") {
        Ok(Value::Float(f64::NEG_INFINITY))
    } else {
        Err(cannot_parse(cursor))
    }
}

fn decode_nan(cursor: &mut Cursor<'_>) -> Result<Value> {
    if cursor.match_keyword(b"NaN") {
        Ok(Value::Float(f64::NAN))
    } else {
        Err(cannot_parse(cursor))
    }
}

/// The array state machine of `spec.md` §4.3: `ITEM_OR_CLOSE`, `ITEM`,
/// `COMMA_OR_CLOSE`, `DONE`.
fn decode_array(cursor: &mut Cursor<'_>, options: &DecodeOptions, depth: usize) -> Result<Value> {
    enum State {
        ItemOrClose,
        Item,
        CommaOrClose,
    }

    let start = cursor.pos();
    cursor.advance(); // '['
    let mut items = Vec::new();
    let mut state = State::ItemOrClose;

    loop {
        cursor.skip_spaces();
        let Some(lead) = cursor.peek() else {
            return Err(Error::decode("unterminated array", start));
        };
        match state {
            State::ItemOrClose if lead == b']' => {
                cursor.advance();
                break;
            }
            State::ItemOrClose | State::Item => {
                if lead == b',' || lead == b']' {
                    return Err(Error::decode("expecting array item", cursor.pos()));
                }
                items.push(decode_value(cursor, options, depth)?);
                state = State::CommaOrClose;
            }
            State::CommaOrClose => {
                if lead == b']' {
                    cursor.advance();
                    break;
                } else if lead == b',' {
                    cursor.advance();
                    state = State::Item;
                } else {
                    return Err(Error::decode("expecting ',' or ']'", cursor.pos()));
                }
            }
        }
    }

    Ok(Value::Array(Rc::new(RefCell::new(items))))
}

/// The object state machine of `spec.md` §4.3: `KEY_OR_CLOSE`, `KEY`,
/// `COMMA_OR_CLOSE`, `DONE`. Duplicate keys are last-wins (`spec.md` §3).
fn decode_object(cursor: &mut Cursor<'_>, options: &DecodeOptions, depth: usize) -> Result<Value> {
    enum State {
        KeyOrClose,
        Key,
        CommaOrClose,
    }

    let start = cursor.pos();
    cursor.advance(); // '{'
    let mut pairs = Vec::new();
    let mut state = State::KeyOrClose;

    loop {
        cursor.skip_spaces();
        let Some(lead) = cursor.peek() else {
            return Err(Error::decode("unterminated object", start));
        };
        match state {
            State::KeyOrClose if lead == b'}' => {
                cursor.advance();
                break;
            }
            State::KeyOrClose | State::Key => {
                if lead != b'"' {
                    return Err(Error::decode(
                        "expecting object property name",
                        cursor.pos(),
                    ));
                }
                let Value::String(key) = decode_string(cursor, options.all_unicode)? else {
                    unreachable!("decode_string always returns Value::String")
                };

                cursor.skip_spaces();
                if cursor.peek() != Some(b':') {
                    return Err(Error::decode(
                        "missing colon after object property name",
                        cursor.pos(),
                    ));
                }
                cursor.advance();

                cursor.skip_spaces();
                if matches!(cursor.peek(), Some(b',') | Some(b'}')) {
                    return Err(Error::decode(
                        "expecting object property value",
                        cursor.pos(),
                    ));
                }
                let value = decode_value(cursor, options, depth)?;
                object_insert(&mut pairs, key, value);
                state = State::CommaOrClose;
            }
            State::CommaOrClose => {
                if lead == b'}' {
                    cursor.advance();
                    break;
                } else if lead == b',' {
                    cursor.advance();
                    state = State::Key;
                } else {
                    return Err(Error::decode("expecting ',' or '}'", cursor.pos()));
                }
            }
        }
    }

    Ok(Value::Object(Rc::new(RefCell::new(pairs))))
}

/// The string decoder of `spec.md` §4.2: scan for the closing quote while
/// tracking `escaping`, `has_unicode`, and `string_escape`, then decode the
/// interior with the cheapest path those flags allow.
fn decode_string(cursor: &mut Cursor<'_>, all_unicode: bool) -> Result<Value> {
    let start = cursor.pos();
    cursor.advance(); // opening quote
    let interior_start = cursor.pos();

    let mut escaping = false;
    let mut has_unicode = false;
    let mut string_escape = false;

    loop {
        let Some(b) = cursor.peek() else {
            return Err(Error::decode("unterminated string", start));
        };
        if !escaping {
            if b == b'\\' {
                escaping = true;
            } else if b == b'"' {
                break;
            } else if b >= 0x80 {
                has_unicode = true;
            }
        } else {
            match b {
                b'u' => has_unicode = true,
                b'"' | b'r' | b'n' | b't' | b'b' | b'f' | b'\\' => string_escape = true,
                _ => {}
            }
            escaping = false;
        }
        cursor.advance();
    }

    let raw = cursor.slice_from(interior_start);
    let text = decode_string_interior(raw, has_unicode || all_unicode, string_escape)
        .map_err(|reason| {
            Error::decode(format!("cannot decode string: {reason}"), start)
        })?;
    cursor.advance(); // closing quote

    Ok(Value::String(text))
}

fn decode_string_interior(raw: &[u8], needs_unicode_escapes: bool, string_escape: bool) -> std::result::Result<String, String> {
    // `raw` was sliced out of an already UTF-8-validated cursor, so this can
    // never fail.
    let text = std::str::from_utf8(raw).expect("string body is valid UTF-8");

    if needs_unicode_escapes {
        decode_unicode_escapes(text)
    } else if string_escape {
        decode_simple_escapes(text)
    } else {
        Ok(text.to_owned())
    }
}

fn decode_simple_escapes(text: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            other => return Err(format!("invalid escape {other:?}")),
        }
    }
    Ok(out)
}

/// Handles the same seven simple escapes as [`decode_simple_escapes`], plus
/// `\uXXXX`, including surrogate-pair combination for code points above
/// U+FFFF (`spec.md` §4.2).
fn decode_unicode_escapes(text: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let high = read_hex4(&mut chars)?;
                let scalar = if (0xD800..=0xDBFF).contains(&high) {
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err("expected low surrogate after high surrogate".to_owned());
                    }
                    let low = read_hex4(&mut chars)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return Err("invalid low surrogate".to_owned());
                    }
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                let c = char::from_u32(scalar)
                    .ok_or_else(|| format!("invalid code point U+{scalar:04X}"))?;
                out.push(c);
            }
            other => return Err(format!("invalid escape {other:?}")),
        }
    }
    Ok(out)
}

fn read_hex4(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> std::result::Result<u32, String> {
    let mut value = 0u32;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(|| "truncated \\u escape".to_owned())?;
        value = (value << 4) | digit;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_default(s: &str) -> Result<Value> {
        decode_str(s, &DecodeOptions::default())
    }

    #[test]
    fn whitespace_padded_null() {
        assert_eq!(decode_default("  null  ").unwrap(), Value::Null);
    }

    #[test]
    fn truncated_null_literal_is_an_error() {
        assert!(decode_default("nulx").is_err());
    }

    #[test]
    fn bmp_escape_decodes_to_single_scalar() {
        let Value::String(s) = decode_default(r#""é""#).unwrap() else {
            panic!("expected string")
        };
        assert_eq!(s, "\u{e9}");
        assert_eq!(s.chars().count(), 1);
    }

    #[test]
    fn surrogate_pair_decodes_to_single_scalar_above_bmp() {
        let Value::String(s) = decode_default(r#""𝄞""#).unwrap() else {
            panic!("expected string")
        };
        assert_eq!(s, "\u{1D11E}");
        assert_eq!(s.chars().count(), 1);
    }

    #[test]
    fn array_of_mixed_integer_and_float_literals() {
        let Value::Array(items) = decode_default("[1, 2.0, 3e2, -0]").unwrap() else {
            panic!("expected array")
        };
        let items = items.borrow();
        assert!(matches!(&items[0], Value::Integer(n) if n.to_string() == "1"));
        assert!(matches!(&items[1], Value::Float(f) if *f == 2.0));
        assert!(matches!(&items[2], Value::Float(f) if *f == 300.0));
        assert!(matches!(&items[3], Value::Integer(n) if n.to_string() == "0"));
    }

    #[test]
    fn duplicate_object_keys_are_last_wins() {
        let Value::Object(pairs) = decode_default(r#"{"a":1,"a":2}"#).unwrap() else {
            panic!("expected object")
        };
        let pairs = pairs.borrow();
        assert_eq!(pairs.len(), 1);
        assert!(matches!(&pairs[0], (k, Value::Integer(n)) if k == "a" && n.to_string() == "2"));
    }

    #[test]
    fn trailing_garbage_is_rejected_at_its_position() {
        let err = decode_default("null x").unwrap_err();
        let Error::Decode { offset, .. } = err else {
            panic!("expected Decode error")
        };
        assert_eq!(offset, 5);
    }

    #[test]
    fn whitespace_between_tokens_does_not_change_the_result() {
        let tight = decode_default("[1,2,3]").unwrap();
        let loose = decode_default("[ 1 , 2 , 3 ]").unwrap();
        assert_eq!(tight, loose);
    }

    #[test]
    fn depth_bound_rejects_excess_nesting() {
        let options = DecodeOptions {
            max_depth: 4,
            ..DecodeOptions::default()
        };
        let shallow = "[[[[1]]]]";
        let deep = "[[[[[1]]]]]";
        assert!(decode_str(shallow, &options).is_ok());
        assert!(decode_str(deep, &options).is_err());
    }
}
