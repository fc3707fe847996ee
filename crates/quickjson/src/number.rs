//! The number grammar and literal-to-value conversion from `spec.md` §4.2.

use num_bigint::BigInt;
use std::str::FromStr;

use crate::scanner::Cursor;
use crate::value::Value;
use crate::Error;

/// Validates and consumes a JSON number at the cursor, per the grammar in
/// `spec.md` §4.2:
///
/// 1. optional `-` or `+`
/// 2. integer part: `0` alone, or a non-zero digit followed by digits
/// 3. optional fraction: `.` followed by one or more digits
/// 4. optional exponent: `e`/`E`, optional sign, one or more digits
///
/// Returns the decoded [`Value`] (`Integer` if neither fraction nor
/// exponent were present, `Float` otherwise). A structurally invalid
/// number and a structurally valid number that fails to convert (e.g. an
/// exponent so large the float overflows to infinity, which this crate
/// chooses to accept rather than reject — `f64::from_str` never fails for
/// a syntactically valid float literal) both surface as the same
/// `"invalid number starting at position N"` [`Error::Decode`], matching
/// `cjson.c`'s `decode_number`, which `goto`s the same `number_error` label
/// whether the initial scan or the subsequent `PyFloat_FromString`/
/// `PyInt_FromString` call fails.
pub(crate) fn decode_number(cursor: &mut Cursor<'_>) -> Result<Value, Error> {
    let start = cursor.pos();

    let is_float = scan_number(cursor).ok_or_else(|| number_error(start))?;

    let text = std::str::from_utf8(cursor.slice_from(start))
        .map_err(|_| number_error(start))?;

    if is_float {
        f64::from_str(text)
            .map(Value::Float)
            .map_err(|_| number_error(start))
    } else {
        BigInt::from_str(text)
            .map(Value::Integer)
            .map_err(|_| number_error(start))
    }
}

fn number_error(start: usize) -> Error {
    Error::decode("invalid number", start)
}

/// Scans a number's grammar from the cursor, advancing past it.
///
/// Returns `Some(is_float)` on a structurally valid number, or `None`
/// (cursor position left wherever the mismatch happened) on failure.
fn scan_number(cursor: &mut Cursor<'_>) -> Option<bool> {
    if matches!(cursor.peek(), Some(b'-') | Some(b'+')) {
        cursor.advance();
    }

    match cursor.peek() {
        Some(b'0') => {
            cursor.advance();
            if matches!(cursor.peek(), Some(b) if b.is_ascii_digit()) {
                return None;
            }
        }
        Some(b) if b.is_ascii_digit() => cursor.skip_digits(),
        _ => return None,
    }

    let mut is_float = false;

    if cursor.peek() == Some(b'.') {
        is_float = true;
        cursor.advance();
        if !matches!(cursor.peek(), Some(b) if b.is_ascii_digit()) {
            return None;
        }
        cursor.skip_digits();
    }

    if matches!(cursor.peek(), Some(b'e') | Some(b'E')) {
        is_float = true;
        cursor.advance();
        if matches!(cursor.peek(), Some(b'+') | Some(b'-')) {
            cursor.advance();
        }
        if !matches!(cursor.peek(), Some(b) if b.is_ascii_digit()) {
            return None;
        }
        cursor.skip_digits();
    }

    Some(is_float)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Result<Value, Error> {
        let mut cursor = Cursor::new(s.as_bytes());
        decode_number(&mut cursor)
    }

    #[test]
    fn integer_zero_alone() {
        assert_eq!(decode("0").unwrap(), Value::Integer(BigInt::from(0)));
    }

    #[test]
    fn rejects_leading_zero_followed_by_digit() {
        assert!(decode("01").is_err());
    }

    #[test]
    fn negative_zero_is_integer_zero() {
        assert_eq!(decode("-0").unwrap(), Value::Integer(BigInt::from(0)));
    }

    #[test]
    fn fraction_makes_float() {
        assert_eq!(decode("2.0").unwrap(), Value::Float(2.0));
    }

    #[test]
    fn exponent_makes_float() {
        assert_eq!(decode("3e2").unwrap(), Value::Float(300.0));
    }

    #[test]
    fn bare_dot_is_rejected() {
        assert!(decode("1.").is_err());
    }

    #[test]
    fn bare_exponent_sign_is_rejected() {
        assert!(decode("1e+").is_err());
    }

    #[test]
    fn arbitrary_precision_integer_round_trips_exactly() {
        let literal = "123456789012345678901234567890";
        match decode(literal).unwrap() {
            Value::Integer(n) => assert_eq!(n.to_string(), literal),
            other => panic!("expected Integer, got {other:?}"),
        }
    }
}
