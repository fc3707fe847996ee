//! Configuration options for [`crate::decode`] and [`crate::encode`].

use crate::value::Opaque;
use crate::Value;

/// Default recursion bound enforced on container entry by both the decoder
/// and the encoder (`spec.md` §4.4/§5 require *a* bound but leave the value
/// unspecified; the original leans on the host's stack-guard facility, which
/// Rust has no equivalent of).
pub const MAX_DEPTH: usize = 512;

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Options controlling [`crate::decode`].
///
/// # Examples
///
/// ```
/// use quickjson::{decode, DecodeOptions};
///
/// let value = decode(br#"{"a": 1}"#, &DecodeOptions::default()).unwrap();
/// assert!(value.is_object());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// When `true`, every decoded string is treated as if it required full
    /// Unicode-escape handling, regardless of whether it actually contains
    /// non-ASCII bytes or `\u` escapes.
    ///
    /// Since [`Value::String`] is always a Rust `String` (always valid
    /// Unicode), this flag no longer changes the *type* of the result the
    /// way it did in the source library's byte-string/Unicode-string split.
    /// It still forces the decoder down the `\u`-escape-aware string path
    /// rather than the cheaper verbatim/simple-escape paths, matching the
    /// source's `has_unicode || all_unicode` branch.
    ///
    /// # Default
    ///
    /// `false`
    pub all_unicode: bool,

    /// Maximum container nesting depth accepted before decoding fails with
    /// [`crate::Error::Decode`].
    ///
    /// # Default
    ///
    /// [`MAX_DEPTH`]
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            all_unicode: false,
            max_depth: MAX_DEPTH,
        }
    }
}

/// Fallback invoked for [`Value::Opaque`] values during encoding.
///
/// Called at most once per opaque value; its result is re-dispatched through
/// the encoder but is not itself eligible for another fallback call (an
/// opaque result from the fallback is a hard [`crate::Error::Encode`]).
pub type Fallback<'a> = dyn FnMut(&Opaque) -> crate::Result<Value> + 'a;

/// Options controlling [`crate::encode`].
///
/// `fmt_date` and `fmt_time` default to `"%Y-%m-%d"` and `"%H:%M:%S"`; an
/// empty `fmt_datetime` is composed from the (possibly just-defaulted)
/// `fmt_date` and `fmt_time` joined by a space, in that order — see
/// [`EncodeOptions::resolved_datetime_format`].
pub struct EncodeOptions<'a> {
    /// Invoked once for each [`Value::Opaque`] encountered, in place of the
    /// source library's optional `default` callable.
    pub default: Option<Box<Fallback<'a>>>,

    /// `strftime`-style pattern for [`crate::temporal::Temporal::DateTime`].
    /// Empty string composes `fmt_date + " " + fmt_time`.
    pub fmt_datetime: String,

    /// `strftime`-style pattern for [`crate::temporal::Temporal::Date`].
    /// Empty string defaults to `"%Y-%m-%d"`.
    pub fmt_date: String,

    /// `strftime`-style pattern for [`crate::temporal::Temporal::Time`].
    /// Empty string defaults to `"%H:%M:%S"`.
    pub fmt_time: String,

    /// Maximum container nesting depth accepted before encoding fails with
    /// [`crate::Error::Encode`].
    ///
    /// # Default
    ///
    /// [`MAX_DEPTH`]
    pub max_depth: usize,
}

impl<'a> Default for EncodeOptions<'a> {
    fn default() -> Self {
        EncodeOptions {
            default: None,
            fmt_datetime: String::new(),
            fmt_date: String::new(),
            fmt_time: String::new(),
            max_depth: MAX_DEPTH,
        }
    }
}

impl<'a> EncodeOptions<'a> {
    /// Resolves `fmt_date`, falling back to `"%Y-%m-%d"` when empty.
    pub(crate) fn resolved_date_format(&self) -> &str {
        if self.fmt_date.is_empty() {
            DEFAULT_DATE_FORMAT
        } else {
            &self.fmt_date
        }
    }

    /// Resolves `fmt_time`, falling back to `"%H:%M:%S"` when empty.
    pub(crate) fn resolved_time_format(&self) -> &str {
        if self.fmt_time.is_empty() {
            DEFAULT_TIME_FORMAT
        } else {
            &self.fmt_time
        }
    }

    /// Resolves `fmt_datetime`. An empty pattern is composed from the
    /// *already-resolved* date and time formats, joined by a space — this
    /// order (default date/time first, then compose) matches the source
    /// library's `JSON_encode`, which defaults `fmt_date`/`fmt_time` before
    /// using them to build a default `fmt_datetime`.
    pub(crate) fn resolved_datetime_format(&self) -> String {
        if self.fmt_datetime.is_empty() {
            format!(
                "{} {}",
                self.resolved_date_format(),
                self.resolved_time_format()
            )
        } else {
            self.fmt_datetime.clone()
        }
    }
}
