//! Date/time values accepted by [`crate::encode`].
//!
//! The source library duck-types against Python's `datetime` module,
//! importing `datetime`, `date`, and `time` at module init and calling
//! `.strftime(pattern)` on whichever of the three an encoded value happens
//! to be an instance of (`spec.md` §6). Rust has no runtime-conditional
//! import, so this crate depends on [`chrono`] unconditionally and the
//! "collaborator absent at init" fallback in `spec.md` §4.7 step 10 never
//! triggers here.

use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};

/// A date, time, or datetime value, formatted via an `strftime`-style
/// pattern when encoded (`spec.md` §4.5, "Temporal").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    /// Formatted with [`crate::options::EncodeOptions::fmt_date`].
    Date(NaiveDate),
    /// Formatted with [`crate::options::EncodeOptions::fmt_time`].
    Time(NaiveTime),
    /// Formatted with [`crate::options::EncodeOptions::fmt_datetime`].
    DateTime(NaiveDateTime),
}

impl Temporal {
    /// Formats this value with `pattern`, the Rust analogue of calling
    /// `.strftime(pattern)` on the original's duck-typed collaborator.
    ///
    /// `chrono`'s `DelayedFormat` reports a malformed pattern (an unknown
    /// directive) as a [`fmt::Error`](std::fmt::Error) the first time it is
    /// written out; going through `Display::to_string()` would turn that
    /// into a panic, so this writes into a buffer by hand and maps a
    /// formatting failure to [`crate::Error::Encode`] instead — matching
    /// `spec.md` §7's "temporal formatting failure" `EncodeError` case,
    /// the Rust analogue of CPython's `strftime` raising a catchable
    /// exception for a bad pattern.
    pub fn format_with(&self, pattern: &str) -> Result<String> {
        let mut buf = String::new();
        let written = match self {
            Temporal::Date(d) => write!(buf, "{}", d.format(pattern)),
            Temporal::Time(t) => write!(buf, "{}", t.format(pattern)),
            Temporal::DateTime(dt) => write!(buf, "{}", dt.format(pattern)),
        };
        written
            .map(|()| buf)
            .map_err(|_| Error::encode(format!("invalid strftime pattern: {pattern:?}")))
    }
}

impl From<NaiveDate> for Temporal {
    fn from(d: NaiveDate) -> Self {
        Temporal::Date(d)
    }
}

impl From<NaiveTime> for Temporal {
    fn from(t: NaiveTime) -> Self {
        Temporal::Time(t)
    }
}

impl From<NaiveDateTime> for Temporal {
    fn from(dt: NaiveDateTime) -> Self {
        Temporal::DateTime(dt)
    }
}
