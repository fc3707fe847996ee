//! The error taxonomy shared by [`crate::encode`] and [`crate::decode`].

/// Anything that can go wrong encoding or decoding JSON.
///
/// This collapses the source library's `Error` / `EncodeError` /
/// `DecodeError` exception hierarchy into one enum: the two concrete error
/// kinds never carried distinct behavior beyond "is-a `Error`", so Rust's
/// `match` replaces the `isinstance` checks a host would otherwise perform.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The input could not be parsed as JSON.
    #[error("{message} at position {offset}")]
    Decode {
        /// Human-readable description of what went wrong.
        message: String,
        /// Byte offset into the input where the problem was detected.
        offset: usize,
    },

    /// A value could not be represented as JSON.
    #[error("{0}")]
    Encode(String),

    /// A computed output size overflowed `usize`.
    #[error("size computation overflowed: {0}")]
    Overflow(String),
}

impl Error {
    pub(crate) fn decode(message: impl Into<String>, offset: usize) -> Self {
        Error::Decode {
            message: message.into(),
            offset,
        }
    }

    pub(crate) fn encode(message: impl Into<String>) -> Self {
        Error::Encode(message.into())
    }
}

/// Convenience alias matching the crate's two-operation surface.
pub type Result<T> = std::result::Result<T, Error>;
