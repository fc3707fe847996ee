//! A JSON encoder/decoder built around an explicit [`Value`] tree, with
//! arbitrary-precision integers, IEEE-754 floats with the non-finite
//! extension tokens, and host-defined datetime and fallback-value support.
//!
//! This crate decodes a complete, in-memory byte range to a [`Value`] and
//! encodes a [`Value`] back to a complete, always-ASCII byte buffer in one
//! call each; it does not offer incremental/streaming parsing.

#![allow(missing_docs)]

mod decode;
mod encode;
mod error;
mod number;
mod options;
mod scanner;
mod temporal;
mod value;

pub use decode::{decode, decode_str};
pub use encode::encode;
pub use error::{Error, Result};
pub use options::{DecodeOptions, EncodeOptions, Fallback, MAX_DEPTH};
pub use temporal::Temporal;
pub use value::{ArrayRef, ObjectRef, Opaque, Value};
