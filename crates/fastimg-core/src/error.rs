//! Pipeline-level error type.
//!
//! Each concern keeps its own small error enum (`SourceError`, `DecodeError`,
//! `EncodeError`); this module aggregates them into the single error type the
//! pipeline operations return. Nothing is retried anywhere: a failing decode
//! or encode rejects the enclosing operation and the surface is left in
//! whatever state the failing step produced.

use thiserror::Error;

use crate::codec::{DecodeError, EncodeError};
use crate::source::SourceError;

/// Errors produced by pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input reference could not be resolved to a decodable URI.
    #[error("unsupported image source: {0}")]
    UnsupportedSource(#[from] SourceError),

    /// The underlying decode rejected. Fatal to the enclosing operation.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The intermediate or final encode rejected.
    #[error("encode failed: {0}")]
    Encode(#[from] EncodeError),

    /// An operation was invoked before `ready()` resolved.
    ///
    /// This is a caller contract violation; it is surfaced as an error rather
    /// than silently operating on an absent surface.
    #[error("pipeline is not ready: call ready() before any other operation")]
    NotReady,
}
