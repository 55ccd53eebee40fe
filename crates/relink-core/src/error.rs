//! Error types for decoding payloads and running migrations.

use thiserror::Error;

/// Errors raised while decoding a serialized payload.
///
/// Every variant carries the byte offset at which the problem was detected.
/// The rewrite engine never surfaces these to its caller: a payload that
/// fails to decode is treated as opaque text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended in the middle of a token.
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof { offset: usize },

    /// The byte at `offset` does not start any known value.
    #[error("unknown tag {tag:?} at byte {offset}")]
    UnknownTag { tag: char, offset: usize },

    /// A specific delimiter was required but something else was found.
    #[error("expected {expected:?} at byte {offset}")]
    Expected { expected: char, offset: usize },

    /// A length, count, integer or float literal did not parse.
    #[error("invalid number at byte {offset}")]
    InvalidNumber { offset: usize },

    /// A declared byte length does not match the content that follows it.
    #[error("declared length {declared} does not match content at byte {offset}")]
    LengthMismatch { declared: usize, offset: usize },

    /// A sequence key was neither an integer nor a byte string.
    #[error("invalid sequence key at byte {offset}")]
    InvalidKey { offset: usize },

    /// Nesting went deeper than [`crate::decoder::MAX_DEPTH`].
    #[error("nesting exceeds {limit} levels at byte {offset}")]
    TooDeep { limit: usize, offset: usize },

    /// A complete value was parsed but input remains.
    #[error("trailing bytes after value at byte {offset}")]
    TrailingBytes { offset: usize },
}

impl DecodeError {
    /// Byte offset where decoding stopped.
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::UnexpectedEof { offset }
            | DecodeError::UnknownTag { offset, .. }
            | DecodeError::Expected { offset, .. }
            | DecodeError::InvalidNumber { offset }
            | DecodeError::LengthMismatch { offset, .. }
            | DecodeError::InvalidKey { offset }
            | DecodeError::TooDeep { offset, .. }
            | DecodeError::TrailingBytes { offset } => *offset,
        }
    }
}

/// Errors that abort a migration run.
///
/// These come from configuration or from the record source and sink; a
/// single field that fails to rewrite never produces one.
#[derive(Error, Debug)]
pub enum RelinkError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Record source failed: {0}")]
    Source(String),

    #[error("Record sink failed: {0}")]
    Sink(String),

    #[error("Worker pool error: {0}")]
    Pool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout relink-core.
pub type Result<T> = std::result::Result<T, RelinkError>;
