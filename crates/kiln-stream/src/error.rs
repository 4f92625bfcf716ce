//! Error types for stream decoding

use thiserror::Error;

/// Errors that can occur while decoding from a [`Source`](crate::Source)
///
/// Encoding is infallible; only the read side can observe a malformed or
/// short byte sequence. All variants are terminal for the current decode:
/// the cursor position after a failed read is unspecified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The source ran out of bytes mid-value
    #[error("source truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the decoder asked for
        needed: usize,
        /// Bytes left in the source
        remaining: usize,
    },

    /// A decoded container length exceeds the bytes left in the source
    #[error("decoded length {length} exceeds {remaining} remaining bytes")]
    LengthOutOfBounds {
        /// The decoded element count
        length: usize,
        /// Bytes left in the source
        remaining: usize,
    },

    /// A decoded string was not valid UTF-8
    #[error("decoded string is not valid UTF-8")]
    InvalidUtf8,
}
