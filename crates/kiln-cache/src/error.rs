//! Error types for cache operations

use thiserror::Error;

/// Errors that can occur while loading from a [`BlobCache`](crate::BlobCache)
///
/// Both variants describe a stored entry that failed hash validation. The
/// load-or-compute driver recovers from them by recomputing; they are never
/// fatal to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The stored entry is too short to carry a digest prefix at all
    #[error(
        "cache entry of {size} bytes is not larger than the {digest_size}-byte digest prefix"
    )]
    EntryTooSmall {
        /// Total size of the loaded entry
        size: usize,
        /// Size of the digest prefix in bytes
        digest_size: usize,
    },

    /// The digest prefix does not match the digest of the stored payload
    #[error("cache entry of {size} bytes failed digest validation: stored {stored}, computed {computed}")]
    DigestMismatch {
        /// Total size of the loaded entry, digest included
        size: usize,
        /// Hex rendering of the digest stored in the entry
        stored: String,
        /// Hex rendering of the digest computed over the payload
        computed: String,
    },
}
