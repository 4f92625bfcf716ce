//! Content-addressed blob cache for memoizing expensive pipeline compilations
//!
//! Compiling a GPU pipeline is slow; doing it twice for the same inputs is
//! wasted work. This crate memoizes such computations through an externally
//! supplied key/value store:
//!
//! - [`CacheKey`]: a deterministic byte serialization of everything that may
//!   influence an artifact, built with the `kiln-stream` codec
//! - [`BlobCache`]: a thread-safe wrapper over [`StoreHooks`] callbacks,
//!   optionally framing payloads with a SHA3-224 digest so corrupt entries
//!   surface as misses
//! - [`load_or_run`]: the load-or-compute driver, dispatching each
//!   [`CacheRequest`] to a hit handler or a miss producer and tagging the
//!   outcome as a [`CacheResult`]
//! - [`PipelineCache`]: a per-pipeline adapter for backends with their own
//!   native cache object
//!
//! # The key determines the value
//!
//! Everything here defends one invariant: the bytes that form a request's
//! key are exactly the inputs that determine its artifact. Unordered
//! containers serialize sorted, the miss producer is a capture-free `fn`
//! pointer, and side data rides in [`Unkeyed`] wrappers that contribute no
//! key bytes. Corruption and loss of the external store are always
//! recoverable by recomputing; the cache is best-effort by design.
//!
//! # Example
//!
//! ```
//! use std::convert::Infallible;
//!
//! use kiln_cache::{BlobCache, CacheHost, CacheKey, StoreHooks, cache_request, load_or_run};
//!
//! cache_request! {
//!     pub struct ShaderCompileRequest {
//!         pub source: String,
//!         pub opt_level: u32,
//!     }
//! }
//!
//! struct Device {
//!     base_key: CacheKey,
//!     cache: BlobCache,
//! }
//!
//! impl CacheHost for Device {
//!     fn base_cache_key(&self) -> &CacheKey {
//!         &self.base_key
//!     }
//!     fn blob_cache(&self) -> &BlobCache {
//!         &self.cache
//!     }
//! }
//!
//! fn compile(request: ShaderCompileRequest) -> Result<Vec<u8>, String> {
//!     Ok(request.source.into_bytes())
//! }
//!
//! let device = Device {
//!     base_key: CacheKey::with_version_tag(),
//!     cache: BlobCache::new(StoreHooks::disabled(), false),
//! };
//! let request = ShaderCompileRequest {
//!     source: "@fragment fn main() {}".into(),
//!     opt_level: 2,
//! };
//!
//! let result = load_or_run(
//!     &device,
//!     None,
//!     request,
//!     |blob| Ok::<_, Infallible>(blob.data().to_vec()),
//!     compile,
//! )?;
//! assert!(!result.is_cached());
//! device.cache.ensure_stored(&result);
//! # Ok::<(), String>(())
//! ```

#![warn(missing_docs)]

pub mod blob_cache;
pub mod error;
pub mod key;
pub mod pipeline;
pub mod request;
pub mod result;
pub mod telemetry;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use blob_cache::{BlobCache, DIGEST_SIZE, LoadFn, StoreFn, StoreHooks};
pub use error::CacheError;
pub use key::{CacheKey, Unkeyed, version_tag};
pub use pipeline::{PipelineCache, PipelineCacheBackend};
pub use request::{CacheRequest, HASH_VALIDATION_METRIC, load_or_run};
pub use result::{CacheOrigin, CacheResult};
pub use telemetry::{CacheTimer, Telemetry};
pub use traits::{CacheHost, ToBlob};

// Re-export the payload type so downstream crates need not name kiln-stream
// for the common paths.
pub use kiln_stream::Blob;

#[doc(hidden)]
pub mod __private {
    //! Support items for macro expansions; not public API
    pub use kiln_stream::StreamWrite;
}
