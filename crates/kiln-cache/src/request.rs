//! The load-or-compute request engine
//!
//! A cache request is a structured value whose keyed fields determine both
//! the cache key and the computed artifact. [`load_or_run`] derives the key,
//! consults the host's [`BlobCache`](crate::BlobCache), and dispatches to the
//! hit handler or the miss producer, returning the outcome tagged with its
//! origin.
//!
//! The miss producer is a plain `fn` pointer on purpose: a capturing closure
//! could smuggle inputs into the computation that never reached the key, and
//! the whole design rests on the key determining the value. Data that the
//! producer needs but that must not influence the key rides along in
//! [`Unkeyed`](crate::Unkeyed) fields of the request itself.

use std::fmt;

use kiln_stream::Blob;
use tracing::warn;

use crate::key::CacheKey;
use crate::result::CacheResult;
use crate::telemetry::CacheTimer;
use crate::traits::CacheHost;

/// Name of the boolean telemetry sample recorded when a stored entry fails
/// hash validation
pub const HASH_VALIDATION_METRIC: &str = "BlobCacheHashValidationFailed";

/// A structured, keyable request for a cached artifact
///
/// Implementations are normally declared with [`cache_request!`], which
/// streams every field in declaration order (fields wrapped in
/// [`Unkeyed`](crate::Unkeyed) contribute nothing).
pub trait CacheRequest {
    /// Type tag mixed into the key ahead of the fields
    const NAME: &'static str;

    /// Stream the keyed fields, in declaration order, into `key`
    fn write_keyed_fields(&self, key: &mut CacheKey);

    /// Derive this request's cache key under `host`
    ///
    /// The key is the host's base key, then [`NAME`](Self::NAME) as a
    /// NUL-terminated byte run, then the keyed fields.
    fn cache_key<H: CacheHost + ?Sized>(&self, host: &H) -> CacheKey {
        let mut key = host.base_cache_key().clone();
        key.write_type_tag(Self::NAME);
        self.write_keyed_fields(&mut key);
        key
    }
}

/// Resolve a request from cache, or compute it
///
/// Exactly one of the handlers produces the returned value. The hit handler
/// runs when the cache yields a non-empty validated blob; if it fails, the
/// error is logged and the miss producer runs as if the entry were absent.
/// A hash-validation failure is logged, counted under
/// [`HASH_VALIDATION_METRIC`], and likewise treated as a miss.
///
/// When `metric_name` is given and the host has telemetry, the elapsed time
/// is recorded under `"{metric_name}.CacheHit"` or
/// `"{metric_name}.CacheMiss"`; the timer restarts before the miss producer
/// so the sample covers only the path taken.
///
/// Computed misses are *not* persisted here; the caller decides whether the
/// artifact should be committed, via
/// [`BlobCache::ensure_stored`](crate::BlobCache::ensure_stored).
///
/// An infallible hit handler is written with
/// [`Infallible`](std::convert::Infallible) as its error type.
pub fn load_or_run<H, R, T, HitE, E>(
    host: &H,
    metric_name: Option<&str>,
    request: R,
    hit_fn: impl FnOnce(Blob) -> Result<T, HitE>,
    miss_fn: fn(R) -> Result<T, E>,
) -> Result<CacheResult<T>, E>
where
    H: CacheHost + ?Sized,
    R: CacheRequest,
    HitE: fmt::Display,
{
    let key = request.cache_key(host);
    let telemetry = host.telemetry();
    let mut timer = CacheTimer::start(telemetry);

    let blob = match host.blob_cache().load(&key) {
        Ok(blob) => blob,
        Err(err) => {
            warn!(request = R::NAME, error = %err, "cached entry failed validation, recomputing");
            if let Some(telemetry) = telemetry {
                telemetry.record_boolean(HASH_VALIDATION_METRIC, true);
            }
            Blob::new()
        }
    };

    if !blob.is_empty() {
        match hit_fn(blob) {
            Ok(value) => {
                if let Some(name) = metric_name {
                    timer.record(&format!("{name}.CacheHit"));
                }
                return Ok(CacheResult::hit(key, value));
            }
            Err(err) => {
                warn!(request = R::NAME, error = %err, "cache hit handler failed, recomputing");
            }
        }
    }

    timer.reset();
    let value = miss_fn(request)?;
    if let Some(name) = metric_name {
        timer.record(&format!("{name}.CacheMiss"));
    }
    Ok(CacheResult::miss(key, value))
}

/// Declare a cache-request struct
///
/// Expands to the struct definition plus a [`CacheRequest`] impl whose name
/// tag is the struct identifier and whose key bytes are the fields streamed
/// in declaration order. Wrap a field in [`Unkeyed`](crate::Unkeyed) to keep
/// it out of the key while still passing it to the miss producer.
///
/// ```
/// use kiln_cache::{Unkeyed, cache_request};
///
/// cache_request! {
///     pub struct ComputePipelineRequest {
///         pub entry_point: String,
///         pub workgroup_size: (u32, u32, u32),
///         pub debug_label: Unkeyed<Option<String>>,
///     }
/// }
/// ```
#[macro_export]
macro_rules! cache_request {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )+
        }

        impl $crate::CacheRequest for $name {
            const NAME: &'static str = stringify!($name);

            fn write_keyed_fields(&self, key: &mut $crate::CacheKey) {
                $( $crate::__private::StreamWrite::stream_write(&self.$field, key); )+
            }
        }
    };
}
