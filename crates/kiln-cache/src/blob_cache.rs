//! Thread-safe blob cache over external key/value callbacks
//!
//! [`BlobCache`] owns no storage of its own. It serializes access to a pair
//! of caller-supplied hooks (probe-then-fetch load, fire-and-forget store)
//! behind a mutex, and optionally frames every payload with a SHA3-224
//! digest so corrupt entries from an untrusted store surface as misses
//! instead of garbage artifacts.

// One unsafe block: handing out the payload region of a validated entry
// without copying it away from its digest prefix.
#![allow(unsafe_code)]

use digest::Digest;
use kiln_stream::Blob;
use parking_lot::Mutex;
use sha3::Sha3_224;

use crate::error::CacheError;
use crate::key::CacheKey;
use crate::result::CacheResult;
use crate::traits::ToBlob;

/// Size in bytes of the digest prefix used when hash validation is enabled
pub const DIGEST_SIZE: usize = 28;

/// Load hook: probe with `None` (returning 0 for "not found", else the entry
/// size), then fetch with a buffer of exactly that size, filling it and
/// returning the same size
pub type LoadFn = Box<dyn FnMut(&[u8], Option<&mut [u8]>) -> usize + Send>;

/// Store hook: write the value under the key, overwriting any prior entry
pub type StoreFn = Box<dyn FnMut(&[u8], &[u8]) + Send>;

/// The externally supplied storage callbacks
///
/// Either side may be absent: without a load hook every load is a miss,
/// without a store hook stores are dropped. State the hooks need (a
/// connection, a directory handle, statistics) lives in their captures.
#[derive(Default)]
pub struct StoreHooks {
    /// Probe-then-fetch read access to the external store
    pub load: Option<LoadFn>,
    /// Write access to the external store
    pub store: Option<StoreFn>,
}

impl StoreHooks {
    /// Hooks with both directions disabled
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for StoreHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHooks")
            .field("load", &self.load.is_some())
            .field("store", &self.store.is_some())
            .finish()
    }
}

/// Thread-safe cache mapping [`CacheKey`]s to payload blobs
///
/// All public operations acquire the internal mutex, so the external hooks
/// are never entered concurrently and need not be reentrant.
#[derive(Debug)]
pub struct BlobCache {
    hooks: Mutex<StoreHooks>,
    hash_validation: bool,
}

impl BlobCache {
    /// Wrap a pair of store hooks
    ///
    /// `hash_validation` is fixed for the cache's lifetime; when enabled,
    /// stored bytes are framed as `digest(payload) || payload` and loads
    /// verify the frame before handing the payload out.
    #[must_use]
    pub fn new(hooks: StoreHooks, hash_validation: bool) -> Self {
        Self {
            hooks: Mutex::new(hooks),
            hash_validation,
        }
    }

    /// Whether payloads are digest-framed
    #[must_use]
    pub fn hash_validation_enabled(&self) -> bool {
        self.hash_validation
    }

    /// Load the payload stored under `key`
    ///
    /// Returns an empty blob when the store has no entry, the populated
    /// payload on success, or a [`CacheError`] when hash validation rejects
    /// the stored bytes. Callers treat the error case as a miss.
    ///
    /// # Panics
    ///
    /// Panics if the external load hook returns a different size from the
    /// fetch call than it reported from the probe; that is a contract
    /// violation of the store, not a runtime condition.
    pub fn load(&self, key: &CacheKey) -> Result<Blob, CacheError> {
        debug_assert!(
            key.contains_version_tag(),
            "cache key does not embed the version tag"
        );
        let buffer = {
            let mut hooks = self.hooks.lock();
            let Some(load) = hooks.load.as_mut() else {
                return Ok(Blob::new());
            };
            let expected = load(key.bytes(), None);
            if expected == 0 {
                return Ok(Blob::new());
            }
            let mut buffer = vec![0u8; expected];
            let actual = load(key.bytes(), Some(&mut buffer));
            assert_eq!(
                actual, expected,
                "external store returned {actual} bytes after probing {expected}"
            );
            buffer
        };

        if self.hash_validation {
            unpack_hash_prefixed(buffer)
        } else {
            Ok(Blob::from_vec(buffer))
        }
    }

    /// Store `value` under `key`, overwriting any existing entry
    ///
    /// Storage never fails visibly: a missing store hook (or any refusal
    /// inside it) leaves the artifact valid in memory and the cache simply
    /// not warmer.
    ///
    /// # Panics
    ///
    /// Panics if `value` is empty; empty payloads are indistinguishable from
    /// misses on load and must not be stored.
    pub fn store(&self, key: &CacheKey, value: &[u8]) {
        debug_assert!(
            key.contains_version_tag(),
            "cache key does not embed the version tag"
        );
        assert!(!value.is_empty(), "cache values must be non-empty");
        let mut hooks = self.hooks.lock();
        let Some(store) = hooks.store.as_mut() else {
            return;
        };
        if self.hash_validation {
            let framed = hash_prefixed(value);
            store(key.bytes(), framed.data());
        } else {
            store(key.bytes(), value);
        }
    }

    /// Store a blob's bytes under `key`
    pub fn store_blob(&self, key: &CacheKey, value: &Blob) {
        self.store(key, value.data());
    }

    /// Persist a load-or-compute result iff it was not already cached
    pub fn ensure_stored<T: ToBlob>(&self, result: &CacheResult<T>) {
        if !result.is_cached() {
            self.store_blob(result.key(), &result.value().to_blob());
        }
    }

    /// The exact byte image `store` would hand to the external hook
    ///
    /// Lets tests seed a mock store with entries that loads will accept.
    #[must_use]
    pub fn stored_blob_for_testing(&self, value: &[u8]) -> Blob {
        if self.hash_validation {
            hash_prefixed(value)
        } else {
            Blob::from_vec(value.to_vec())
        }
    }
}

/// Frame a payload as `digest(payload) || payload`
fn hash_prefixed(payload: &[u8]) -> Blob {
    let mut framed = Blob::with_size(DIGEST_SIZE + payload.len());
    let bytes = framed.data_mut();
    let digest = Sha3_224::digest(payload);
    bytes[..DIGEST_SIZE].copy_from_slice(&digest);
    bytes[DIGEST_SIZE..].copy_from_slice(payload);
    framed
}

/// Validate a framed entry and unwrap its payload
///
/// The payload is handed out in place: the returned blob points into the
/// fetched buffer past the digest prefix, and its release action frees the
/// whole buffer.
fn unpack_hash_prefixed(buffer: Vec<u8>) -> Result<Blob, CacheError> {
    if buffer.len() <= DIGEST_SIZE {
        return Err(CacheError::EntryTooSmall {
            size: buffer.len(),
            digest_size: DIGEST_SIZE,
        });
    }
    let computed = Sha3_224::digest(&buffer[DIGEST_SIZE..]);
    if computed.as_slice() != &buffer[..DIGEST_SIZE] {
        return Err(CacheError::DigestMismatch {
            size: buffer.len(),
            stored: hex::encode(&buffer[..DIGEST_SIZE]),
            computed: hex::encode(computed),
        });
    }

    let mut buffer = buffer;
    let payload_len = buffer.len() - DIGEST_SIZE;
    // SAFETY: the release action owns the vector, so the payload region it
    // points into stays valid until the blob is dropped.
    let payload_ptr = unsafe { buffer.as_mut_ptr().add(DIGEST_SIZE) };
    Ok(unsafe { Blob::from_raw(payload_ptr, payload_len, move || drop(buffer)) })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::{memory_hooks, shared_store};

    fn tagged_key(extra: &[u8]) -> CacheKey {
        let mut key = CacheKey::with_version_tag();
        kiln_stream::Sink::write_bytes(&mut key, extra);
        key
    }

    #[test]
    fn digest_size_matches_the_hasher() {
        assert_eq!(DIGEST_SIZE, Sha3_224::output_size());
    }

    #[test]
    fn hash_framing_round_trips() {
        let payload = b"hello world!\0";
        let framed = hash_prefixed(payload);
        assert_eq!(framed.len(), payload.len() + DIGEST_SIZE);

        let unpacked = unpack_hash_prefixed(framed.data().to_vec()).expect("frame validates");
        assert_eq!(unpacked.data(), payload);
    }

    #[test]
    fn any_single_byte_flip_fails_validation() {
        let payload = b"artifact bytes";
        let framed = hash_prefixed(payload);

        for i in 0..framed.len() {
            let mut corrupted = framed.data().to_vec();
            corrupted[i] = !corrupted[i];
            assert!(
                unpack_hash_prefixed(corrupted).is_err(),
                "flip at byte {i} went undetected"
            );
        }
    }

    #[test]
    fn frames_no_longer_than_the_digest_are_too_small() {
        assert_eq!(
            unpack_hash_prefixed(b"0".to_vec()),
            Err(CacheError::EntryTooSmall {
                size: 1,
                digest_size: DIGEST_SIZE,
            })
        );
        assert!(matches!(
            unpack_hash_prefixed(vec![0u8; DIGEST_SIZE]),
            Err(CacheError::EntryTooSmall { .. })
        ));
    }

    #[test]
    fn load_of_a_never_stored_key_is_a_miss() {
        let store = shared_store();
        let cache = BlobCache::new(memory_hooks(&store), false);
        let blob = cache.load(&tagged_key(b"missing")).expect("miss loads");
        assert!(blob.is_empty());
    }

    #[test]
    fn store_then_load_returns_the_bytes() {
        let store = shared_store();
        let cache = BlobCache::new(memory_hooks(&store), false);
        let key = tagged_key(b"entry");

        cache.store(&key, b"compiled artifact");
        let blob = cache.load(&key).expect("hit loads");
        assert_eq!(blob.data(), b"compiled artifact");

        // Loading again is idempotent.
        let again = cache.load(&key).expect("hit loads twice");
        assert_eq!(again.data(), b"compiled artifact");
    }

    #[test]
    fn store_overwrites_existing_entries() {
        let store = shared_store();
        let cache = BlobCache::new(memory_hooks(&store), false);
        let key = tagged_key(b"entry");

        cache.store(&key, b"old");
        cache.store(&key, b"new");
        assert_eq!(cache.load(&key).expect("hit loads").data(), b"new");
    }

    #[test]
    fn validated_store_then_load_strips_the_frame() {
        let store = shared_store();
        let cache = BlobCache::new(memory_hooks(&store), true);
        let key = tagged_key(b"framed");

        cache.store(&key, b"hello world!\0");
        let blob = cache.load(&key).expect("validated hit loads");
        assert_eq!(blob.data(), b"hello world!\0");

        // The external store really holds the digest-framed bytes.
        let raw = store.lock().get(key.bytes()).cloned().expect("entry exists");
        assert_eq!(raw.len(), 13 + DIGEST_SIZE);
    }

    #[test]
    fn corrupted_stored_entry_loads_as_an_error() {
        let store = shared_store();
        let cache = BlobCache::new(memory_hooks(&store), true);
        let key = tagged_key(b"corrupt");

        cache.store(&key, b"payload");
        {
            let mut map = store.lock();
            let entry = map.get_mut(key.bytes()).expect("entry exists");
            let last = entry.last_mut().expect("entry non-empty");
            *last = !*last;
        }
        assert!(matches!(
            cache.load(&key),
            Err(CacheError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn disabled_hooks_miss_and_drop() {
        let cache = BlobCache::new(StoreHooks::disabled(), true);
        let key = tagged_key(b"whatever");

        cache.store(&key, b"dropped");
        let blob = cache.load(&key).expect("disabled load is a miss");
        assert!(blob.is_empty());
    }

    #[test]
    fn stored_blob_for_testing_matches_store() {
        let store = shared_store();
        let cache = BlobCache::new(memory_hooks(&store), true);
        let key = tagged_key(b"image");

        cache.store(&key, b"value");
        let expected = cache.stored_blob_for_testing(b"value");
        let raw = store.lock().get(key.bytes()).cloned().expect("entry exists");
        assert_eq!(raw, expected.data());
    }

    #[test]
    fn ensure_stored_persists_only_misses() {
        let store = shared_store();
        let cache = BlobCache::new(memory_hooks(&store), false);
        let key = tagged_key(b"result");

        let hit = CacheResult::hit(key.clone(), b"cached".to_vec());
        cache.ensure_stored(&hit);
        assert!(store.lock().is_empty());

        let miss = CacheResult::miss(key.clone(), b"fresh".to_vec());
        cache.ensure_stored(&miss);
        assert_eq!(cache.load(&key).expect("stored").data(), b"fresh");
    }

    #[test]
    #[should_panic(expected = "non-empty")]
    fn storing_an_empty_value_is_a_contract_violation() {
        let cache = BlobCache::new(StoreHooks::disabled(), false);
        cache.store(&tagged_key(b"k"), b"");
    }

    #[test]
    #[should_panic(expected = "after probing")]
    fn inconsistent_probe_and_fetch_sizes_are_fatal() {
        let hooks = StoreHooks {
            load: Some(Box::new(|_key, out| {
                // Claim 8 bytes on probe, then report 4 from the fetch.
                if out.is_some() { 4 } else { 8 }
            })),
            store: None,
        };
        let cache = BlobCache::new(hooks, false);
        let _ = cache.load(&tagged_key(b"lying store"));
    }

    #[test]
    fn file_backed_hooks_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let load_dir = dir.path().to_path_buf();
        let store_dir = dir.path().to_path_buf();

        let hooks = StoreHooks {
            load: Some(Box::new(move |key, out| {
                let path = load_dir.join(hex::encode(Sha3_224::digest(key)));
                let Ok(bytes) = std::fs::read(&path) else {
                    return 0;
                };
                if let Some(buf) = out {
                    buf.copy_from_slice(&bytes);
                }
                bytes.len()
            })),
            store: Some(Box::new(move |key, value| {
                let path = store_dir.join(hex::encode(Sha3_224::digest(key)));
                std::fs::write(path, value).expect("write entry");
            })),
        };

        let cache = BlobCache::new(hooks, true);
        let key = tagged_key(b"on disk");

        assert!(cache.load(&key).expect("cold miss").is_empty());
        cache.store(&key, b"persisted pipeline");
        let blob = cache.load(&key).expect("warm hit");
        assert_eq!(blob.data(), b"persisted pipeline");
    }

    #[test]
    fn concurrent_loads_and_stores_serialize() {
        let store = shared_store();
        let cache = std::sync::Arc::new(BlobCache::new(memory_hooks(&store), true));

        std::thread::scope(|scope| {
            for worker in 0u8..4 {
                let cache = std::sync::Arc::clone(&cache);
                scope.spawn(move || {
                    let key = tagged_key(&[worker]);
                    for round in 0u8..50 {
                        cache.store(&key, &[worker, round]);
                        let blob = cache.load(&key).expect("validated load");
                        assert_eq!(blob.data()[0], worker);
                    }
                });
            }
        });
    }
}
