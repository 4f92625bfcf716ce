//! Per-pipeline adapter between a backend's native cache object and the
//! blob cache
//!
//! GPU backends keep their own monolithic cache object (a driver handle, a
//! binary archive) and only need two things from the persistence layer: an
//! initial payload to seed it with, and a way to write its current contents
//! back out. [`PipelineCache`] provides both, tracking whether anything was
//! compiled since the last write so idle-time flushing stays cheap.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kiln_stream::Blob;
use tracing::debug;

use crate::blob_cache::BlobCache;
use crate::key::CacheKey;

/// Backend-specific serialization of the native cache object
pub trait PipelineCacheBackend {
    /// Error produced while serializing the native cache object
    type Error;

    /// Write the native cache object's current contents into `blob`
    ///
    /// Leaving the blob empty means there is nothing worth persisting; the
    /// adapter skips the store in that case.
    fn serialize_to_blob(&self, blob: &mut Blob) -> Result<(), Self::Error>;
}

/// Lazily loaded, dirtiness-tracked handle to one pipeline's cached state
pub struct PipelineCache<B> {
    cache: Arc<BlobCache>,
    key: CacheKey,
    store_on_idle: bool,
    initialized: bool,
    cache_hit: bool,
    // Compiles on any thread mark the cache dirty; a lost race just means
    // the next compile marks it again. Relaxed is sufficient.
    needs_store: AtomicBool,
    backend: B,
}

impl<B: PipelineCacheBackend> PipelineCache<B> {
    /// Create an uninitialized pipeline cache
    ///
    /// With `store_on_idle` set, compiles only mark the cache dirty and
    /// [`store_on_idle`](Self::store_on_idle) performs the actual write;
    /// otherwise a compile against an initially cold cache flushes
    /// synchronously.
    pub fn new(cache: Arc<BlobCache>, key: CacheKey, store_on_idle: bool, backend: B) -> Self {
        Self {
            cache,
            key,
            store_on_idle,
            initialized: false,
            cache_hit: false,
            needs_store: AtomicBool::new(false),
            backend,
        }
    }

    /// Load the stored payload, recording whether it was a hit
    ///
    /// Returns the loaded blob (possibly empty) for the backend to seed its
    /// native cache object with. A stored entry that fails validation is
    /// logged and treated as a miss.
    ///
    /// # Panics
    ///
    /// Panics when called more than once.
    pub fn initialize(&mut self) -> Blob {
        assert!(!self.initialized, "pipeline cache initialized twice");
        let blob = match self.cache.load(&self.key) {
            Ok(blob) => blob,
            Err(err) => {
                debug!(error = %err, "stored pipeline cache entry failed validation, starting cold");
                Blob::new()
            }
        };
        self.cache_hit = !blob.is_empty();
        self.initialized = true;
        blob
    }

    /// Whether the initial load found a payload
    ///
    /// # Panics
    ///
    /// Panics before [`initialize`](Self::initialize) has run.
    #[must_use]
    pub fn cache_hit(&self) -> bool {
        assert!(self.initialized, "pipeline cache queried before initialize");
        self.cache_hit
    }

    /// The backend serializer
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Note that a pipeline was successfully compiled against this cache
    ///
    /// In store-on-idle mode this only marks the cache dirty. Otherwise the
    /// native cache is flushed synchronously, but only when the initial load
    /// missed: a cache that started warm is assumed to already hold its
    /// pipelines.
    ///
    /// # Panics
    ///
    /// Panics before [`initialize`](Self::initialize) has run.
    pub fn did_compile_pipeline(&self) -> Result<(), B::Error> {
        assert!(self.initialized, "pipeline compiled before initialize");
        if self.store_on_idle {
            self.needs_store.store(true, Ordering::Relaxed);
            Ok(())
        } else if self.cache_hit {
            Ok(())
        } else {
            self.flush()
        }
    }

    /// Flush now if any compile marked the cache dirty
    ///
    /// # Panics
    ///
    /// Panics when the cache was not constructed with `store_on_idle`.
    pub fn store_on_idle(&self) -> Result<(), B::Error> {
        assert!(
            self.store_on_idle,
            "store_on_idle called on a synchronously flushing pipeline cache"
        );
        if self.needs_store.swap(false, Ordering::Relaxed) {
            self.flush()?;
        }
        Ok(())
    }

    /// Serialize the native cache object and store it if non-empty
    pub fn flush(&self) -> Result<(), B::Error> {
        let mut blob = Blob::new();
        self.backend.serialize_to_blob(&mut blob)?;
        if !blob.is_empty() {
            self.cache.store_blob(&self.key, &blob);
        }
        Ok(())
    }
}
