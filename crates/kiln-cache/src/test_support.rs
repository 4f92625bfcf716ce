//! Shared fixtures for the crate's tests

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::blob_cache::{BlobCache, StoreHooks};
use crate::key::CacheKey;
use crate::telemetry::Telemetry;
use crate::traits::CacheHost;

/// The byte map behind [`memory_hooks`], shared with the test so it can
/// inspect and corrupt entries
pub(crate) type SharedStore = Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>;

pub(crate) fn shared_store() -> SharedStore {
    Arc::new(Mutex::new(HashMap::new()))
}

/// Store hooks over an in-memory byte map
pub(crate) fn memory_hooks(store: &SharedStore) -> StoreHooks {
    let load_map = Arc::clone(store);
    let store_map = Arc::clone(store);
    StoreHooks {
        load: Some(Box::new(move |key, out| {
            let map = load_map.lock();
            let Some(value) = map.get(key) else {
                return 0;
            };
            if let Some(buf) = out {
                buf.copy_from_slice(value);
            }
            value.len()
        })),
        store: Some(Box::new(move |key, value| {
            store_map.lock().insert(key.to_vec(), value.to_vec());
        })),
    }
}

/// A telemetry sink that records every sample for later assertions
#[derive(Default)]
pub(crate) struct RecordingTelemetry {
    timings: Mutex<Vec<(String, u64)>>,
    booleans: Mutex<Vec<(String, bool)>>,
}

impl Telemetry for RecordingTelemetry {
    fn record_microseconds(&self, name: &str, micros: u64) {
        self.timings.lock().push((name.to_owned(), micros));
    }

    fn record_boolean(&self, name: &str, sample: bool) {
        self.booleans.lock().push((name.to_owned(), sample));
    }
}

/// A host with a version-tagged base key and optional recording telemetry
pub(crate) struct TestHost {
    base_key: CacheKey,
    cache: BlobCache,
    telemetry: Option<Arc<RecordingTelemetry>>,
}

impl TestHost {
    pub(crate) fn new(cache: BlobCache) -> Self {
        Self {
            base_key: CacheKey::with_version_tag(),
            cache,
            telemetry: None,
        }
    }

    /// A host whose base key contributes no bytes, for key-layout tests that
    /// never touch the blob cache
    pub(crate) fn with_empty_base_key(cache: BlobCache) -> Self {
        Self {
            base_key: CacheKey::new(),
            cache,
            telemetry: None,
        }
    }

    pub(crate) fn with_recording_telemetry(mut self) -> Self {
        self.telemetry = Some(Arc::new(RecordingTelemetry::default()));
        self
    }

    pub(crate) fn recorded_timings(&self) -> Vec<(String, u64)> {
        self.telemetry
            .as_ref()
            .map(|t| t.timings.lock().clone())
            .unwrap_or_default()
    }

    pub(crate) fn recorded_booleans(&self) -> Vec<(String, bool)> {
        self.telemetry
            .as_ref()
            .map(|t| t.booleans.lock().clone())
            .unwrap_or_default()
    }
}

impl CacheHost for TestHost {
    fn base_cache_key(&self) -> &CacheKey {
        &self.base_key
    }

    fn blob_cache(&self) -> &BlobCache {
        &self.cache
    }

    fn telemetry(&self) -> Option<&dyn Telemetry> {
        self.telemetry
            .as_ref()
            .map(|t| t.as_ref() as &dyn Telemetry)
    }
}
