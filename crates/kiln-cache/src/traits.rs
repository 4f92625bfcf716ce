//! Traits at the cache's seams

use kiln_stream::Blob;

use crate::blob_cache::BlobCache;
use crate::key::CacheKey;
use crate::telemetry::Telemetry;

/// The environment a cache request runs against
///
/// A host owns the base key shared by all of its requests (pre-seeded with
/// the version tag and whatever device identity the host serializes into it)
/// and the [`BlobCache`] that persistence goes through. The telemetry sink is
/// optional; an absent sink turns every sample into a no-op.
pub trait CacheHost {
    /// The base key every request key starts from
    fn base_cache_key(&self) -> &CacheKey;

    /// The blob cache backing this host
    fn blob_cache(&self) -> &BlobCache;

    /// The telemetry sink, if the host has one
    fn telemetry(&self) -> Option<&dyn Telemetry> {
        None
    }
}

/// Serialize a computed artifact into the blob that the cache will persist
pub trait ToBlob {
    /// The byte image to store under the artifact's key
    fn to_blob(&self) -> Blob;
}

impl ToBlob for Vec<u8> {
    fn to_blob(&self) -> Blob {
        Blob::from_vec(self.clone())
    }
}

impl ToBlob for Blob {
    fn to_blob(&self) -> Blob {
        Blob::from_vec(self.data().to_vec())
    }
}
