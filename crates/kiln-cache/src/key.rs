//! Cache keys and the unkeyed-value wrapper
//!
//! A [`CacheKey`] is a byte sink whose contents are the deterministic
//! serialization of everything that may influence a cached artifact: the
//! host's base key, the request type's name tag, and the request's keyed
//! fields in declaration order. Keys compare and hash by raw bytes and are
//! handed to the external store verbatim.

use std::fmt;

use kiln_stream::{ByteVectorSink, Sink, StreamWrite};

/// The build tag every valid cache key must embed
///
/// Persisted entries are only meaningful for the build that wrote them; hosts
/// seed their base key with this tag (see [`CacheKey::with_version_tag`]) and
/// [`BlobCache`](crate::BlobCache) checks for it as a precondition.
#[must_use]
pub fn version_tag() -> &'static [u8] {
    concat!("kiln/", env!("CARGO_PKG_VERSION")).as_bytes()
}

/// A deterministic byte key identifying one cached artifact
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct CacheKey(ByteVectorSink);

impl CacheKey {
    /// An empty key
    pub const fn new() -> Self {
        Self(ByteVectorSink::new())
    }

    /// A base key pre-seeded with the build's version tag
    ///
    /// Hosts append their device identity after the tag; every request key
    /// derived from the result then satisfies the version-tag invariant.
    pub fn with_version_tag() -> Self {
        let mut key = Self::new();
        key.0.write_bytes(version_tag());
        key
    }

    /// The raw key bytes
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Number of key bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the key embeds the current build's version tag
    #[must_use]
    pub fn contains_version_tag(&self) -> bool {
        let tag = version_tag();
        self.bytes().windows(tag.len()).any(|window| window == tag)
    }

    /// Append a type-name tag as a NUL-terminated byte run
    pub(crate) fn write_type_tag(&mut self, name: &str) {
        self.0.write_bytes(name.as_bytes());
        self.0.write_bytes(&[0]);
    }
}

impl Sink for CacheKey {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.0.write_bytes(bytes);
    }

    fn reserve_space(&mut self, len: usize) -> &mut [u8] {
        self.0.reserve_space(len)
    }
}

// Splicing one key into another contributes its raw bytes, matching the
// sink-into-sink rule.
impl StreamWrite for CacheKey {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        sink.write_bytes(self.bytes());
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", hex::encode(self.bytes()))
    }
}

/// A request field that carries data without contributing key bytes
///
/// The wrapped value rides along into the miss producer but is invisible to
/// the key derivation: its serialization is empty. Use it for handles and
/// scratch state that cannot (and must not) influence the cached artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unkeyed<T>(T);

impl<T> Unkeyed<T> {
    /// Wrap a value
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the wrapped value
    pub const fn get(&self) -> &T {
        &self.0
    }

    /// Mutably borrow the wrapped value
    pub const fn get_mut(&mut self) -> &mut T {
        &mut self.0
    }

    /// Unwrap the value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Unkeyed<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> StreamWrite for Unkeyed<T> {
    fn stream_write<S: Sink + ?Sized>(&self, _sink: &mut S) {
        // Deliberately empty: unkeyed values contribute no key bytes.
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn keys_compare_by_bytes() {
        let mut a = CacheKey::new();
        let mut b = CacheKey::new();
        a.write_bytes(b"abc");
        b.write_bytes(b"abc");
        assert_eq!(a, b);

        b.write_bytes(b"d");
        assert_ne!(a, b);
    }

    #[test]
    fn with_version_tag_satisfies_the_invariant() {
        let key = CacheKey::with_version_tag();
        assert!(key.contains_version_tag());
    }

    #[test]
    fn tag_is_found_mid_key() {
        let mut key = CacheKey::new();
        key.write_bytes(b"prefix-");
        key.write_bytes(version_tag());
        key.write_bytes(b"-suffix");
        assert!(key.contains_version_tag());
    }

    #[test]
    fn short_or_unrelated_keys_lack_the_tag() {
        assert!(!CacheKey::new().contains_version_tag());

        let mut key = CacheKey::new();
        key.write_bytes(b"x");
        assert!(!key.contains_version_tag());
    }

    #[test]
    fn type_tags_are_nul_terminated() {
        let mut key = CacheKey::new();
        key.write_type_tag("PipelineRequest");
        assert_eq!(key.bytes(), b"PipelineRequest\0");
    }

    #[test]
    fn keys_splice_as_raw_bytes() {
        let mut base = CacheKey::new();
        base.write_bytes(b"base");

        let mut outer = CacheKey::new();
        base.stream_write(&mut outer);
        42u8.stream_write(&mut outer);
        assert_eq!(outer.bytes(), b"base\x2a");
    }

    #[test]
    fn unkeyed_values_write_nothing() {
        let mut key = CacheKey::new();
        Unkeyed::new(123_456u64).stream_write(&mut key);
        Unkeyed::new("ignored".to_owned()).stream_write(&mut key);
        assert!(key.is_empty());
    }

    #[test]
    fn unkeyed_values_are_still_accessible() {
        let mut wrapped = Unkeyed::new(vec![1, 2, 3]);
        assert_eq!(wrapped.get().len(), 3);
        wrapped.get_mut().push(4);
        assert_eq!(wrapped.into_inner(), vec![1, 2, 3, 4]);
    }
}
