//! Append-only byte sinks

use std::fmt;

use crate::blob::Blob;

/// An append-only destination for encoded bytes
///
/// Reserving space is logically equivalent to appending that many zero bytes
/// and handing back a mutable view of them; implementations may skip the
/// zero-fill when the caller overwrites the span immediately.
pub trait Sink {
    /// Append `bytes` to the end of the sink
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Append `len` writable bytes and return a view of the new span
    fn reserve_space(&mut self, len: usize) -> &mut [u8];
}

/// The reference sink: a growable byte vector
#[derive(Default, Clone, PartialEq, Eq, Hash)]
pub struct ByteVectorSink {
    bytes: Vec<u8>,
}

impl ByteVectorSink {
    /// Create an empty sink
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Create an empty sink with room for `capacity` bytes
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been written yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The accumulated bytes
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Convert the sink into a [`Blob`], transferring ownership of the bytes
    #[must_use]
    pub fn into_blob(self) -> Blob {
        Blob::from_vec(self.bytes)
    }

    /// Unwrap the underlying byte vector
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for ByteVectorSink {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl AsRef<[u8]> for ByteVectorSink {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for ByteVectorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteVectorSink({})", hex::encode(&self.bytes))
    }
}

impl Sink for ByteVectorSink {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    fn reserve_space(&mut self, len: usize) -> &mut [u8] {
        let start = self.bytes.len();
        self.bytes.resize(start + len, 0);
        &mut self.bytes[start..]
    }
}

// A sink spliced into another sink contributes its raw accumulated bytes,
// with no length prefix: the receiving sink's contents must be exactly the
// concatenation of everything streamed into both.
impl crate::StreamWrite for ByteVectorSink {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        sink.write_bytes(&self.bytes);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn write_bytes_appends() {
        let mut sink = ByteVectorSink::new();
        sink.write_bytes(b"ab");
        sink.write_bytes(b"cd");
        assert_eq!(sink.as_slice(), b"abcd");
    }

    #[test]
    fn reserve_space_appends_a_writable_span() {
        let mut sink = ByteVectorSink::new();
        sink.write_bytes(b"head");
        sink.reserve_space(3).copy_from_slice(b"xyz");
        assert_eq!(sink.as_slice(), b"headxyz");
    }

    #[test]
    fn reserve_space_zero_fills_when_untouched() {
        let mut sink = ByteVectorSink::new();
        let _ = sink.reserve_space(4);
        assert_eq!(sink.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn into_blob_carries_the_bytes() {
        let mut sink = ByteVectorSink::new();
        sink.write_bytes(b"payload");
        let blob = sink.into_blob();
        assert_eq!(blob.data(), b"payload");
    }
}
