//! Owned byte regions with caller-supplied release actions
//!
//! A [`Blob`] is a contiguous byte region bundled with the action that frees
//! it. Most blobs own a plain heap allocation, but the raw constructor lets a
//! caller adopt memory owned by something else entirely (a mapped file, a
//! foreign allocator, a driver handle) as long as it supplies the matching
//! release action. The release action runs exactly once, when the blob is
//! dropped.

// Raw-pointer ownership is the point of this type: the release action, not
// the borrow checker, defines who frees the region.
#![allow(unsafe_code)]

use std::fmt;

use bytemuck::Pod;

use crate::error::StreamError;
use crate::sink::Sink;
use crate::source::Source;
use crate::{StreamRead, StreamWrite};

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// An owned, move-only block of bytes
///
/// Invariant: the data pointer is null iff the size is zero. Cloning is
/// deliberately unsupported; ownership transfer is by move, and the release
/// action travels with the value.
pub struct Blob {
    data: *mut u8,
    size: usize,
    release: Option<ReleaseFn>,
}

// SAFETY: the region is uniquely owned by this value and the release action
// is required to be Send; shared access only hands out immutable slices.
unsafe impl Send for Blob {}
unsafe impl Sync for Blob {}

impl Blob {
    /// The canonical empty blob: null data, zero size, no release action
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: std::ptr::null_mut(),
            size: 0,
            release: None,
        }
    }

    /// Allocate a zero-initialized blob of `size` bytes
    ///
    /// A zero size yields the canonical empty blob.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        if size == 0 {
            return Self::new();
        }
        Self::from_vec(vec![0u8; size])
    }

    /// Adopt an existing byte region together with its release action
    ///
    /// The release action is invoked exactly once when the blob is dropped,
    /// and is the sole owner of the region's lifetime from this point on. A
    /// non-null pointer with a zero size is normalized to the empty blob, but
    /// the release action is retained and still runs.
    ///
    /// # Safety
    ///
    /// `data` must point to `size` readable and writable bytes that stay
    /// valid until `release` runs, and nothing else may access the region
    /// while the blob owns it.
    ///
    /// # Panics
    ///
    /// Panics if `data` is null while `size` is non-zero.
    pub unsafe fn from_raw(data: *mut u8, size: usize, release: impl FnOnce() + Send + 'static) -> Self {
        assert!(
            !data.is_null() || size == 0,
            "blob constructed from a null pointer with non-zero size {size}"
        );
        let data = if size == 0 { std::ptr::null_mut() } else { data };
        Self {
            data,
            size,
            release: Some(Box::new(release)),
        }
    }

    /// Take ownership of a vector of plain scalar values, reinterpreted as bytes
    ///
    /// The element type must be plain old data; the release action drops the
    /// original vector.
    #[must_use]
    pub fn from_vec<T: Pod + Send + 'static>(mut vec: Vec<T>) -> Self {
        let data = vec.as_mut_ptr().cast::<u8>();
        let size = vec.len() * size_of::<T>();
        if size == 0 {
            return Self::new();
        }
        // SAFETY: the closure keeps the vector (and therefore its heap
        // buffer) alive until the blob is dropped; moving the Vec value does
        // not move the buffer it points to.
        unsafe { Self::from_raw(data, size, move || drop(vec)) }
    }

    /// Whether the blob holds no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Size of the region in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Shared view of the bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        if self.size == 0 {
            return &[];
        }
        // SAFETY: data is non-null and valid for size bytes per the
        // construction invariant.
        unsafe { std::slice::from_raw_parts(self.data, self.size) }
    }

    /// Mutable view of the bytes
    pub fn data_mut(&mut self) -> &mut [u8] {
        if self.size == 0 {
            return &mut [];
        }
        // SAFETY: data is non-null and valid for size bytes, and the blob is
        // uniquely borrowed.
        unsafe { std::slice::from_raw_parts_mut(self.data, self.size) }
    }
}

impl Default for Blob {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Blob {
    fn drop(&mut self) {
        self.data = std::ptr::null_mut();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.data() == other.data()
    }
}

impl Eq for Blob {}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("len", &self.size)
            .field("has_release", &self.release.is_some())
            .finish()
    }
}

impl StreamWrite for Blob {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        self.len().stream_write(sink);
        sink.write_bytes(self.data());
    }
}

impl StreamRead for Blob {
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        let len = usize::stream_read(source)?;
        if len > source.remaining() {
            return Err(StreamError::LengthOutOfBounds {
                length: len,
                remaining: source.remaining(),
            });
        }
        if len == 0 {
            return Ok(Self::new());
        }
        Ok(Self::from_vec(source.read_bytes(len)?.to_vec()))
    }
}
