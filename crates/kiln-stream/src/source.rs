//! Forward sequential readers over byte regions

use crate::blob::Blob;
use crate::error::StreamError;

/// A forward-only reader of encoded bytes
///
/// Reads advance an internal cursor and fail with
/// [`StreamError::Truncated`] when fewer bytes remain than were asked for.
pub trait Source {
    /// View the next `len` bytes, advancing the cursor past them
    fn read_bytes(&mut self, len: usize) -> Result<&[u8], StreamError>;

    /// Bytes left before the end of the source
    fn remaining(&self) -> usize;
}

fn take<'a>(bytes: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8], StreamError> {
    let remaining = bytes.len() - *offset;
    if len > remaining {
        return Err(StreamError::Truncated {
            needed: len,
            remaining,
        });
    }
    let start = *offset;
    *offset += len;
    Ok(&bytes[start..start + len])
}

/// A source that owns its backing [`Blob`] for the duration of the read
#[derive(Debug)]
pub struct BlobSource {
    blob: Blob,
    offset: usize,
}

impl BlobSource {
    /// Wrap a blob for sequential reading
    #[must_use]
    pub const fn new(blob: Blob) -> Self {
        Self { blob, offset: 0 }
    }
}

impl Source for BlobSource {
    fn read_bytes(&mut self, len: usize) -> Result<&[u8], StreamError> {
        take(self.blob.data(), &mut self.offset, len)
    }

    fn remaining(&self) -> usize {
        self.blob.len() - self.offset
    }
}

/// A source over borrowed bytes
#[derive(Debug)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> SliceSource<'a> {
    /// Wrap a byte slice for sequential reading
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }
}

impl Source for SliceSource<'_> {
    fn read_bytes(&mut self, len: usize) -> Result<&[u8], StreamError> {
        take(self.bytes, &mut self.offset, len)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}
