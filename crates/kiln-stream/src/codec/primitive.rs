//! Codec impls for fixed-width primitives

use crate::error::StreamError;
use crate::sink::Sink;
use crate::source::Source;
use crate::{StreamRead, StreamWrite};

macro_rules! impl_stream_for_primitive {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl StreamWrite for $ty {
                fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
                    sink.write_bytes(&self.to_ne_bytes());
                }
            }

            impl StreamRead for $ty {
                fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
                    let mut bytes = [0u8; size_of::<$ty>()];
                    bytes.copy_from_slice(source.read_bytes(size_of::<$ty>())?);
                    Ok(<$ty>::from_ne_bytes(bytes))
                }
            }
        )+
    };
}

impl_stream_for_primitive!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

impl StreamWrite for bool {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        sink.write_bytes(&[u8::from(*self)]);
    }
}

impl StreamRead for bool {
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        Ok(u8::stream_read(source)? != 0)
    }
}

/// A 32-bit-backed boolean, as carried across C API boundaries
///
/// The wide storage exists only on the API side; the codec narrows it to a
/// single byte at encode time so that logically equal flags always produce
/// identical key bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Bool32(u32);

impl Bool32 {
    /// The false value
    pub const FALSE: Self = Self(0);
    /// The canonical true value
    pub const TRUE: Self = Self(1);

    /// Whether the flag is set (any non-zero storage counts)
    #[must_use]
    pub const fn get(self) -> bool {
        self.0 != 0
    }

    /// The raw 32-bit storage
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Adopt raw 32-bit storage without normalizing it
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<bool> for Bool32 {
    fn from(value: bool) -> Self {
        Self(u32::from(value))
    }
}

impl From<Bool32> for bool {
    fn from(value: Bool32) -> Self {
        value.get()
    }
}

impl StreamWrite for Bool32 {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        self.get().stream_write(sink);
    }
}

impl StreamRead for Bool32 {
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        Ok(Self::from(bool::stream_read(source)?))
    }
}
