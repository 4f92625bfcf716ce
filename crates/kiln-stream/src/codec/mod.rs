//! Type-directed binary codec
//!
//! Every supported type has a [`StreamWrite`] impl producing a deterministic
//! byte sequence and, where decoding makes sense, a matching [`StreamRead`]
//! that inverts it exactly. Determinism is the load-bearing property: two
//! logically equal values must encode to identical bytes, because the bytes
//! double as cache-key material. That is why unordered containers are
//! snapshot-sorted before emission.
//!
//! Primitive values are emitted in native byte order and lengths use the
//! platform `usize` width. Encoded streams are therefore not portable across
//! builds with a different pointer width or endianness; callers that persist
//! them must scope stored entries to a build-identifying tag.
//!
//! Decoding fails closed: a short source or an over-long decoded length
//! yields a [`StreamError`](crate::StreamError), never garbage.

mod container;
mod primitive;
mod string;

pub use primitive::Bool32;

use crate::error::StreamError;
use crate::sink::Sink;
use crate::source::Source;

/// Serialize a value into a [`Sink`] as deterministic bytes
pub trait StreamWrite {
    /// Append this value's encoding to `sink`
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S);
}

/// Deserialize a value from a [`Source`]
pub trait StreamRead: Sized {
    /// Decode a value from the front of `source`, advancing its cursor
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError>;
}

impl<T: StreamWrite + ?Sized> StreamWrite for &T {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        (**self).stream_write(sink);
    }
}

impl<T: StreamWrite + ?Sized> StreamWrite for Box<T> {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        (**self).stream_write(sink);
    }
}

impl<T: StreamRead> StreamRead for Box<T> {
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        T::stream_read(source).map(Box::new)
    }
}

/// Declare a struct whose fields stream in declaration order
///
/// The macro expands to the struct definition plus [`StreamWrite`] and
/// [`StreamRead`] impls that visit every field top to bottom, so the struct
/// encodes as the plain concatenation of its field encodings.
///
/// ```
/// use kiln_stream::{serializable, BlobSource, ByteVectorSink, StreamRead, StreamWrite};
///
/// serializable! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct ShaderDigest {
///         pub stage: u32,
///         pub entry_point: String,
///     }
/// }
///
/// let value = ShaderDigest { stage: 2, entry_point: "main".into() };
/// let mut sink = ByteVectorSink::new();
/// value.stream_write(&mut sink);
/// let mut source = BlobSource::new(sink.into_blob());
/// assert_eq!(ShaderDigest::stream_read(&mut source).unwrap(), value);
/// ```
#[macro_export]
macro_rules! serializable {
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

        impl $crate::StreamWrite for $name {
            fn stream_write<__S: $crate::Sink + ?Sized>(&self, sink: &mut __S) {
                $( $crate::StreamWrite::stream_write(&self.$field, sink); )+
            }
        }

        impl $crate::StreamRead for $name {
            fn stream_read<__S: $crate::Source + ?Sized>(
                source: &mut __S,
            ) -> ::core::result::Result<Self, $crate::StreamError> {
                ::core::result::Result::Ok(Self {
                    $( $field: $crate::StreamRead::stream_read(source)?, )+
                })
            }
        }
    };
}
