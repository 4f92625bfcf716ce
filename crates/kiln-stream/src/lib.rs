//! Deterministic binary stream codec and owned byte-blob primitives
//!
//! This crate is the byte layer of the kiln artifact cache. It provides:
//!
//! - [`Blob`]: an owned byte region with a caller-supplied release action,
//!   the unit of payload exchanged with external stores
//! - [`Sink`] / [`Source`]: append-only writers and forward sequential
//!   readers over in-memory bytes, with [`ByteVectorSink`] and
//!   [`BlobSource`] as the reference implementations
//! - [`StreamWrite`] / [`StreamRead`]: a type-directed codec whose encodings
//!   are deterministic enough to double as cache-key material
//! - [`BitArray`]: fixed-width packed flag bits
//! - [`serializable!`]: field-order record serialization without hand-written
//!   impls
//!
//! # Determinism
//!
//! Equal values encode to identical bytes on a given build. Unordered
//! containers are snapshot-sorted by key before emission, so two maps with
//! the same entries always serialize identically no matter how they were
//! built. Primitives use native byte order and lengths use the platform
//! `usize` width; encoded streams are not portable across differing builds
//! and must be scoped by a build-identifying tag when persisted.
//!
//! # Example
//!
//! ```
//! use kiln_stream::{BlobSource, ByteVectorSink, StreamRead, StreamWrite};
//!
//! let mut sink = ByteVectorSink::new();
//! (7u32, "entry".to_owned()).stream_write(&mut sink);
//!
//! let mut source = BlobSource::new(sink.into_blob());
//! let decoded = <(u32, String)>::stream_read(&mut source)?;
//! assert_eq!(decoded, (7, "entry".to_owned()));
//! # Ok::<(), kiln_stream::StreamError>(())
//! ```

#![warn(missing_docs)]

pub mod bits;
pub mod blob;
pub mod codec;
pub mod error;
pub mod sink;
pub mod source;

pub use bits::BitArray;
pub use blob::Blob;
pub use codec::{Bool32, StreamRead, StreamWrite};
pub use error::StreamError;
pub use sink::{ByteVectorSink, Sink};
pub use source::{BlobSource, SliceSource, Source};
