//! Codec impls for sequences, associative containers, options, and tuples
//!
//! Sequences emit their length (as `usize`) followed by each element in
//! iteration order. Hash-backed containers have no stable iteration order, so
//! they are snapshot-sorted by key before emission; equal logical contents
//! therefore always produce equal bytes, which the cache-key derivation
//! depends on.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hash};

use crate::error::StreamError;
use crate::sink::Sink;
use crate::source::Source;
use crate::{StreamRead, StreamWrite};

fn write_len<S: Sink + ?Sized>(len: usize, sink: &mut S) {
    len.stream_write(sink);
}

fn read_len<S: Source + ?Sized>(source: &mut S) -> Result<usize, StreamError> {
    let len = usize::stream_read(source)?;
    if len > source.remaining() {
        return Err(StreamError::LengthOutOfBounds {
            length: len,
            remaining: source.remaining(),
        });
    }
    Ok(len)
}

impl<T: StreamWrite> StreamWrite for [T] {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        write_len(self.len(), sink);
        for item in self {
            item.stream_write(sink);
        }
    }
}

impl<T: StreamWrite> StreamWrite for Vec<T> {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        self.as_slice().stream_write(sink);
    }
}

impl<T: StreamRead> StreamRead for Vec<T> {
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        let len = read_len(source)?;
        let mut out = Self::with_capacity(len);
        for _ in 0..len {
            out.push(T::stream_read(source)?);
        }
        Ok(out)
    }
}

impl<T: StreamWrite> StreamWrite for Option<T> {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        match self {
            Some(value) => {
                true.stream_write(sink);
                value.stream_write(sink);
            }
            None => false.stream_write(sink),
        }
    }
}

impl<T: StreamRead> StreamRead for Option<T> {
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        if bool::stream_read(source)? {
            Ok(Some(T::stream_read(source)?))
        } else {
            Ok(None)
        }
    }
}

impl<K: StreamWrite + Ord, V: StreamWrite> StreamWrite for BTreeMap<K, V> {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        write_len(self.len(), sink);
        for (key, value) in self {
            key.stream_write(sink);
            value.stream_write(sink);
        }
    }
}

impl<K: StreamRead + Ord, V: StreamRead> StreamRead for BTreeMap<K, V> {
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        let len = read_len(source)?;
        let mut out = Self::new();
        for _ in 0..len {
            let key = K::stream_read(source)?;
            let value = V::stream_read(source)?;
            out.insert(key, value);
        }
        Ok(out)
    }
}

impl<T: StreamWrite + Ord> StreamWrite for BTreeSet<T> {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        write_len(self.len(), sink);
        for item in self {
            item.stream_write(sink);
        }
    }
}

impl<T: StreamRead + Ord> StreamRead for BTreeSet<T> {
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        let len = read_len(source)?;
        let mut out = Self::new();
        for _ in 0..len {
            out.insert(T::stream_read(source)?);
        }
        Ok(out)
    }
}

impl<K: StreamWrite + Ord, V: StreamWrite, H: BuildHasher> StreamWrite for HashMap<K, V, H> {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        // Snapshot-sort by key: hash iteration order is nondeterministic.
        let mut entries: Vec<(&K, &V)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        write_len(entries.len(), sink);
        for (key, value) in entries {
            key.stream_write(sink);
            value.stream_write(sink);
        }
    }
}

impl<K, V, H> StreamRead for HashMap<K, V, H>
where
    K: StreamRead + Eq + Hash,
    V: StreamRead,
    H: BuildHasher + Default,
{
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        let len = read_len(source)?;
        let mut out = Self::with_capacity_and_hasher(len, H::default());
        for _ in 0..len {
            let key = K::stream_read(source)?;
            let value = V::stream_read(source)?;
            out.insert(key, value);
        }
        Ok(out)
    }
}

impl<T: StreamWrite + Ord, H: BuildHasher> StreamWrite for HashSet<T, H> {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        let mut items: Vec<&T> = self.iter().collect();
        items.sort();
        write_len(items.len(), sink);
        for item in items {
            item.stream_write(sink);
        }
    }
}

impl<T, H> StreamRead for HashSet<T, H>
where
    T: StreamRead + Eq + Hash,
    H: BuildHasher + Default,
{
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        let len = read_len(source)?;
        let mut out = Self::with_capacity_and_hasher(len, H::default());
        for _ in 0..len {
            out.insert(T::stream_read(source)?);
        }
        Ok(out)
    }
}

macro_rules! impl_stream_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: StreamWrite),+> StreamWrite for ($($name,)+) {
            #[allow(non_snake_case)]
            fn stream_write<Sk: Sink + ?Sized>(&self, sink: &mut Sk) {
                let ($($name,)+) = self;
                $( $name.stream_write(sink); )+
            }
        }

        impl<$($name: StreamRead),+> StreamRead for ($($name,)+) {
            fn stream_read<Sk: Source + ?Sized>(source: &mut Sk) -> Result<Self, StreamError> {
                Ok(($($name::stream_read(source)?,)+))
            }
        }
    };
}

impl_stream_for_tuple!(A);
impl_stream_for_tuple!(A, B);
impl_stream_for_tuple!(A, B, C);
impl_stream_for_tuple!(A, B, C, D);
impl_stream_for_tuple!(A, B, C, D, E);
impl_stream_for_tuple!(A, B, C, D, E, F);
impl_stream_for_tuple!(A, B, C, D, E, F, G);
impl_stream_for_tuple!(A, B, C, D, E, F, G, I);
