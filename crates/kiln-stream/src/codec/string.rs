//! Codec impls for strings
//!
//! Two framings exist on purpose. C strings are tag material (type names,
//! fixed labels) and are emitted as their bytes plus the terminating NUL with
//! no length prefix. Owned and borrowed UTF-8 strings are data and are
//! length-prefixed with no terminator; only this form is decodable.

use std::ffi::{CStr, CString};

use crate::error::StreamError;
use crate::sink::Sink;
use crate::source::Source;
use crate::{StreamRead, StreamWrite};

impl StreamWrite for str {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        self.len().stream_write(sink);
        sink.write_bytes(self.as_bytes());
    }
}

impl StreamWrite for String {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        self.as_str().stream_write(sink);
    }
}

impl StreamRead for String {
    fn stream_read<S: Source + ?Sized>(source: &mut S) -> Result<Self, StreamError> {
        let len = usize::stream_read(source)?;
        if len > source.remaining() {
            return Err(StreamError::LengthOutOfBounds {
                length: len,
                remaining: source.remaining(),
            });
        }
        let bytes = source.read_bytes(len)?;
        Self::from_utf8(bytes.to_vec()).map_err(|_| StreamError::InvalidUtf8)
    }
}

impl StreamWrite for CStr {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        sink.write_bytes(self.to_bytes_with_nul());
    }
}

impl StreamWrite for CString {
    fn stream_write<S: Sink + ?Sized>(&self, sink: &mut S) {
        self.as_c_str().stream_write(sink);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ByteVectorSink;
    use crate::source::SliceSource;

    fn encoded<T: StreamWrite + ?Sized>(value: &T) -> Vec<u8> {
        let mut sink = ByteVectorSink::new();
        value.stream_write(&mut sink);
        sink.into_bytes()
    }

    #[test]
    fn c_strings_are_nul_terminated_with_no_length() {
        assert_eq!(encoded(c"string"), b"string\0".to_vec());
        assert_eq!(encoded(c""), b"\0".to_vec());
    }

    #[test]
    fn strings_are_length_prefixed_with_no_terminator() {
        let mut expected = ByteVectorSink::new();
        6usize.stream_write(&mut expected);
        expected.write_bytes(b"string");
        assert_eq!(encoded("string"), expected.into_bytes());
    }

    #[test]
    fn owned_and_borrowed_strings_encode_identically() {
        assert_eq!(encoded("pipeline"), encoded(&"pipeline".to_owned()));
    }

    #[test]
    fn strings_round_trip() {
        let bytes = encoded("cache me");
        let mut source = SliceSource::new(&bytes);
        assert_eq!(String::stream_read(&mut source).unwrap(), "cache me");
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn empty_string_round_trips() {
        let bytes = encoded("");
        let mut source = SliceSource::new(&bytes);
        assert_eq!(String::stream_read(&mut source).unwrap(), "");
    }

    #[test]
    fn oversized_string_length_is_rejected() {
        let mut sink = ByteVectorSink::new();
        usize::MAX.stream_write(&mut sink);
        let bytes = sink.into_bytes();
        let mut source = SliceSource::new(&bytes);
        assert!(matches!(
            String::stream_read(&mut source),
            Err(StreamError::LengthOutOfBounds { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut sink = ByteVectorSink::new();
        2usize.stream_write(&mut sink);
        sink.write_bytes(&[0xFF, 0xFE]);
        let bytes = sink.into_bytes();
        let mut source = SliceSource::new(&bytes);
        assert_eq!(String::stream_read(&mut source), Err(StreamError::InvalidUtf8));
    }
}
