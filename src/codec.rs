//! Key and value codecs.
//!
//! The encoders never look inside a key or value; they only decide where it
//! goes in the argument list. A codec turns the caller's types into wire bytes
//! and back, so the same option tree works for `String` keys, raw `Bytes`, or
//! any other representation the caller plugs in.

use crate::error::{ProtocolError, Result};
use bytes::Bytes;

/// Encodes and decodes keys of type `K` and values of type `V`.
pub trait RedisCodec<K, V>: Send + Sync {
    /// Encode a key into wire bytes.
    fn encode_key(&self, key: &K) -> Bytes;

    /// Encode a value into wire bytes.
    fn encode_value(&self, value: &V) -> Bytes;

    /// Decode wire bytes into a key.
    fn decode_key(&self, bytes: &[u8]) -> Result<K>;

    /// Decode wire bytes into a value.
    fn decode_value(&self, bytes: &[u8]) -> Result<V>;
}

/// UTF-8 codec for `String` keys and values.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl RedisCodec<String, String> for StringCodec {
    fn encode_key(&self, key: &String) -> Bytes {
        Bytes::copy_from_slice(key.as_bytes())
    }

    fn encode_value(&self, value: &String) -> Bytes {
        Bytes::copy_from_slice(value.as_bytes())
    }

    fn decode_key(&self, bytes: &[u8]) -> Result<String> {
        utf8(bytes)
    }

    fn decode_value(&self, bytes: &[u8]) -> Result<String> {
        utf8(bytes)
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| ProtocolError::InvalidUtf8.into())
}

/// Binary-safe codec for `Bytes` keys and values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCodec;

impl RedisCodec<Bytes, Bytes> for ByteCodec {
    fn encode_key(&self, key: &Bytes) -> Bytes {
        key.clone()
    }

    fn encode_value(&self, value: &Bytes) -> Bytes {
        value.clone()
    }

    fn decode_key(&self, bytes: &[u8]) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(bytes))
    }

    fn decode_value(&self, bytes: &[u8]) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_string_codec() {
        let codec = StringCodec;
        assert_eq!(codec.encode_key(&"temp:1".to_string()), Bytes::from("temp:1"));
        assert_eq!(codec.decode_value(b"21.5").unwrap(), "21.5");
    }

    #[test]
    fn test_string_codec_rejects_invalid_utf8() {
        let err = StringCodec.decode_key(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::InvalidUtf8)));
    }

    #[test]
    fn test_byte_codec_is_binary_safe() {
        let raw = Bytes::from_static(&[0, 159, 146, 150]);
        assert_eq!(ByteCodec.encode_value(&raw), raw);
        assert_eq!(ByteCodec.decode_key(&raw).unwrap(), raw);
    }
}
