//! Pluggable value codecs

use crate::CacheError;
use serde::{de::DeserializeOwned, Serialize};

/// Converts typed values to and from the opaque bytes kept in the store
///
/// Implement this trait to add custom formats.
/// Built-in implementations: JSON, MessagePack, Bincode.
pub trait Codec: Send + Sync + Clone + 'static {
    /// Name of the codec (for debugging/metrics)
    fn name(&self) -> &str;

    /// Encode a value to bytes
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CacheError>;

    /// Decode non-empty bytes to a value
    fn decode_value<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CacheError>;

    /// Decode bytes read from the store
    ///
    /// Empty bytes mean "no value" and yield `Ok(None)`; malformed bytes are
    /// an error.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<Option<T>, CacheError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        self.decode_value(bytes).map(Some)
    }
}

/// JSON codec (default)
///
/// Human-readable, widely compatible, good for debugging.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn decode_value<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CacheError> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

/// MessagePack codec (optional)
///
/// Faster and more compact than JSON, but not human-readable.
/// Enable with `msgpack` feature.
#[cfg(feature = "msgpack")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

#[cfg(feature = "msgpack")]
impl Codec for MsgPackCodec {
    fn name(&self) -> &str {
        "msgpack"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CacheError> {
        rmp_serde::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn decode_value<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CacheError> {
        rmp_serde::from_slice(bytes).map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

/// Bincode codec (optional)
///
/// Length-prefixed binary, the closest match to a native object format.
/// Enable with `bincode` feature.
#[cfg(feature = "bincode")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

#[cfg(feature = "bincode")]
impl Codec for BincodeCodec {
    fn name(&self) -> &str {
        "bincode"
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CacheError> {
        bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn decode_value<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CacheError> {
        let (val, _len) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| CacheError::Deserialization(e.to_string()))?;
        Ok(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Order {
        id: u64,
        customer: String,
        lines: Vec<(String, i32)>,
    }

    fn sample_order() -> Order {
        Order {
            id: 7,
            customer: "acme".to_string(),
            lines: vec![("bolt".to_string(), 40), ("nut".to_string(), 40)],
        }
    }

    #[test]
    fn test_json_scalars() {
        let codec = JsonCodec;

        let bytes = codec.encode("hello").unwrap();
        let decoded: Option<String> = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.as_deref(), Some("hello"));

        let bytes = codec.encode(&-42i64).unwrap();
        assert_eq!(codec.decode::<i64>(&bytes).unwrap(), Some(-42));
    }

    #[test]
    fn test_json_record() {
        let codec = JsonCodec;
        let bytes = codec.encode(&sample_order()).unwrap();
        let decoded: Option<Order> = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, Some(sample_order()));
    }

    #[test]
    fn test_empty_bytes_are_no_value() {
        assert_eq!(JsonCodec.decode::<String>(&[]).unwrap(), None);
    }

    #[test]
    fn test_malformed_bytes_fail() {
        let err = JsonCodec.decode::<u32>(b"{not json").unwrap_err();
        assert_eq!(err.kind(), "deserialization");
    }

    #[test]
    fn test_shape_mismatch_fails() {
        let bytes = JsonCodec.encode("text").unwrap();
        assert!(JsonCodec.decode::<u32>(&bytes).is_err());
    }

    #[test]
    fn test_codec_name() {
        assert_eq!(JsonCodec.name(), "json");
    }

    #[cfg(feature = "msgpack")]
    #[test]
    fn test_msgpack_record() {
        let codec = MsgPackCodec;
        let bytes = codec.encode(&sample_order()).unwrap();
        assert_eq!(codec.decode::<Order>(&bytes).unwrap(), Some(sample_order()));
    }

    #[cfg(feature = "bincode")]
    #[test]
    fn test_bincode_record() {
        let codec = BincodeCodec;
        let bytes = codec.encode(&sample_order()).unwrap();
        assert_eq!(codec.decode::<Order>(&bytes).unwrap(), Some(sample_order()));
    }
}
