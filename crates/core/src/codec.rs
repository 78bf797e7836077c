//! Result codec seam
//!
//! Adapters that persist something other than plain JSON values implement
//! [`Codec`] and select an implementation by file extension. The engine only
//! ever sees bytes in and a typed value out.

use crate::{Error, Result};
use serde_json::Value;
use std::fmt::Debug;

/// Serialize/deserialize one cached result to and from file bytes
pub trait Codec: Send + Sync + Debug {
    /// The value type this codec persists
    type Value;

    /// The file extension this codec is registered under
    fn extension(&self) -> &'static str;

    /// Encode a value into file bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if encoding fails.
    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>>;

    /// Decode file bytes back into a value
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the bytes do not decode.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Value>;
}

/// The built-in codec for plain JSON values
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    type Value = Value;

    fn extension(&self) -> &'static str {
        "json"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| Error::serialization(format!("failed to encode value: {e}")))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::serialization(format!("failed to decode value: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_codec_round_trips() {
        let codec = JsonCodec;
        let value = json!({"a": [1, 2.5, "three", null], "b": {"c": true}});
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn json_codec_rejects_garbage() {
        let err = JsonCodec.decode(b"\x00\x01").unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }
}
