//! Codecs that turn typed keys and values into canonical bytes
//!
//! A namespace uses one codec for both its key type and its value type. The
//! codec's name is persisted with the namespace so data written with one codec
//! is never read back with another.
//!
//! # Example
//!
//! ```
//! use typekv_core::{BincodeCodec, Codec};
//!
//! let codec = BincodeCodec;
//! let bytes = codec.encode(&(7u32, "seven".to_string())).unwrap();
//! let decoded: (u32, String) = codec.decode(&bytes).unwrap();
//! assert_eq!(decoded, (7, "seven".to_string()));
//! ```

use crate::error::{Result, StoreError};
use bincode::Options;
use serde::{de::DeserializeOwned, Serialize};

/// Encode/decode pair for typed keys and values
pub trait Codec: Send + Sync + 'static {
    /// Encode a value to bytes
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode a value from bytes
    ///
    /// Must fail when `bytes` is not exactly one encoded `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;

    /// Stable codec name (persisted in namespace signatures)
    fn name(&self) -> &str;
}

/// Compact binary codec (default)
///
/// Fixed-width big-endian integers, so unsigned integer keys sort numerically
/// in LMDB. Trailing bytes are rejected on decode, which catches most type
/// mismatches instead of silently reading a prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl BincodeCodec {
    fn options() -> impl Options {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_big_endian()
            .reject_trailing_bytes()
    }
}

impl Codec for BincodeCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        Self::options()
            .serialize(value)
            .map_err(|e| StoreError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        Self::options()
            .deserialize(bytes)
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn name(&self) -> &str {
        "bincode"
    }
}

/// JSON codec (human-readable, larger size)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn name(&self) -> &str {
        "json"
    }
}
