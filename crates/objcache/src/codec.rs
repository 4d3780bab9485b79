//! Codec: the pluggable serializer between values and object files.
//!
//! The store only ever sees opaque bytes. Whatever format a codec writes is
//! the codec's business, including whether blobs survive a change of codec or
//! of the value's type.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode/decode pair injected into a [`Client`](crate::Client) and every
/// [`Cache`](crate::Cache) it hands out.
pub trait Codec: Clone + Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, Self::Error>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Self::Error>;
}

/// Compact binary via bincode. The default codec.
///
/// Round-trips anything serde can describe, including non-finite floats and
/// maps keyed by tuples or structs. Blobs are not self-describing: decoding
/// with a type other than the one saved gives garbage or an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    type Error = bincode::Error;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(value)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Self::Error> {
        bincode::deserialize(bytes)
    }
}

/// JSON via serde_json.
///
/// Readable on disk, but JSON cannot hold everything: map keys must be
/// strings, and `NaN`/infinities are written as `null`, which then fails to
/// decode as a float. Used by the CLI, whose values are JSON to begin with.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Human-readable output, handy when poking at a cache directory by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    type Error = serde_json::Error;

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, Self::Error> {
        if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, Self::Error> {
        serde_json::from_slice(bytes)
    }
}
