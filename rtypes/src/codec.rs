//! # Value Codecs
//!
//! Purpose: Translate application values to the bytes stored under a key and
//! back again.
//!
//! ## Design Principles
//! 1. **Strategy Pattern**: Wrappers hold an `Arc<dyn Codec<V>>` and never
//!    inspect values themselves.
//! 2. **Identity by Default**: `Identity` passes `Bytes` through untouched.
//! 3. **Caller-Owned Fidelity**: `decode(encode(v)) == v` is assumed, never
//!    checked.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecResult;

/// Encoder/decoder pair for one application value type.
pub trait Codec<V>: Send + Sync {
    /// Converts a value into its wire representation.
    fn encode(&self, value: &V) -> CodecResult<Bytes>;

    /// Rebuilds a value from bytes previously produced by `encode`.
    fn decode(&self, wire: Bytes) -> CodecResult<V>;
}

/// Stores raw bytes as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Codec<Bytes> for Identity {
    fn encode(&self, value: &Bytes) -> CodecResult<Bytes> {
        // Bytes clones are a refcount bump.
        Ok(value.clone())
    }

    fn decode(&self, wire: Bytes) -> CodecResult<Bytes> {
        Ok(wire)
    }
}

/// Stores `String` values as UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl Codec<String> for Utf8 {
    fn encode(&self, value: &String) -> CodecResult<Bytes> {
        Ok(Bytes::copy_from_slice(value.as_bytes()))
    }

    fn decode(&self, wire: Bytes) -> CodecResult<String> {
        Ok(String::from_utf8(wire.to_vec())?)
    }
}

/// Stores any serde type as a JSON document.
pub struct Json<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Json<T> {
    pub fn new() -> Self {
        Json {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Json<{}>", std::any::type_name::<T>())
    }
}

impl<T> Codec<T> for Json<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> CodecResult<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    fn decode(&self, wire: Bytes) -> CodecResult<T> {
        Ok(serde_json::from_slice(&wire)?)
    }
}

/// A byte-to-byte transform, one direction of an `FnCodec`.
///
/// Return `CodecError::custom(..)` to reject bytes the transform cannot
/// handle; wrappers surface it as `Error::Codec`.
pub type Transform = Arc<dyn Fn(&[u8]) -> CodecResult<Vec<u8>> + Send + Sync>;

/// Boxes a closure as a `Transform`.
pub fn transform<F>(f: F) -> Transform
where
    F: Fn(&[u8]) -> CodecResult<Vec<u8>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Codec assembled from a loose encoder and decoder.
///
/// A missing side behaves as identity. This is the shape
/// `registry::set_encoding` installs process-wide.
#[derive(Clone, Default)]
pub struct FnCodec {
    encoder: Option<Transform>,
    decoder: Option<Transform>,
}

impl FnCodec {
    pub fn new(encoder: Option<Transform>, decoder: Option<Transform>) -> Self {
        FnCodec { encoder, decoder }
    }
}

impl fmt::Debug for FnCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCodec")
            .field("encoder", &self.encoder.is_some())
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}

impl Codec<Bytes> for FnCodec {
    fn encode(&self, value: &Bytes) -> CodecResult<Bytes> {
        Ok(match &self.encoder {
            Some(encode) => Bytes::from(encode(value)?),
            None => value.clone(),
        })
    }

    fn decode(&self, wire: Bytes) -> CodecResult<Bytes> {
        Ok(match &self.decoder {
            Some(decode) => Bytes::from(decode(&wire)?),
            None => wire,
        })
    }
}
