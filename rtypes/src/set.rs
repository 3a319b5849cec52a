//! Unordered set wrapper. Membership only, no ordering guarantees.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use bytes::Bytes;
use rtypes_client::Connection;

use crate::binding::{changed, count, KeyBinding};
use crate::codec::Codec;
use crate::error::Result;
use crate::registry;

/// Typed view of the set stored at one key.
pub struct Set<V> {
    binding: KeyBinding<V>,
}

impl Set<Bytes> {
    /// Binds `key` to the process-wide client and codec.
    pub fn from_registry(key: impl Into<String>) -> Result<Self> {
        Ok(registry::config()?.set(key))
    }
}

impl<V> Set<V> {
    pub fn new(key: impl Into<String>, client: Arc<dyn Connection>, codec: Arc<dyn Codec<V>>) -> Self {
        Set {
            binding: KeyBinding::new(key.into(), client, codec),
        }
    }

    pub fn key(&self) -> &str {
        self.binding.key()
    }

    pub fn contains(&self, member: &V) -> Result<bool> {
        let encoded = self.binding.encode(member)?;
        changed(
            self.binding
                .exec(&[b"SISMEMBER", self.binding.key_bytes(), &encoded[..]])?,
        )
    }

    pub fn size(&self) -> Result<usize> {
        count(self.binding.exec(&[b"SCARD", self.binding.key_bytes()])?)
    }

    /// Every member, decoded.
    pub fn members(&self) -> Result<HashSet<V>>
    where
        V: Eq + Hash,
    {
        let raw = self
            .binding
            .exec(&[b"SMEMBERS", self.binding.key_bytes()])?
            .into_bulk_array()?;
        Ok(self.binding.decode_all(raw)?.into_iter().collect())
    }

    /// Any one member, or `None` for an empty set.
    pub fn random_member(&self) -> Result<Option<V>> {
        let raw = self
            .binding
            .exec(&[b"SRANDMEMBER", self.binding.key_bytes()])?
            .into_bulk()?;
        self.binding.decode_opt(raw)
    }

    /// Returns true if `member` was not already present.
    pub fn add(&self, member: &V) -> Result<bool> {
        let encoded = self.binding.encode(member)?;
        changed(
            self.binding
                .exec(&[b"SADD", self.binding.key_bytes(), &encoded[..]])?,
        )
    }

    /// Returns true if `member` was present.
    pub fn remove(&self, member: &V) -> Result<bool> {
        let encoded = self.binding.encode(member)?;
        changed(
            self.binding
                .exec(&[b"SREM", self.binding.key_bytes(), &encoded[..]])?,
        )
    }
}

impl<V> Clone for Set<V> {
    fn clone(&self) -> Self {
        Set {
            binding: self.binding.clone(),
        }
    }
}

impl<V> fmt::Display for Set<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl<V> fmt::Debug for Set<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Set").field("key", &self.key()).finish()
    }
}
