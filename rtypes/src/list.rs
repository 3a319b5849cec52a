//! Double-ended list wrapper.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use rtypes_client::Connection;

use crate::binding::{count, KeyBinding};
use crate::codec::Codec;
use crate::error::Result;
use crate::registry;
use crate::slice::SliceSpec;

/// Typed view of the list stored at one key.
pub struct List<V> {
    binding: KeyBinding<V>,
}

impl List<Bytes> {
    /// Binds `key` to the process-wide client and codec.
    pub fn from_registry(key: impl Into<String>) -> Result<Self> {
        Ok(registry::config()?.list(key))
    }
}

impl<V> List<V> {
    pub fn new(key: impl Into<String>, client: Arc<dyn Connection>, codec: Arc<dyn Codec<V>>) -> Self {
        List {
            binding: KeyBinding::new(key.into(), client, codec),
        }
    }

    pub fn key(&self) -> &str {
        self.binding.key()
    }

    pub fn size(&self) -> Result<usize> {
        count(self.binding.exec(&[b"LLEN", self.binding.key_bytes()])?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    /// Element at `index` (negative counts from the tail), `None` if out of
    /// range.
    pub fn index_at(&self, index: i64) -> Result<Option<V>> {
        let index = index.to_string();
        let raw = self
            .binding
            .exec(&[b"LINDEX", self.binding.key_bytes(), index.as_bytes()])?
            .into_bulk()?;
        self.binding.decode_opt(raw)
    }

    /// Inclusive `start..=stop`.
    pub fn range(&self, start: i64, stop: i64) -> Result<Vec<V>> {
        let (start, stop) = (start.to_string(), stop.to_string());
        let raw = self
            .binding
            .exec(&[
                b"LRANGE",
                self.binding.key_bytes(),
                start.as_bytes(),
                stop.as_bytes(),
            ])?
            .into_bulk_array()?;
        self.binding.decode_all(raw)
    }

    /// Slice access over `range`. Defaults cover the whole list; a negative
    /// step reverses the fetched slice before striding.
    pub fn slice(&self, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Result<Vec<V>> {
        let spec = SliceSpec::new(start, stop, step)?;
        let mut items = self.range(spec.start, spec.stop)?;
        if spec.reverse {
            items.reverse();
        }
        Ok(spec.apply_stride(items))
    }

    /// Appends `value`; returns the new length.
    pub fn push_back(&self, value: &V) -> Result<usize> {
        self.push(b"RPUSH", value)
    }

    /// Prepends `value`; returns the new length.
    pub fn push_front(&self, value: &V) -> Result<usize> {
        self.push(b"LPUSH", value)
    }

    pub fn pop_back(&self) -> Result<Option<V>> {
        self.pop(b"RPOP")
    }

    pub fn pop_front(&self) -> Result<Option<V>> {
        self.pop(b"LPOP")
    }

    fn push(&self, command: &[u8], value: &V) -> Result<usize> {
        let encoded = self.binding.encode(value)?;
        count(
            self.binding
                .exec(&[command, self.binding.key_bytes(), &encoded[..]])?,
        )
    }

    fn pop(&self, command: &[u8]) -> Result<Option<V>> {
        let raw = self
            .binding
            .exec(&[command, self.binding.key_bytes()])?
            .into_bulk()?;
        self.binding.decode_opt(raw)
    }
}

impl<V> Clone for List<V> {
    fn clone(&self) -> Self {
        List {
            binding: self.binding.clone(),
        }
    }
}

impl<V> fmt::Display for List<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl<V> fmt::Debug for List<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List").field("key", &self.key()).finish()
    }
}
