//! Hash wrapper: UTF-8 field names, codec-encoded values.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use rtypes_client::{ClientError, Connection};

use crate::binding::{changed, count, KeyBinding};
use crate::codec::Codec;
use crate::error::{CodecError, Error, Result};
use crate::registry;

/// Typed view of the hash stored at one key.
pub struct Hash<V> {
    binding: KeyBinding<V>,
}

impl Hash<Bytes> {
    /// Binds `key` to the process-wide client and codec.
    pub fn from_registry(key: impl Into<String>) -> Result<Self> {
        Ok(registry::config()?.hash(key))
    }
}

impl<V> Hash<V> {
    pub fn new(key: impl Into<String>, client: Arc<dyn Connection>, codec: Arc<dyn Codec<V>>) -> Self {
        Hash {
            binding: KeyBinding::new(key.into(), client, codec),
        }
    }

    pub fn key(&self) -> &str {
        self.binding.key()
    }

    /// Number of fields (`HLEN`).
    pub fn size(&self) -> Result<usize> {
        count(self.binding.exec(&[b"HLEN", self.binding.key_bytes()])?)
    }

    pub fn get(&self, field: &str) -> Result<Option<V>> {
        let raw = self
            .binding
            .exec(&[b"HGET", self.binding.key_bytes(), field.as_bytes()])?
            .into_bulk()?;
        self.binding.decode_opt(raw)
    }

    /// Returns true if the field was newly created.
    pub fn set(&self, field: &str, value: &V) -> Result<bool> {
        let encoded = self.binding.encode(value)?;
        changed(self.binding.exec(&[
            b"HSET",
            self.binding.key_bytes(),
            field.as_bytes(),
            &encoded[..],
        ])?)
    }

    pub fn contains(&self, field: &str) -> Result<bool> {
        changed(
            self.binding
                .exec(&[b"HEXISTS", self.binding.key_bytes(), field.as_bytes()])?,
        )
    }

    /// Returns true if the field existed.
    pub fn delete(&self, field: &str) -> Result<bool> {
        changed(
            self.binding
                .exec(&[b"HDEL", self.binding.key_bytes(), field.as_bytes()])?,
        )
    }

    pub fn get_all(&self) -> Result<HashMap<String, V>> {
        Ok(self.items()?.into_iter().collect())
    }

    pub fn keys(&self) -> Result<HashSet<String>> {
        let raw = self
            .binding
            .exec(&[b"HKEYS", self.binding.key_bytes()])?
            .into_bulk_array()?;
        raw.into_iter().map(field_name).collect()
    }

    /// Every value, decoded. Order is unspecified.
    pub fn values(&self) -> Result<Vec<V>> {
        let raw = self
            .binding
            .exec(&[b"HVALS", self.binding.key_bytes()])?
            .into_bulk_array()?;
        self.binding.decode_all(raw)
    }

    /// `(field, value)` pairs in whatever order the server returned them.
    pub fn items(&self) -> Result<Vec<(String, V)>> {
        let flat = self
            .binding
            .exec(&[b"HGETALL", self.binding.key_bytes()])?
            .into_bulk_array()?;
        if flat.len() % 2 != 0 {
            return Err(Error::from(ClientError::UnexpectedResponse));
        }
        let mut items = Vec::with_capacity(flat.len() / 2);
        let mut flat = flat.into_iter();
        while let (Some(field), Some(value)) = (flat.next(), flat.next()) {
            items.push((field_name(field)?, self.binding.decode(value)?));
        }
        Ok(items)
    }

    /// Sets several fields with one `HMSET`. An empty input sends nothing.
    pub fn update<F, B, I>(&self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (F, B)>,
        F: AsRef<str>,
        B: Borrow<V>,
    {
        let encoded = fields
            .into_iter()
            .map(|(field, value)| -> Result<(F, Bytes)> {
                let encoded = self.binding.encode(value.borrow())?;
                Ok((field, encoded))
            })
            .collect::<Result<Vec<_>>>()?;
        if encoded.is_empty() {
            return Ok(());
        }

        let mut args: Vec<&[u8]> = Vec::with_capacity(2 + encoded.len() * 2);
        args.push(b"HMSET");
        args.push(self.binding.key_bytes());
        for (field, value) in &encoded {
            args.push(field.as_ref().as_bytes());
            args.push(&value[..]);
        }
        self.binding.exec(&args)?.into_ok()?;
        Ok(())
    }
}

fn field_name(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).map_err(|err| Error::from(CodecError::from(err)))
}

impl<V> Clone for Hash<V> {
    fn clone(&self) -> Self {
        Hash {
            binding: self.binding.clone(),
        }
    }
}

impl<V> fmt::Display for Hash<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl<V> fmt::Debug for Hash<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hash").field("key", &self.key()).finish()
    }
}
