//! The {key, client, codec} triple every wrapper is built on.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use rtypes_client::{ClientError, Connection, RespValue};

use crate::codec::Codec;
use crate::error::{Error, Result};

pub(crate) struct KeyBinding<V> {
    key: String,
    client: Arc<dyn Connection>,
    codec: Arc<dyn Codec<V>>,
}

impl<V> KeyBinding<V> {
    pub(crate) fn new(key: String, client: Arc<dyn Connection>, codec: Arc<dyn Codec<V>>) -> Self {
        KeyBinding { key, client, codec }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn key_bytes(&self) -> &[u8] {
        self.key.as_bytes()
    }

    pub(crate) fn client(&self) -> &dyn Connection {
        self.client.as_ref()
    }

    pub(crate) fn exec(&self, args: &[&[u8]]) -> Result<RespValue> {
        Ok(self.client.exec(args)?)
    }

    pub(crate) fn encode(&self, value: &V) -> Result<Bytes> {
        Ok(self.codec.encode(value)?)
    }

    pub(crate) fn decode(&self, wire: Vec<u8>) -> Result<V> {
        Ok(self.codec.decode(Bytes::from(wire))?)
    }

    pub(crate) fn decode_opt(&self, wire: Option<Vec<u8>>) -> Result<Option<V>> {
        wire.map(|raw| self.decode(raw)).transpose()
    }

    pub(crate) fn decode_all(&self, wire: Vec<Vec<u8>>) -> Result<Vec<V>> {
        wire.into_iter().map(|raw| self.decode(raw)).collect()
    }
}

impl<V> Clone for KeyBinding<V> {
    fn clone(&self) -> Self {
        KeyBinding {
            key: self.key.clone(),
            client: Arc::clone(&self.client),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<V> fmt::Debug for KeyBinding<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBinding").field("key", &self.key).finish_non_exhaustive()
    }
}

/// Interprets an integer reply as "something changed".
pub(crate) fn changed(reply: RespValue) -> Result<bool> {
    Ok(reply.into_integer()? > 0)
}

/// Interprets an integer reply as a non-negative count.
pub(crate) fn count(reply: RespValue) -> Result<usize> {
    let value = reply.into_integer()?;
    usize::try_from(value).map_err(|_| Error::from(ClientError::UnexpectedResponse))
}

/// Parses a score string the server produced (`1`, `2.5`, `inf`, `-inf`).
pub(crate) fn parse_score(raw: &[u8]) -> Result<f64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|text| text.parse::<f64>().ok())
        .ok_or_else(|| Error::from(ClientError::UnexpectedResponse))
}

/// Renders a score the way ZADD accepts it.
pub(crate) fn format_score(score: f64) -> String {
    if score == f64::INFINITY {
        "+inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        score.to_string()
    }
}
