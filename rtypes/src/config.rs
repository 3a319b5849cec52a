//! # Wrapper Factory
//!
//! Purpose: Hold an immutable {client, codec} pair and stamp out wrappers
//! bound to it. This is the primary way to construct wrappers; the registry
//! is a convenience layer that hands out a `Config<Bytes>`.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use rtypes_client::Connection;

use crate::codec::{Codec, Identity};
use crate::hash::Hash;
use crate::list::List;
use crate::set::Set;
use crate::sorted_set::SortedSet;

/// Client handle plus the codec used for every wrapper it builds.
pub struct Config<V> {
    client: Arc<dyn Connection>,
    codec: Arc<dyn Codec<V>>,
}

impl Config<Bytes> {
    /// Raw bytes in, raw bytes out.
    pub fn identity(client: Arc<dyn Connection>) -> Self {
        Config::new(client, Arc::new(Identity))
    }
}

impl<V> Config<V> {
    pub fn new(client: Arc<dyn Connection>, codec: Arc<dyn Codec<V>>) -> Self {
        Config { client, codec }
    }

    /// Same client, different value type.
    pub fn with_codec<W>(&self, codec: Arc<dyn Codec<W>>) -> Config<W> {
        Config::new(Arc::clone(&self.client), codec)
    }

    pub fn client(&self) -> &Arc<dyn Connection> {
        &self.client
    }

    pub fn codec(&self) -> &Arc<dyn Codec<V>> {
        &self.codec
    }

    pub fn sorted_set(&self, key: impl Into<String>) -> SortedSet<V> {
        SortedSet::new(key, Arc::clone(&self.client), Arc::clone(&self.codec))
    }

    pub fn set(&self, key: impl Into<String>) -> Set<V> {
        Set::new(key, Arc::clone(&self.client), Arc::clone(&self.codec))
    }

    pub fn hash(&self, key: impl Into<String>) -> Hash<V> {
        Hash::new(key, Arc::clone(&self.client), Arc::clone(&self.codec))
    }

    pub fn list(&self, key: impl Into<String>) -> List<V> {
        List::new(key, Arc::clone(&self.client), Arc::clone(&self.codec))
    }
}

impl<V> Clone for Config<V> {
    fn clone(&self) -> Self {
        Config {
            client: Arc::clone(&self.client),
            codec: Arc::clone(&self.codec),
        }
    }
}

impl<V> fmt::Debug for Config<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config").finish_non_exhaustive()
    }
}
