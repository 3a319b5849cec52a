//! # Process-Wide Defaults
//!
//! Purpose: Let applications set a client handle and codec once at startup
//! and build wrappers by key alone.
//!
//! ## Notes
//! - Only wrappers over `Bytes` can come from here. Typed values go through
//!   an explicit `Config`.
//! - `set_encoding` affects wrappers built afterwards; existing wrappers keep
//!   the codec they were built with.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{const_rwlock, RwLock};
use rtypes_client::{Connection, RespValue};
use tracing::{debug, info};

use crate::codec::{Codec, FnCodec, Identity, Transform};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::version::{self, ServerVersion};

struct Registry {
    client: Option<Arc<dyn Connection>>,
    codec: Option<Arc<dyn Codec<Bytes>>>,
}

static REGISTRY: RwLock<Registry> = const_rwlock(Registry {
    client: None,
    codec: None,
});

/// Installs the default client handle, replacing any previous one.
pub fn initialize(client: Arc<dyn Connection>) {
    let mut registry = REGISTRY.write();
    let replaced = registry.client.replace(client).is_some();
    info!(replaced, "registered default client handle");
}

/// Installs the default codec. A missing side is identity.
pub fn set_encoding(encoder: Option<Transform>, decoder: Option<Transform>) {
    debug!(
        encoder = encoder.is_some(),
        decoder = decoder.is_some(),
        "registered default encoding"
    );
    let codec: Arc<dyn Codec<Bytes>> = match (encoder, decoder) {
        (None, None) => Arc::new(Identity),
        (encoder, decoder) => Arc::new(FnCodec::new(encoder, decoder)),
    };
    REGISTRY.write().codec = Some(codec);
}

/// Snapshot of the current defaults.
pub fn config() -> Result<Config<Bytes>> {
    let registry = REGISTRY.read();
    let client = registry.client.clone().ok_or_else(|| Error::Configuration {
        state: describe(&registry),
    })?;
    let codec = registry
        .codec
        .clone()
        .unwrap_or_else(|| Arc::new(Identity) as Arc<dyn Codec<Bytes>>);
    Ok(Config::new(client, codec))
}

/// True if the default client answers `PING`.
///
/// Transport and server failures read as `false`; only a missing client is
/// an error.
pub fn ping() -> Result<bool> {
    let config = config()?;
    match config.client().exec(&[b"PING"]) {
        Ok(RespValue::Simple(reply)) => Ok(reply.eq_ignore_ascii_case(b"PONG")),
        Ok(other) => {
            debug!(reply = ?other, "unexpected PING reply");
            Ok(false)
        }
        Err(err) => {
            debug!(error = %err, "PING failed");
            Ok(false)
        }
    }
}

/// Version of the server behind `client`.
pub fn server_version(client: &dyn Connection) -> Result<ServerVersion> {
    version::server_version(client)
}

fn describe(registry: &Registry) -> String {
    format!(
        "client: unset, codec: {}",
        if registry.codec.is_some() { "custom" } else { "identity" }
    )
}
