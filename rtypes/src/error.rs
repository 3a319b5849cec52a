//! Error taxonomy for the typed wrappers.
//!
//! Only `Configuration` and `InvalidArgument` originate in this crate's own
//! contract checks. Everything the client reports passes through unchanged
//! as `Error::Client`.

use rtypes_client::ClientError;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Result alias for codec implementations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum Error {
    /// No client handle was supplied and the registry holds none.
    #[error("no client handle available ({state}); call registry::initialize first")]
    Configuration { state: String },

    /// A structurally wrong argument, rejected before any command is sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Encoding or decoding a value failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The server's INFO output had no parsable `redis_version`.
    #[error("cannot determine server version from {0:?}")]
    Version(String),

    /// Anything the backing-store client reported, untranslated.
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("value is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("json codec: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised by a caller-supplied transform.
    #[error("custom codec: {0}")]
    Custom(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl CodecError {
    /// Wraps any message or error from a caller-supplied transform.
    pub fn custom(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        CodecError::Custom(err.into())
    }
}
