//! # Synchronous Client API
//!
//! Purpose: Expose a compact, blocking API for issuing Redis-compatible
//! commands over RESP2.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `KVClient` hides pooling and protocol details.
//! 2. **Borrow-Friendly API**: Accept `&[&[u8]]` to avoid unnecessary copies.
//! 3. **Fail Fast**: Protocol violations surface immediately as errors.
//! 4. **Strategy Pattern**: `Connection` lets callers swap the transport.

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::{trace, warn};

use crate::pool::ConnectionPool;
use crate::resp::RespValue;

/// Host used when `REDIS_HOST` is unset.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when `REDIS_PORT` is unset or unparsable.
pub const DEFAULT_PORT: u16 = 6379;

/// Result type for the sync client.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the sync client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or IO failure while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// RESP2 framing or parse error.
    #[error("protocol error")]
    Protocol,
    /// Server returned an error reply.
    #[error("server error: {}", String::from_utf8_lossy(.message))]
    Server { message: Vec<u8> },
    /// Response type did not match the expected command response.
    #[error("unexpected response")]
    UnexpectedResponse,
    /// Pool is at capacity and no idle connections are available.
    #[error("connection pool exhausted")]
    PoolExhausted,
    /// Address could not be resolved into a socket address.
    #[error("invalid address")]
    InvalidAddress,
}

/// A handle that can execute one command and return its reply.
///
/// `KVClient` is the networked implementation. Anything else that speaks the
/// same command set (an in-process fake, a proxy) can stand in for it.
pub trait Connection: Send + Sync {
    /// Sends `args` as a single command and returns the parsed reply.
    ///
    /// Error replies from the server are returned as `RespValue::Error`, not
    /// as `Err`; the `RespValue::into_*` helpers perform that translation.
    fn exec(&self, args: &[&[u8]]) -> ClientResult<RespValue>;
}

/// Configuration for the synchronous client and its pool.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address, e.g. "127.0.0.1:6379" or "localhost:6379".
    pub addr: String,
    /// Maximum idle connections kept in the pool.
    pub max_idle: usize,
    /// Maximum total connections (idle + in-use).
    pub max_total: usize,
    /// Optional TCP read timeout.
    pub read_timeout: Option<Duration>,
    /// Optional TCP write timeout.
    pub write_timeout: Option<Duration>,
    /// Optional TCP connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            addr: "127.0.0.1:6379".to_string(),
            max_idle: 8,
            max_total: 16,
            read_timeout: None,
            write_timeout: None,
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Builds a configuration from `REDIS_HOST` and `REDIS_PORT`.
    ///
    /// Pool sizes and timeouts keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("REDIS_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup("REDIS_PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "ignoring unparsable REDIS_PORT");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };
        ClientConfig {
            addr: format!("{}:{}", host, port),
            ..ClientConfig::default()
        }
    }
}

/// Synchronous client with connection pooling.
///
/// This is a facade over the pool and RESP encoder/decoder. Each call acquires
/// a connection, executes one command, and returns the connection to the pool.
pub struct KVClient {
    pool: ConnectionPool,
}

impl KVClient {
    /// Creates a client with default configuration.
    pub fn connect(addr: impl Into<String>) -> ClientResult<Self> {
        let config = ClientConfig {
            addr: addr.into(),
            ..ClientConfig::default()
        };
        Self::with_config(config)
    }

    /// Creates a client with a custom configuration.
    ///
    /// No connection is opened until the first command.
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        let pool = ConnectionPool::new(config);
        Ok(KVClient { pool })
    }

    /// Pings the server. Returns the raw response payload.
    pub fn ping(&self, payload: Option<&[u8]>) -> ClientResult<Vec<u8>> {
        let response = match payload {
            Some(data) => self.exec(&[b"PING", data])?,
            None => self.exec(&[b"PING"])?,
        };
        match response {
            RespValue::Simple(text) => Ok(text),
            RespValue::Bulk(Some(data)) => Ok(data),
            RespValue::Error(message) => Err(ClientError::Server { message }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Fetches server INFO output, optionally restricted to one section.
    pub fn info(&self, section: Option<&str>) -> ClientResult<Vec<u8>> {
        let response = match section {
            Some(name) => self.exec(&[b"INFO", name.as_bytes()])?,
            None => self.exec(&[b"INFO"])?,
        };
        match response.into_bulk()? {
            Some(data) => Ok(data),
            None => Err(ClientError::UnexpectedResponse),
        }
    }
}

impl Connection for KVClient {
    fn exec(&self, args: &[&[u8]]) -> ClientResult<RespValue> {
        if let Some(name) = args.first() {
            trace!(
                command = %String::from_utf8_lossy(name),
                args = args.len() - 1,
                "sending command"
            );
        }
        self.pool.acquire()?.exec(args)
    }
}
