//! # Connection Pool
//!
//! Purpose: Reuse TCP connections across wrapper calls so each collection
//! operation costs one round trip, not one handshake.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: A bounded set of idle sockets plus a count of
//!    sockets currently lent out.
//! 2. **One Lock, Short Hold**: Checkout and checkin each take the mutex once
//!    and never while doing IO.
//! 3. **Fail Fast**: No waiting; a full pool is `PoolExhausted`.
//! 4. **Broken Sockets Die**: A lease whose command failed is dropped, not
//!    returned, since the stream may hold half a reply.

use std::collections::VecDeque;
use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::client::{ClientConfig, ClientError, ClientResult};
use crate::resp::{encode_command, RespReader, RespValue};

struct Slots {
    idle: VecDeque<Wire>,
    /// Idle plus leased.
    open: usize,
}

struct Shared {
    config: ClientConfig,
    slots: Mutex<Slots>,
}

impl Shared {
    fn checkin(&self, wire: Wire) {
        let mut slots = self.slots.lock();
        if slots.idle.len() < self.config.max_idle {
            slots.idle.push_back(wire);
        } else {
            slots.open = slots.open.saturating_sub(1);
        }
    }

    fn forget(&self) {
        let mut slots = self.slots.lock();
        slots.open = slots.open.saturating_sub(1);
    }
}

enum Checkout {
    Reused(Wire),
    Reserved,
    Full,
}

/// Bounded pool of RESP connections to one address.
#[derive(Clone)]
pub struct ConnectionPool {
    shared: Arc<Shared>,
}

impl ConnectionPool {
    /// Builds an empty pool; sockets are opened lazily.
    pub fn new(config: ClientConfig) -> Self {
        let idle = VecDeque::with_capacity(config.max_idle);
        ConnectionPool {
            shared: Arc::new(Shared {
                config,
                slots: Mutex::new(Slots { idle, open: 0 }),
            }),
        }
    }

    /// Lends out an idle socket or opens a new one within `max_total`.
    pub fn acquire(&self) -> ClientResult<Lease> {
        let wire = match self.checkout() {
            Checkout::Reused(wire) => wire,
            Checkout::Full => return Err(ClientError::PoolExhausted),
            Checkout::Reserved => {
                let addr = &self.shared.config.addr;
                match Wire::open(&self.shared.config) {
                    Ok(wire) => {
                        debug!(addr = %addr, "opened pooled connection");
                        wire
                    }
                    Err(err) => {
                        debug!(addr = %addr, error = %err, "connect failed");
                        self.shared.forget();
                        return Err(err);
                    }
                }
            }
        };
        Ok(Lease {
            shared: self.shared.clone(),
            wire: Some(wire),
        })
    }

    /// `(idle, open)` socket counts.
    #[cfg(test)]
    fn status(&self) -> (usize, usize) {
        let slots = self.shared.slots.lock();
        (slots.idle.len(), slots.open)
    }

    fn checkout(&self) -> Checkout {
        let mut slots = self.shared.slots.lock();
        if let Some(wire) = slots.idle.pop_front() {
            return Checkout::Reused(wire);
        }
        if slots.open >= self.shared.config.max_total {
            return Checkout::Full;
        }
        slots.open += 1;
        Checkout::Reserved
    }
}

/// A socket on loan from the pool.
///
/// `exec` consumes the lease. Dropping an unused lease hands the socket back.
pub struct Lease {
    shared: Arc<Shared>,
    wire: Option<Wire>,
}

impl Lease {
    /// Sends one command and reads its reply.
    pub fn exec(mut self, args: &[&[u8]]) -> ClientResult<RespValue> {
        let Some(mut wire) = self.wire.take() else {
            return Err(ClientError::Protocol);
        };
        match wire.round_trip(args) {
            Ok(reply) => {
                self.shared.checkin(wire);
                Ok(reply)
            }
            Err(err) => {
                self.shared.forget();
                Err(err)
            }
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(wire) = self.wire.take() {
            self.shared.checkin(wire);
        }
    }
}

struct Wire {
    reader: RespReader<BufReader<TcpStream>>,
    out: Vec<u8>,
}

impl Wire {
    fn open(config: &ClientConfig) -> ClientResult<Self> {
        let stream = connect_any(config)?;
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        stream.set_nodelay(true)?;

        Ok(Wire {
            reader: RespReader::new(BufReader::new(stream)),
            out: Vec::with_capacity(256),
        })
    }

    fn round_trip(&mut self, args: &[&[u8]]) -> ClientResult<RespValue> {
        self.out.clear();
        encode_command(args, &mut self.out);
        let stream = self.reader.get_mut().get_mut();
        stream.write_all(&self.out)?;
        stream.flush()?;
        self.reader.read_value()
    }
}

fn connect_any(config: &ClientConfig) -> ClientResult<TcpStream> {
    let addrs: Vec<SocketAddr> = config
        .addr
        .to_socket_addrs()
        .map_err(|_| ClientError::InvalidAddress)?
        .collect();
    connect_each(&addrs, config)
}

/// Tries `addrs` in resolver order; `localhost` may yield `::1` ahead of
/// `127.0.0.1`. Only the last failure is reported.
fn connect_each(addrs: &[SocketAddr], config: &ClientConfig) -> ClientResult<TcpStream> {
    let mut last_err = None;
    for addr in addrs {
        let attempt = match config.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                debug!(%addr, error = %err, "address unreachable, trying next");
                last_err = Some(err);
            }
        }
    }
    Err(last_err.map_or(ClientError::InvalidAddress, ClientError::Io))
}
