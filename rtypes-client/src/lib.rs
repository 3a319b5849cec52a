//! # Redis Sync Client
//!
//! Purpose: Provide a lightweight, synchronous Redis-compatible client with
//! connection pooling. This is the client handle the typed collection
//! wrappers in `rtypes` issue their commands through.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Reuse TCP connections to avoid repeated connects.
//! 2. **Narrow Seam**: Callers depend on the `Connection` trait, not on TCP.
//! 3. **Minimal Allocation**: Reuse buffers for RESP framing and parsing.
//! 4. **Protocol Clarity**: Encode/parse RESP2 explicitly for correctness.

mod client;
mod pool;
mod resp;

pub use client::{ClientConfig, ClientError, ClientResult, Connection, KVClient};
pub use resp::RespValue;
