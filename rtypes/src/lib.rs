//! # Typed Collections over a Redis-Compatible Store
//!
//! Purpose: Wrap the store's sorted sets, sets, hashes, and lists in small
//! typed handles. Each handle is a key, a client, and a codec; every method
//! is a live round trip.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: Wrappers translate method calls into commands and
//!    decode the replies; they add no guarantees of their own.
//! 2. **Strategy Pattern**: Values pass through a `Codec`; the client is any
//!    `Connection`.
//! 3. **Explicit Construction**: `Config` builds wrappers; the `registry`
//!    module is an optional process-wide default on top of it.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use rtypes::{Config, KVClient, Utf8};
//!
//! let client = Arc::new(KVClient::connect("127.0.0.1:6379")?);
//! let config: Config<String> = Config::new(client, Arc::new(Utf8));
//! let board = config.sorted_set("leaderboard");
//! board.add([("ada".to_string(), 12.0), ("linus".to_string(), 9.5)])?;
//! let leader = board.back(Some(true))?;
//! # Ok::<(), rtypes::Error>(())
//! ```

mod binding;
pub mod codec;
mod config;
mod error;
mod hash;
mod list;
pub mod registry;
mod set;
mod slice;
mod sorted_set;
pub mod version;

pub use codec::{transform, Codec, FnCodec, Identity, Json, Transform, Utf8};
pub use config::Config;
pub use error::{CodecError, CodecResult, Error, Result};
pub use hash::Hash;
pub use list::List;
pub use set::Set;
pub use slice::Selector;
pub use sorted_set::{RangeItem, ScoredMember, SortedSet};
pub use version::{PopStrategy, ServerVersion, ATOMIC_POP_MIN_VERSION};

pub use rtypes_client::{ClientConfig, ClientError, ClientResult, Connection, KVClient, RespValue};
