//! # Sorted Set Wrapper
//!
//! Purpose: Present a remote sorted set as a typed, score-ordered collection.
//!
//! ## Design Principles
//! 1. **Live Reads**: Nothing is cached; every call is one round trip (pops on
//!    old servers are a short fixed sequence).
//! 2. **Inspectable Branching**: `pop_strategy` reports which pop path will
//!    run, and `with_server_version` pins it without a live `INFO` query.
//! 3. **Display Mode**: `withscores` only decides the default shape of range
//!    results; every range call can override it.
//!
//! ## Pop Paths
//!
//! ```text
//! >= 5.0.0   ZPOPMIN key n                           (atomic)
//! <  5.0.0   ZRANGE key 0 n-1 WITHSCORES             (not atomic: writers
//!            ZREM key m1 ; ZREM key m2 ; ...          may interleave)
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use rtypes_client::{ClientError, Connection};
use tracing::{debug, warn};

use crate::binding::{changed, count, format_score, parse_score, KeyBinding};
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::registry;
use crate::slice::{Selector, SliceSpec};
use crate::version::{server_version, PopStrategy, ServerVersion};

/// A member together with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember<V> {
    pub member: V,
    pub score: f64,
}

/// One element of a range result, shaped by the `withscores` mode.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeItem<V> {
    Member(V),
    Scored(ScoredMember<V>),
}

impl<V> RangeItem<V> {
    pub fn member(&self) -> &V {
        match self {
            RangeItem::Member(member) => member,
            RangeItem::Scored(scored) => &scored.member,
        }
    }

    pub fn into_member(self) -> V {
        match self {
            RangeItem::Member(member) => member,
            RangeItem::Scored(scored) => scored.member,
        }
    }

    /// `None` when the item was fetched without scores.
    pub fn score(&self) -> Option<f64> {
        match self {
            RangeItem::Member(_) => None,
            RangeItem::Scored(scored) => Some(scored.score),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum End {
    Front,
    Back,
}

impl End {
    fn pop_command(self) -> &'static [u8] {
        match self {
            End::Front => b"ZPOPMIN",
            End::Back => b"ZPOPMAX",
        }
    }

    fn range_command(self) -> &'static [u8] {
        match self {
            End::Front => b"ZRANGE",
            End::Back => b"ZREVRANGE",
        }
    }
}

/// Typed view of the sorted set stored at one key.
pub struct SortedSet<V> {
    binding: KeyBinding<V>,
    withscores: bool,
    version: Option<ServerVersion>,
}

impl SortedSet<Bytes> {
    /// Binds `key` to the process-wide client and codec.
    pub fn from_registry(key: impl Into<String>) -> Result<Self> {
        Ok(registry::config()?.sorted_set(key))
    }
}

impl<V> SortedSet<V> {
    pub fn new(key: impl Into<String>, client: Arc<dyn Connection>, codec: Arc<dyn Codec<V>>) -> Self {
        SortedSet {
            binding: KeyBinding::new(key.into(), client, codec),
            withscores: false,
            version: None,
        }
    }

    /// Sets whether range reads include scores when the call doesn't say.
    pub fn with_scores(mut self, withscores: bool) -> Self {
        self.withscores = withscores;
        self
    }

    /// Uses `version` for pop gating instead of asking the server.
    pub fn with_server_version(mut self, version: ServerVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn key(&self) -> &str {
        self.binding.key()
    }

    pub fn withscores(&self) -> bool {
        self.withscores
    }

    /// True iff `member` has a score.
    pub fn contains(&self, member: &V) -> Result<bool> {
        Ok(self.score(member)?.is_some())
    }

    /// Cardinality (`ZCARD`).
    pub fn size(&self) -> Result<usize> {
        count(self.binding.exec(&[b"ZCARD", self.binding.key_bytes()])?)
    }

    /// Zero-based ascending rank, `None` if absent.
    pub fn rank(&self, member: &V) -> Result<Option<usize>> {
        let encoded = self.binding.encode(member)?;
        let rank = self
            .binding
            .exec(&[b"ZRANK", self.binding.key_bytes(), &encoded[..]])?
            .into_nullable_integer()?;
        rank.map(|value| {
            usize::try_from(value).map_err(|_| Error::from(ClientError::UnexpectedResponse))
        })
        .transpose()
    }

    pub fn score(&self, member: &V) -> Result<Option<f64>> {
        let encoded = self.binding.encode(member)?;
        let raw = self
            .binding
            .exec(&[b"ZSCORE", self.binding.key_bytes(), &encoded[..]])?
            .into_bulk()?;
        raw.map(|score| parse_score(&score)).transpose()
    }

    /// Inclusive index range in ascending score order.
    ///
    /// `withscores` overrides the instance default when `Some`.
    pub fn range(&self, start: i64, stop: i64, withscores: Option<bool>) -> Result<Vec<RangeItem<V>>> {
        self.fetch(End::Front, start, stop, withscores)
    }

    /// Inclusive index range in descending score order.
    pub fn revrange(
        &self,
        start: i64,
        stop: i64,
        withscores: Option<bool>,
    ) -> Result<Vec<RangeItem<V>>> {
        self.fetch(End::Back, start, stop, withscores)
    }

    /// `range` that always carries scores.
    pub fn range_with_scores(&self, start: i64, stop: i64) -> Result<Vec<ScoredMember<V>>> {
        let raw = self.fetch_scored(End::Front.range_command(), start, stop)?;
        self.decode_scored(raw)
    }

    /// `revrange` that always carries scores.
    pub fn revrange_with_scores(&self, start: i64, stop: i64) -> Result<Vec<ScoredMember<V>>> {
        let raw = self.fetch_scored(End::Back.range_command(), start, stop)?;
        self.decode_scored(raw)
    }

    /// Lowest-scored item without removing it.
    pub fn front(&self, withscore: Option<bool>) -> Result<Option<RangeItem<V>>> {
        Ok(self.range(0, 0, withscore)?.into_iter().next())
    }

    /// Highest-scored item without removing it.
    pub fn back(&self, withscore: Option<bool>) -> Result<Option<RangeItem<V>>> {
        Ok(self.range(-1, -1, withscore)?.into_iter().next())
    }

    /// Slice access. A step of -1 reads in descending order; other step sizes
    /// stride over the fetched slice. Direct indexing is rejected.
    pub fn select(&self, selector: Selector) -> Result<Vec<RangeItem<V>>> {
        let (start, stop, step) = match selector {
            Selector::Index(index) => {
                return Err(Error::InvalidArgument(format!(
                    "sorted set {} supports slices only, got index {}",
                    self.key(),
                    index
                )))
            }
            Selector::Slice { start, stop, step } => (start, stop, step),
        };
        let spec = SliceSpec::new(start, stop, step)?;
        let items = if spec.reverse {
            self.revrange(spec.start, spec.stop, None)?
        } else {
            self.range(spec.start, spec.stop, None)?
        };
        Ok(spec.apply_stride(items))
    }

    /// Removes and returns the `count` lowest-scored members, ascending.
    pub fn pop_front(&self, count: usize) -> Result<Vec<ScoredMember<V>>> {
        self.pop(End::Front, count)
    }

    /// Removes and returns the `count` highest-scored members, descending.
    pub fn pop_back(&self, count: usize) -> Result<Vec<ScoredMember<V>>> {
        self.pop(End::Back, count)
    }

    /// The pop path this wrapper will take, from the pinned or live version.
    pub fn pop_strategy(&self) -> Result<PopStrategy> {
        let version = match self.version {
            Some(version) => version,
            None => server_version(self.binding.client())?,
        };
        Ok(PopStrategy::for_version(version))
    }

    /// Upserts every `(member, score)` pair in one `ZADD`.
    ///
    /// Returns how many members were new.
    pub fn add<M, I>(&self, members: I) -> Result<usize>
    where
        I: IntoIterator<Item = (M, f64)>,
        M: Borrow<V>,
    {
        let encoded = members
            .into_iter()
            .map(|(member, score)| -> Result<(Bytes, String)> {
                Ok((self.binding.encode(member.borrow())?, format_score(score)))
            })
            .collect::<Result<Vec<_>>>()?;
        if encoded.is_empty() {
            return Ok(0);
        }

        let mut args: Vec<&[u8]> = Vec::with_capacity(2 + encoded.len() * 2);
        args.push(b"ZADD");
        args.push(self.binding.key_bytes());
        for (member, score) in &encoded {
            args.push(score.as_bytes());
            args.push(&member[..]);
        }
        count(self.binding.exec(&args)?)
    }

    /// Removes `member`; returns false if it wasn't there.
    pub fn remove(&self, member: &V) -> Result<bool> {
        let encoded = self.binding.encode(member)?;
        changed(
            self.binding
                .exec(&[b"ZREM", self.binding.key_bytes(), &encoded[..]])?,
        )
    }

    fn pop(&self, end: End, count: usize) -> Result<Vec<ScoredMember<V>>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let strategy = self.pop_strategy()?;
        debug!(key = %self.key(), ?strategy, count, "popping sorted set members");

        let raw = match strategy {
            PopStrategy::Atomic => {
                let count = count.to_string();
                let reply = self.binding.exec(&[
                    end.pop_command(),
                    self.binding.key_bytes(),
                    count.as_bytes(),
                ])?;
                pairs(reply.into_bulk_array()?)?
            }
            PopStrategy::RangeThenRemove => {
                warn!(
                    key = %self.key(),
                    "server predates ZPOPMIN/ZPOPMAX, popping with non-atomic range + ZREM"
                );
                let stop = i64::try_from(count - 1).unwrap_or(i64::MAX);
                let raw = self.fetch_scored(end.range_command(), 0, stop)?;
                for (member, _) in &raw {
                    self.binding
                        .exec(&[b"ZREM", self.binding.key_bytes(), &member[..]])?
                        .into_integer()?;
                }
                raw
            }
        };
        self.decode_scored(raw)
    }

    fn fetch(
        &self,
        end: End,
        start: i64,
        stop: i64,
        withscores: Option<bool>,
    ) -> Result<Vec<RangeItem<V>>> {
        if withscores.unwrap_or(self.withscores) {
            let raw = self.fetch_scored(end.range_command(), start, stop)?;
            return Ok(self
                .decode_scored(raw)?
                .into_iter()
                .map(RangeItem::Scored)
                .collect());
        }

        let (start, stop) = (start.to_string(), stop.to_string());
        let raw = self
            .binding
            .exec(&[
                end.range_command(),
                self.binding.key_bytes(),
                start.as_bytes(),
                stop.as_bytes(),
            ])?
            .into_bulk_array()?;
        Ok(self
            .binding
            .decode_all(raw)?
            .into_iter()
            .map(RangeItem::Member)
            .collect())
    }

    fn fetch_scored(&self, command: &[u8], start: i64, stop: i64) -> Result<Vec<(Vec<u8>, f64)>> {
        let (start, stop) = (start.to_string(), stop.to_string());
        let reply = self.binding.exec(&[
            command,
            self.binding.key_bytes(),
            start.as_bytes(),
            stop.as_bytes(),
            b"WITHSCORES",
        ])?;
        pairs(reply.into_bulk_array()?)
    }

    fn decode_scored(&self, raw: Vec<(Vec<u8>, f64)>) -> Result<Vec<ScoredMember<V>>> {
        raw.into_iter()
            .map(|(member, score)| -> Result<ScoredMember<V>> {
                Ok(ScoredMember {
                    member: self.binding.decode(member)?,
                    score,
                })
            })
            .collect()
    }
}

impl<V> Clone for SortedSet<V> {
    fn clone(&self) -> Self {
        SortedSet {
            binding: self.binding.clone(),
            withscores: self.withscores,
            version: self.version,
        }
    }
}

impl<V> fmt::Display for SortedSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl<V> fmt::Debug for SortedSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedSet")
            .field("key", &self.key())
            .field("withscores", &self.withscores)
            .field("version", &self.version)
            .finish()
    }
}

/// Splits a flat `member, score, member, score` reply.
fn pairs(flat: Vec<Vec<u8>>) -> Result<Vec<(Vec<u8>, f64)>> {
    if flat.len() % 2 != 0 {
        return Err(Error::from(ClientError::UnexpectedResponse));
    }
    let mut out = Vec::with_capacity(flat.len() / 2);
    let mut items = flat.into_iter();
    while let (Some(member), Some(score)) = (items.next(), items.next()) {
        let score = parse_score(&score)?;
        out.push((member, score));
    }
    Ok(out)
}
