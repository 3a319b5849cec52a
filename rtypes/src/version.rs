//! # Server Version Gating
//!
//! Purpose: Parse the backing store's `redis_version` and decide which pop
//! implementation a sorted set may use.
//!
//! `ZPOPMIN`/`ZPOPMAX` first shipped in 5.0.0. Older servers get a
//! range-then-remove sequence that is not atomic.

use std::fmt;
use std::str::FromStr;

use rtypes_client::{ClientError, Connection};

use crate::error::{Error, Result};

/// First server version with atomic `ZPOPMIN`/`ZPOPMAX`.
pub const ATOMIC_POP_MIN_VERSION: ServerVersion = ServerVersion::new(5, 0, 0);

/// `major.minor.patch` as reported in `INFO server`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        ServerVersion {
            major,
            minor,
            patch,
        }
    }

    /// Extracts `redis_version:` from raw INFO text.
    pub fn from_info(info: &str) -> Result<Self> {
        info.lines()
            .find_map(|line| line.trim().strip_prefix("redis_version:"))
            .ok_or_else(|| Error::Version("INFO reply without redis_version".to_string()))?
            .parse()
    }
}

impl FromStr for ServerVersion {
    type Err = Error;

    /// Accepts `7.2.4`, `6.0`, and suffixed builds such as `5.0.0-rc1`.
    fn from_str(raw: &str) -> Result<Self> {
        let mut parts = raw.trim().splitn(3, '.').map(leading_number);
        let major = parts
            .next()
            .flatten()
            .ok_or_else(|| Error::Version(raw.to_string()))?;
        let minor = parts.next().flatten().unwrap_or(0);
        let patch = parts.next().flatten().unwrap_or(0);
        Ok(ServerVersion::new(major, minor, patch))
    }
}

fn leading_number(part: &str) -> Option<u32> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// How a sorted set removes members from either end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopStrategy {
    /// One `ZPOPMIN`/`ZPOPMAX` command.
    Atomic,
    /// `ZRANGE`/`ZREVRANGE` followed by one `ZREM` per member. Concurrent
    /// writers can interleave between the read and the removals.
    RangeThenRemove,
}

impl PopStrategy {
    pub fn for_version(version: ServerVersion) -> Self {
        if version >= ATOMIC_POP_MIN_VERSION {
            PopStrategy::Atomic
        } else {
            PopStrategy::RangeThenRemove
        }
    }
}

/// Queries `INFO server` through `client` and parses the version.
pub fn server_version(client: &dyn Connection) -> Result<ServerVersion> {
    let info = client
        .exec(&[b"INFO", b"server"])?
        .into_bulk()?
        .ok_or(ClientError::UnexpectedResponse)?;
    ServerVersion::from_info(&String::from_utf8_lossy(&info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_suffixed_versions() {
        assert_eq!("7.2.4".parse::<ServerVersion>().unwrap(), ServerVersion::new(7, 2, 4));
        assert_eq!("6.0".parse::<ServerVersion>().unwrap(), ServerVersion::new(6, 0, 0));
        assert_eq!(
            "5.0.0-rc1".parse::<ServerVersion>().unwrap(),
            ServerVersion::new(5, 0, 0)
        );
        assert!("unstable".parse::<ServerVersion>().is_err());
    }

    #[test]
    fn finds_version_line_in_info() {
        let info = "# Server\r\nredis_version:4.0.9\r\nredis_git_sha1:00000000\r\n";
        assert_eq!(ServerVersion::from_info(info).unwrap(), ServerVersion::new(4, 0, 9));
        assert!(matches!(
            ServerVersion::from_info("# Server\r\n"),
            Err(Error::Version(_))
        ));
    }

    #[test]
    fn strategy_switches_at_five() {
        assert_eq!(
            PopStrategy::for_version(ServerVersion::new(4, 9, 99)),
            PopStrategy::RangeThenRemove
        );
        assert_eq!(
            PopStrategy::for_version(ServerVersion::new(5, 0, 0)),
            PopStrategy::Atomic
        );
        assert_eq!(
            PopStrategy::for_version(ServerVersion::new(10, 0, 0)),
            PopStrategy::Atomic
        );
    }

    #[test]
    fn versions_order_numerically() {
        assert!(ServerVersion::new(10, 0, 0) > ServerVersion::new(9, 12, 3));
        assert_eq!(ServerVersion::new(3, 2, 1).to_string(), "3.2.1");
    }
}
