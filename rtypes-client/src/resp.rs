//! # RESP2 Framing
//!
//! Purpose: Frame outgoing commands, read replies off a buffered stream, and
//! narrow a reply to the shape a collection command is documented to return.
//!
//! ## Design Principles
//! 1. **Binary-Safe**: Members and values are raw bytes end to end.
//! 2. **Reader Owns Its Scratch**: `RespReader` keeps one line buffer per
//!    connection instead of allocating per reply.
//! 3. **Fail Fast**: Bad framing is `ClientError::Protocol`, never a guess.
//!
//! ## Reply Shapes
//!
//! ```text
//! ZRANGE k 0 -1 WITHSCORES   *4  $m1 $s1 $m2 $s2   -> into_bulk_array
//! ZRANK k m                  :0  or  $-1           -> into_nullable_integer
//! HGET k f                   $v  or  $-1           -> into_bulk
//! HMSET k f v                +OK                   -> into_ok
//! ```

use std::io::BufRead;

use crate::client::{ClientError, ClientResult};

/// Largest bulk string or array a reply may announce (`proto-max-bulk-len`).
const MAX_REPLY_LEN: usize = 512 * 1024 * 1024;

/// One parsed RESP2 reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// `+OK`, `+PONG`.
    Simple(Vec<u8>),
    /// `-ERR ...`, `-WRONGTYPE ...`.
    Error(Vec<u8>),
    /// `:n`.
    Integer(i64),
    /// `$n`; `None` for `$-1`.
    Bulk(Option<Vec<u8>>),
    /// `*n`; a null array (`*-1`) reads as empty.
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Expects `+...`; any simple string is accepted.
    pub fn into_ok(self) -> ClientResult<()> {
        match self {
            RespValue::Simple(_) => Ok(()),
            other => Err(other.mismatch()),
        }
    }

    /// Expects `:n`.
    pub fn into_integer(self) -> ClientResult<i64> {
        match self {
            RespValue::Integer(value) => Ok(value),
            other => Err(other.mismatch()),
        }
    }

    /// Expects `:n` or a null bulk string (ZRANK on a missing member).
    pub fn into_nullable_integer(self) -> ClientResult<Option<i64>> {
        match self {
            RespValue::Integer(value) => Ok(Some(value)),
            RespValue::Bulk(None) => Ok(None),
            other => Err(other.mismatch()),
        }
    }

    /// Expects `$...`, null included.
    pub fn into_bulk(self) -> ClientResult<Option<Vec<u8>>> {
        match self {
            RespValue::Bulk(data) => Ok(data),
            other => Err(other.mismatch()),
        }
    }

    /// Expects an array whose items are all non-null bulk strings.
    pub fn into_bulk_array(self) -> ClientResult<Vec<Vec<u8>>> {
        match self {
            RespValue::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    RespValue::Bulk(Some(data)) => Ok(data),
                    other => Err(other.mismatch()),
                })
                .collect(),
            other => Err(other.mismatch()),
        }
    }

    fn mismatch(self) -> ClientError {
        match self {
            RespValue::Error(message) => ClientError::Server { message },
            _ => ClientError::UnexpectedResponse,
        }
    }
}

/// Appends `args` to `out` as a RESP2 array of bulk strings.
pub fn encode_command(args: &[&[u8]], out: &mut Vec<u8>) {
    push_header(out, b'*', args.len());
    for arg in args {
        push_header(out, b'$', arg.len());
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
}

fn push_header(out: &mut Vec<u8>, marker: u8, len: usize) {
    out.push(marker);
    out.extend_from_slice(len.to_string().as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// Pulls whole replies off a buffered byte stream.
pub struct RespReader<R> {
    inner: R,
    line: Vec<u8>,
}

impl<R: BufRead> RespReader<R> {
    pub fn new(inner: R) -> Self {
        RespReader {
            inner,
            line: Vec::with_capacity(128),
        }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Reads exactly one reply, recursing into arrays.
    pub fn read_value(&mut self) -> ClientResult<RespValue> {
        self.read_line()?;
        let (&marker, rest) = self.line.split_first().ok_or(ClientError::Protocol)?;
        match marker {
            b'+' => Ok(RespValue::Simple(rest.to_vec())),
            b'-' => Ok(RespValue::Error(rest.to_vec())),
            b':' => Ok(RespValue::Integer(parse_length(rest)?)),
            b'$' => {
                let len = parse_length(rest)?;
                self.read_bulk(len)
            }
            b'*' => {
                let len = parse_length(rest)?;
                self.read_array(len)
            }
            _ => Err(ClientError::Protocol),
        }
    }

    fn read_bulk(&mut self, len: i64) -> ClientResult<RespValue> {
        let Ok(len) = usize::try_from(len) else {
            return Ok(RespValue::Bulk(None));
        };
        if len > MAX_REPLY_LEN {
            return Err(ClientError::Protocol);
        }
        // Payload plus its trailing CRLF.
        let mut data = vec![0u8; len + 2];
        self.inner.read_exact(&mut data)?;
        if !data.ends_with(b"\r\n") {
            return Err(ClientError::Protocol);
        }
        data.truncate(len);
        Ok(RespValue::Bulk(Some(data)))
    }

    fn read_array(&mut self, len: i64) -> ClientResult<RespValue> {
        let len = usize::try_from(len).unwrap_or(0);
        if len > MAX_REPLY_LEN {
            return Err(ClientError::Protocol);
        }
        // Grow with the items actually read, not the announced count.
        let mut items = Vec::with_capacity(len.min(64));
        for _ in 0..len {
            items.push(self.read_value()?);
        }
        Ok(RespValue::Array(items))
    }

    fn read_line(&mut self) -> ClientResult<()> {
        self.line.clear();
        if self.inner.read_until(b'\n', &mut self.line)? == 0 {
            return Err(ClientError::Protocol);
        }
        if !self.line.ends_with(b"\r\n") {
            return Err(ClientError::Protocol);
        }
        self.line.truncate(self.line.len() - 2);
        Ok(())
    }
}

fn parse_length(digits: &[u8]) -> ClientResult<i64> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or(ClientError::Protocol)
}
