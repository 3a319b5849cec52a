//! In-process stand-in for the server, speaking just the commands the
//! wrappers issue. Replies use the same RESP2 shapes a real server sends.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use rtypes::{ClientResult, Connection, RespValue};

enum Entry {
    ZSet(Vec<(Vec<u8>, f64)>),
    Set(BTreeSet<Vec<u8>>),
    Hash(BTreeMap<Vec<u8>, Vec<u8>>),
    List(VecDeque<Vec<u8>>),
}

impl Entry {
    fn is_empty(&self) -> bool {
        match self {
            Entry::ZSet(items) => items.is_empty(),
            Entry::Set(items) => items.is_empty(),
            Entry::Hash(items) => items.is_empty(),
            Entry::List(items) => items.is_empty(),
        }
    }
}

pub struct MemoryStore {
    version: String,
    data: Mutex<HashMap<Vec<u8>, Entry>>,
    log: Mutex<Vec<String>>,
}

impl MemoryStore {
    /// A store reporting `version` in `INFO server`. Below 5.0 it rejects
    /// ZPOPMIN/ZPOPMAX like an old server would.
    pub fn new(version: &str) -> Arc<Self> {
        Arc::new(MemoryStore {
            version: version.to_string(),
            data: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
        })
    }

    /// Command names received so far, upper-cased, in order.
    pub fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    fn supports_atomic_pop(&self) -> bool {
        let major: u32 = self
            .version
            .split('.')
            .next()
            .and_then(|part| part.parse().ok())
            .unwrap_or(0);
        major >= 5
    }

    fn dispatch(&self, args: &[Vec<u8>]) -> RespValue {
        let name = String::from_utf8_lossy(&args[0]).to_ascii_uppercase();
        let mut data = self.data.lock().unwrap();
        let reply = match name.as_str() {
            "PING" => RespValue::Simple(b"PONG".to_vec()),
            "INFO" => bulk(format!("# Server\r\nredis_version:{}\r\n", self.version).into_bytes()),
            "DEL" => int(args[1..].iter().filter(|key| data.remove(*key).is_some()).count() as i64),
            "ZADD" | "ZREM" | "ZCARD" | "ZSCORE" | "ZRANK" | "ZRANGE" | "ZREVRANGE" => {
                zset_command(&name, args, &mut data)
            }
            "ZPOPMIN" | "ZPOPMAX" => {
                if self.supports_atomic_pop() {
                    zset_command(&name, args, &mut data)
                } else {
                    err(&format!("ERR unknown command '{}'", name))
                }
            }
            "SADD" | "SREM" | "SCARD" | "SISMEMBER" | "SMEMBERS" | "SRANDMEMBER" => {
                set_command(&name, args, &mut data)
            }
            "HSET" | "HMSET" | "HGET" | "HDEL" | "HLEN" | "HEXISTS" | "HGETALL" | "HKEYS"
            | "HVALS" => hash_command(&name, args, &mut data),
            "LLEN" | "LINDEX" | "LRANGE" | "LPUSH" | "RPUSH" | "LPOP" | "RPOP" => {
                list_command(&name, args, &mut data)
            }
            _ => err(&format!("ERR unknown command '{}'", name)),
        };
        data.retain(|_, entry| !entry.is_empty());
        reply
    }
}

impl Connection for MemoryStore {
    fn exec(&self, args: &[&[u8]]) -> ClientResult<RespValue> {
        let args: Vec<Vec<u8>> = args.iter().map(|arg| arg.to_vec()).collect();
        self.log
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(&args[0]).to_ascii_uppercase());
        Ok(self.dispatch(&args))
    }
}

fn bulk(data: Vec<u8>) -> RespValue {
    RespValue::Bulk(Some(data))
}

fn nil() -> RespValue {
    RespValue::Bulk(None)
}

fn int(value: i64) -> RespValue {
    RespValue::Integer(value)
}

fn err(message: &str) -> RespValue {
    RespValue::Error(message.as_bytes().to_vec())
}

fn array(items: impl IntoIterator<Item = Vec<u8>>) -> RespValue {
    RespValue::Array(items.into_iter().map(bulk).collect())
}

fn wrong_type() -> RespValue {
    err("WRONGTYPE Operation against a key holding the wrong kind of value")
}

fn number(raw: &[u8]) -> Option<i64> {
    std::str::from_utf8(raw).ok()?.parse().ok()
}

fn score_text(score: f64) -> Vec<u8> {
    if score == f64::INFINITY {
        b"inf".to_vec()
    } else if score == f64::NEG_INFINITY {
        b"-inf".to_vec()
    } else {
        score.to_string().into_bytes()
    }
}

/// Resolves inclusive, possibly negative bounds against `len`.
fn span(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

fn sort_zset(items: &mut [(Vec<u8>, f64)]) {
    items.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}

fn zset_command(name: &str, args: &[Vec<u8>], data: &mut HashMap<Vec<u8>, Entry>) -> RespValue {
    let entry = data
        .entry(args[1].clone())
        .or_insert_with(|| Entry::ZSet(Vec::new()));
    let items = match entry {
        Entry::ZSet(items) => items,
        _ => return wrong_type(),
    };

    match name {
        "ZADD" => {
            let mut added = 0;
            for pair in args[2..].chunks(2) {
                let score: f64 = match std::str::from_utf8(&pair[0]).ok().and_then(|s| s.parse().ok()) {
                    Some(score) => score,
                    None => return err("ERR value is not a valid float"),
                };
                match items.iter_mut().find(|(member, _)| *member == pair[1]) {
                    Some(existing) => existing.1 = score,
                    None => {
                        items.push((pair[1].clone(), score));
                        added += 1;
                    }
                }
            }
            sort_zset(items);
            int(added)
        }
        "ZREM" => {
            let before = items.len();
            items.retain(|(member, _)| !args[2..].contains(member));
            int((before - items.len()) as i64)
        }
        "ZCARD" => int(items.len() as i64),
        "ZSCORE" => match items.iter().find(|(member, _)| *member == args[2]) {
            Some((_, score)) => bulk(score_text(*score)),
            None => nil(),
        },
        "ZRANK" => match items.iter().position(|(member, _)| *member == args[2]) {
            Some(rank) => int(rank as i64),
            None => nil(),
        },
        "ZRANGE" | "ZREVRANGE" => {
            let (start, stop) = match (number(&args[2]), number(&args[3])) {
                (Some(start), Some(stop)) => (start, stop),
                _ => return err("ERR value is not an integer or out of range"),
            };
            let withscores = args
                .get(4)
                .map(|flag| flag.eq_ignore_ascii_case(b"WITHSCORES"))
                .unwrap_or(false);
            let mut ordered = items.clone();
            if name == "ZREVRANGE" {
                ordered.reverse();
            }
            let selected = match span(ordered.len(), start, stop) {
                Some((start, stop)) => ordered[start..=stop].to_vec(),
                None => Vec::new(),
            };
            flatten(selected, withscores)
        }
        "ZPOPMIN" | "ZPOPMAX" => {
            let count = args.get(2).and_then(|raw| number(raw)).unwrap_or(1).max(0) as usize;
            let count = count.min(items.len());
            let popped: Vec<_> = if name == "ZPOPMIN" {
                items.drain(..count).collect()
            } else {
                let split = items.len() - count;
                items.drain(split..).rev().collect()
            };
            flatten(popped, true)
        }
        _ => unreachable!(),
    }
}

fn flatten(items: Vec<(Vec<u8>, f64)>, withscores: bool) -> RespValue {
    let mut flat = Vec::new();
    for (member, score) in items {
        flat.push(member);
        if withscores {
            flat.push(score_text(score));
        }
    }
    array(flat)
}

fn set_command(name: &str, args: &[Vec<u8>], data: &mut HashMap<Vec<u8>, Entry>) -> RespValue {
    let entry = data
        .entry(args[1].clone())
        .or_insert_with(|| Entry::Set(BTreeSet::new()));
    let items = match entry {
        Entry::Set(items) => items,
        _ => return wrong_type(),
    };

    match name {
        "SADD" => int(args[2..].iter().filter(|member| items.insert(member.to_vec())).count() as i64),
        "SREM" => int(args[2..].iter().filter(|member| items.remove(*member)).count() as i64),
        "SCARD" => int(items.len() as i64),
        "SISMEMBER" => int(items.contains(&args[2]) as i64),
        "SMEMBERS" => array(items.iter().cloned()),
        "SRANDMEMBER" => match items.iter().next() {
            Some(member) => bulk(member.clone()),
            None => nil(),
        },
        _ => unreachable!(),
    }
}

fn hash_command(name: &str, args: &[Vec<u8>], data: &mut HashMap<Vec<u8>, Entry>) -> RespValue {
    let entry = data
        .entry(args[1].clone())
        .or_insert_with(|| Entry::Hash(BTreeMap::new()));
    let fields = match entry {
        Entry::Hash(fields) => fields,
        _ => return wrong_type(),
    };

    match name {
        "HSET" | "HMSET" => {
            let mut created = 0;
            for pair in args[2..].chunks(2) {
                if fields.insert(pair[0].clone(), pair[1].clone()).is_none() {
                    created += 1;
                }
            }
            if name == "HMSET" {
                RespValue::Simple(b"OK".to_vec())
            } else {
                int(created)
            }
        }
        "HGET" => match fields.get(&args[2]) {
            Some(value) => bulk(value.clone()),
            None => nil(),
        },
        "HDEL" => int(args[2..].iter().filter(|field| fields.remove(*field).is_some()).count() as i64),
        "HLEN" => int(fields.len() as i64),
        "HEXISTS" => int(fields.contains_key(&args[2]) as i64),
        "HGETALL" => array(
            fields
                .iter()
                .flat_map(|(field, value)| [field.clone(), value.clone()]),
        ),
        "HKEYS" => array(fields.keys().cloned()),
        "HVALS" => array(fields.values().cloned()),
        _ => unreachable!(),
    }
}

fn list_command(name: &str, args: &[Vec<u8>], data: &mut HashMap<Vec<u8>, Entry>) -> RespValue {
    let entry = data
        .entry(args[1].clone())
        .or_insert_with(|| Entry::List(VecDeque::new()));
    let items = match entry {
        Entry::List(items) => items,
        _ => return wrong_type(),
    };

    match name {
        "LLEN" => int(items.len() as i64),
        "LINDEX" => {
            let index = number(&args[2]).unwrap_or(0);
            let len = items.len() as i64;
            let index = if index < 0 { len + index } else { index };
            match usize::try_from(index).ok().and_then(|index| items.get(index)) {
                Some(value) => bulk(value.clone()),
                None => nil(),
            }
        }
        "LRANGE" => {
            let (start, stop) = (number(&args[2]).unwrap_or(0), number(&args[3]).unwrap_or(-1));
            match span(items.len(), start, stop) {
                Some((start, stop)) => array(items.range(start..=stop).cloned()),
                None => array(Vec::new()),
            }
        }
        "RPUSH" => {
            items.extend(args[2..].iter().cloned());
            int(items.len() as i64)
        }
        "LPUSH" => {
            for value in &args[2..] {
                items.push_front(value.clone());
            }
            int(items.len() as i64)
        }
        "LPOP" => items.pop_front().map(bulk).unwrap_or_else(nil),
        "RPOP" => items.pop_back().map(bulk).unwrap_or_else(nil),
        _ => unreachable!(),
    }
}
