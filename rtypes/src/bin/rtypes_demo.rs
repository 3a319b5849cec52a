//! # Wrapper Demo
//!
//! Purpose: Exercise each typed wrapper against a live server, using the
//! connection settings from `REDIS_HOST` / `REDIS_PORT`.
//!
//! Usage: `cargo run -p rtypes --features demo --bin rtypes-demo -- [key-prefix]`
//! (prefix defaults to `rtypes-demo`). Every key
//! the demo touches is removed again before it exits.

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rtypes::{registry, ClientConfig, Config, Connection, Json, KVClient, Utf8};

#[derive(Debug, Serialize, Deserialize)]
struct Job {
    id: u32,
    queue: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let prefix = env::args().nth(1).unwrap_or_else(|| "rtypes-demo".to_string());
    let client_config = ClientConfig::from_env();
    info!(addr = %client_config.addr, "connecting");
    let client = Arc::new(KVClient::with_config(client_config).context("building client")?);

    registry::initialize(client.clone());
    if !registry::ping()? {
        bail!("server did not answer PING");
    }
    let version = registry::server_version(client.as_ref()).context("reading server version")?;
    info!(%version, "server reachable");

    let strings: Config<String> = Config::new(client.clone(), Arc::new(Utf8));

    let board = strings.sorted_set(format!("{prefix}:board"));
    board.add([("ada".to_string(), 3.0), ("grace".to_string(), 1.0), ("linus".to_string(), 2.0)])?;
    info!(strategy = ?board.pop_strategy()?, "sorted set ready");
    for item in board.range(0, -1, Some(true))? {
        info!(member = %item.member(), score = ?item.score(), "ranked");
    }
    let popped = board.pop_front(1)?;
    info!(?popped, remaining = board.size()?, "popped lowest");

    let tags = strings.set(format!("{prefix}:tags"));
    tags.add(&"rust".to_string())?;
    tags.add(&"redis".to_string())?;
    info!(members = ?tags.members()?, "set members");

    let jobs = strings.with_codec::<Job>(Arc::new(Json::<Job>::new())).list(format!("{prefix}:jobs"));
    jobs.push_back(&Job {
        id: 1,
        queue: "mail".to_string(),
    })?;
    info!(job = ?jobs.pop_front()?, "job round trip");

    let raw = registry::config()?.hash(format!("{prefix}:raw"));
    raw.update([("1", Bytes::from_static(b"one")), ("2", Bytes::from_static(b"two"))])?;
    info!(fields = ?raw.keys()?, "hash fields");

    for key in ["board", "tags", "jobs", "raw"] {
        let key = format!("{prefix}:{key}");
        client.exec(&[b"DEL", key.as_bytes()])?;
    }
    Ok(())
}
