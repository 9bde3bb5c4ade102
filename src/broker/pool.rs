use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::{debug, info};

use crate::{POOL_SWEEP_INTERVAL_SECS, POOL_TTL_SECS};

/// One accepted user connection waiting for the agent to dial back.
struct PendingConn {
    added: Instant,
    stream: TcpStream,
}

/// Table of user connections awaiting a tunnel match.
///
/// A single lock covers insert, match and eviction, so every entry leaves
/// the table through exactly one of the two paths: handed to a relay pair,
/// or closed by the sweeper.
pub struct PendingPool {
    inner: Mutex<HashMap<i64, PendingConn>>,
}

impl PendingPool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a user connection and returns its id, the creation timestamp
    /// in nanoseconds (bumped on collision).
    pub async fn insert(&self, stream: TcpStream) -> i64 {
        let mut table = self.inner.lock().await;

        let mut id = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0);
        while table.contains_key(&id) {
            id += 1;
        }

        table.insert(
            id,
            PendingConn {
                added: Instant::now(),
                stream,
            },
        );
        debug!("Pooled user connection {} ({} pending)", id, table.len());
        id
    }

    /// Removes and returns the oldest pending connection, if any.
    pub async fn take_oldest(&self) -> Option<TcpStream> {
        let mut table = self.inner.lock().await;

        let id = table
            .iter()
            .min_by_key(|(_, conn)| conn.added)
            .map(|(id, _)| *id)?;

        let conn = table.remove(&id)?;
        debug!(
            "Matched user connection {} ({} still pending)",
            id,
            table.len()
        );
        Some(conn.stream)
    }

    /// Closes and removes every entry older than `ttl`; returns how many
    /// were evicted.
    pub async fn sweep(&self, ttl: Duration) -> usize {
        let mut table = self.inner.lock().await;
        let before = table.len();
        let now = Instant::now();

        table.retain(|id, conn| {
            let keep = now.duration_since(conn.added) <= ttl;
            if !keep {
                info!("Evicting user connection {}: no tunnel arrived in time", id);
            }
            keep
        });

        before - table.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

impl Default for PendingPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Background eviction loop. The pool TTL is the only thing that reclaims
/// user connections whose signal never produced a tunnel.
pub async fn run_sweeper(pool: Arc<PendingPool>) {
    loop {
        tokio::time::sleep(Duration::from_secs(POOL_SWEEP_INTERVAL_SECS)).await;

        let evicted = pool.sweep(Duration::from_secs(POOL_TTL_SECS)).await;
        if evicted > 0 {
            info!("Swept {} expired user connections", evicted);
        }
    }
}
