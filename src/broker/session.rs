use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::KEEP_ALIVE_INTERVAL_SECS;
use crate::common::{protocol, write_line};

/// The one agent currently attached over the control channel.
struct ControlSession {
    stream: TcpStream,
    peer: SocketAddr,
    generation: u64,
}

/// Outcome of a single liveness probe.
#[derive(Debug, PartialEq, Eq)]
enum ProbeOutcome {
    Sent,
    /// The write failed; the agent is gone.
    Failed,
    /// The slot no longer holds the probing loop's session.
    Stale,
}

/// Holder for the single control session.
///
/// All access goes through this slot. Each install hands out a fresh
/// generation, which ties exactly one keepalive loop to one session
/// lifetime: once the slot is cleared or re-used, probes carrying the old
/// generation come back `Stale` and their loop ends.
pub struct SessionSlot {
    inner: Mutex<Option<ControlSession>>,
    generations: AtomicU64,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
            generations: AtomicU64::new(0),
        }
    }

    /// Installs `stream` as the current session unless one is already
    /// attached. Returns the new session's generation, or `None` when the
    /// slot is occupied.
    pub async fn install(&self, stream: TcpStream, peer: SocketAddr) -> Option<u64> {
        let mut guard = self.inner.lock().await;
        if guard.is_some() {
            return None;
        }

        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        *guard = Some(ControlSession {
            stream,
            peer,
            generation,
        });
        Some(generation)
    }

    /// Clears the slot if it still holds the session of `generation`.
    pub async fn clear_if(&self, generation: u64) -> bool {
        let mut guard = self.inner.lock().await;
        match guard.as_ref() {
            Some(session) if session.generation == generation => {
                info!("Agent {} detached", session.peer);
                *guard = None;
                true
            }
            _ => false,
        }
    }

    pub async fn is_attached(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Writes one protocol line to the attached agent. Returns `false`
    /// when no agent is attached or the write fails; a failed signal is
    /// not retried and does not clear the slot (the keepalive loop is what
    /// declares the session dead).
    pub async fn send_line(&self, message: &str) -> bool {
        let mut guard = self.inner.lock().await;
        let Some(session) = guard.as_mut() else {
            info!("No agent attached, dropping {} signal", message);
            return false;
        };

        match write_line(&mut session.stream, message).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send {} to agent {}: {}", message, session.peer, e);
                false
            }
        }
    }

    /// One keepalive write on behalf of the loop owning `generation`.
    async fn probe(&self, generation: u64) -> ProbeOutcome {
        let mut guard = self.inner.lock().await;
        match guard.as_mut() {
            Some(session) if session.generation == generation => {
                match write_line(&mut session.stream, protocol::KEEP_ALIVE).await {
                    Ok(()) => ProbeOutcome::Sent,
                    Err(e) => {
                        debug!("Keepalive to agent {} failed: {}", session.peer, e);
                        ProbeOutcome::Failed
                    }
                }
            }
            _ => ProbeOutcome::Stale,
        }
    }
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Liveness loop for one installed session.
///
/// A failed probe clears the slot, making room for a new agent; a stale
/// probe means the slot was already cleared or re-used, so the loop just
/// ends. Either way at most one loop runs per session lifetime.
pub fn spawn_keepalive(slot: Arc<SessionSlot>, generation: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match slot.probe(generation).await {
                ProbeOutcome::Sent => {
                    tokio::time::sleep(Duration::from_secs(KEEP_ALIVE_INTERVAL_SECS)).await;
                }
                ProbeOutcome::Failed => {
                    slot.clear_if(generation).await;
                    return;
                }
                ProbeOutcome::Stale => return,
            }
        }
    })
}
