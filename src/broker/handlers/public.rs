use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, warn};

use crate::broker::pool::PendingPool;
use crate::broker::session::SessionSlot;
use crate::common::{configure_stream, protocol};

/// Accepts user connections, pools each one and signals the attached agent
/// to dial a tunnel back.
pub async fn run_public_listener(
    listener: TcpListener,
    pool: Arc<PendingPool>,
    slot: Arc<SessionSlot>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!("Accepted user connection from {}", peer);
                configure_stream(&stream);

                let id = pool.insert(stream).await;

                // With no agent attached the signal is dropped; the entry
                // stays pooled until an agent shows up or the sweeper
                // reclaims it.
                if !slot.send_line(protocol::NEW_CONNECTION).await {
                    debug!("User connection {} pooled without an agent signal", id);
                }
            }
            Err(e) => {
                warn!("Public accept failed: {}", e);
            }
        }
    }
}
