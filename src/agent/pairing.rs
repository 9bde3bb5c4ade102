use tracing::{error, info};

use crate::common::{create_tcp_conn, join_streams};

/// Answers one new-connection signal: dial the local service, dial a fresh
/// tunnel back to the broker, splice the two.
///
/// A failed dial abandons the whole pairing; whichever connection did open
/// is closed on drop. The originating signal is not retried — the pooled
/// user connection on the broker ages out instead.
pub async fn open_pairing(local_addr: &str, tunnel_addr: &str, connect_timeout: u64) {
    let local = match create_tcp_conn(local_addr, connect_timeout).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to reach local service {}: {}", local_addr, e);
            return;
        }
    };

    let tunnel = match create_tcp_conn(tunnel_addr, connect_timeout).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to open tunnel to {}: {}", tunnel_addr, e);
            return;
        }
    };

    info!("Pairing established: {} <-> {}", tunnel_addr, local_addr);
    join_streams(tunnel, local).await;
}
