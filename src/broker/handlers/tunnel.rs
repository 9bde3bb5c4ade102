use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::broker::pool::PendingPool;
use crate::common::{configure_stream, join_streams};

/// Accepts tunnel connections dialed back by the agent and splices each
/// one to the oldest pending user connection.
pub async fn run_tunnel_listener(listener: TcpListener, pool: Arc<PendingPool>) {
    loop {
        match listener.accept().await {
            Ok((tunnel, peer)) => {
                debug!("Tunnel connection from {}", peer);
                configure_stream(&tunnel);

                let pool = pool.clone();
                tokio::spawn(async move {
                    match pool.take_oldest().await {
                        Some(user) => {
                            info!("Matched tunnel from {} with a pending user connection", peer);
                            join_streams(user, tunnel).await;
                        }
                        None => {
                            // Tunnels are never held for a future user.
                            info!("No pending user connection for tunnel from {}, closing", peer);
                        }
                    }
                });
            }
            Err(e) => {
                warn!("Tunnel accept failed: {}", e);
            }
        }
    }
}
