//! Broker side: the public, tunnel and control listeners, the pending
//! connection pool and the single agent session.

pub mod config;
pub mod handlers;
pub mod pool;
pub mod session;

pub use config::Args;
pub use handlers::{run_control_listener, run_public_listener, run_tunnel_listener};
pub use pool::{PendingPool, run_sweeper};
pub use session::{SessionSlot, spawn_keepalive};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::{Duration, timeout};

    use crate::agent;

    /// Full path of one forwarded connection: user -> broker -> agent ->
    /// local service and back.
    #[tokio::test]
    async fn end_to_end_relay_through_broker_and_agent() {
        let control_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let tunnel_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let public_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let control_addr = control_listener.local_addr().unwrap();
        let tunnel_addr = tunnel_listener.local_addr().unwrap();
        let public_addr = public_listener.local_addr().unwrap();

        let slot = Arc::new(SessionSlot::new());
        let pool = Arc::new(PendingPool::new());
        tokio::spawn(run_control_listener(
            control_listener,
            slot.clone(),
            "hunter2".to_string(),
        ));
        tokio::spawn(run_public_listener(
            public_listener,
            pool.clone(),
            slot.clone(),
        ));
        tokio::spawn(run_tunnel_listener(tunnel_listener, pool.clone()));

        // The private service: answers one "ping" with "pong".
        let local_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let local_addr = local_listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut service_conn, _) = local_listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            service_conn.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"ping");
            service_conn.write_all(b"pong").await.unwrap();
        });

        let args = agent::Args {
            control_addr: control_addr.to_string(),
            tunnel_addr: tunnel_addr.to_string(),
            local_addr: local_addr.to_string(),
            secret: "hunter2".to_string(),
            connection_timeout: 5,
        };
        let running = Arc::new(AtomicBool::new(true));
        tokio::spawn(async move {
            let _ = agent::connect_and_serve(&args, running).await;
        });

        timeout(Duration::from_secs(5), async {
            while !slot.is_attached().await {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        let mut user = TcpStream::connect(public_addr).await.unwrap();
        user.write_all(b"ping").await.unwrap();

        let mut buf = [0u8; 4];
        timeout(Duration::from_secs(5), user.read_exact(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf, b"pong");
    }
}
