use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::broker::session::{self, SessionSlot};
use crate::common::{configure_stream, protocol, write_line};

/// Accepts control connections from agents and authenticates each one.
pub async fn run_control_listener(listener: TcpListener, slot: Arc<SessionSlot>, secret: String) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!("New control connection from {}", peer);
                configure_stream(&stream);

                let slot = slot.clone();
                let secret = secret.clone();
                tokio::spawn(handle_control_conn(stream, peer, slot, secret));
            }
            Err(e) => {
                warn!("Control accept failed: {}", e);
            }
        }
    }
}

/// One-shot credential handshake: read one line, compare it verbatim to
/// the secret plus terminator, acknowledge, install. A failed attempt gets
/// no reply and must reconnect to retry.
async fn handle_control_conn(
    mut stream: TcpStream,
    peer: SocketAddr,
    slot: Arc<SessionSlot>,
    secret: String,
) {
    let mut line = String::new();
    {
        let mut reader = BufReader::new(&mut stream);
        match reader.read_line(&mut line).await {
            Ok(0) => {
                warn!("Agent {} disconnected before authenticating", peer);
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to read credential from {}: {}", peer, e);
                return;
            }
        }
    }

    // A line without its terminator (the peer closed mid-handshake) is a
    // mismatch like any other.
    if line != format!("{}\n", secret) {
        warn!("Rejected control connection from {}: bad credential", peer);
        return;
    }

    if let Err(e) = write_line(&mut stream, protocol::VALIDATION_OK).await {
        warn!("Failed to send auth reply to {}: {}", peer, e);
        return;
    }

    match slot.install(stream, peer).await {
        Some(generation) => {
            info!("Agent {} attached", peer);
            session::spawn_keepalive(slot, generation);
        }
        None => {
            // The acknowledgement is already out at this point; the
            // newcomer is dropped all the same and the attached session
            // stays untouched.
            warn!("Agent {} rejected: another agent is already attached", peer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::time::{Duration, timeout};

    async fn start_listener(secret: &str) -> (SocketAddr, Arc<SessionSlot>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let slot = Arc::new(SessionSlot::new());
        tokio::spawn(run_control_listener(
            listener,
            slot.clone(),
            secret.to_string(),
        ));
        (addr, slot)
    }

    async fn wait_until_attached(slot: &SessionSlot) {
        timeout(Duration::from_secs(5), async {
            while !slot.is_attached().await {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn accepts_the_configured_credential() {
        let (addr, slot) = start_listener("s3cr3t").await;

        let mut agent = TcpStream::connect(addr).await.unwrap();
        agent.write_all(b"s3cr3t\n").await.unwrap();

        let mut reader = BufReader::new(&mut agent);
        let mut line = String::new();
        timeout(Duration::from_secs(5), reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(line, "VALIDATION_OK\n");

        wait_until_attached(&slot).await;
    }

    #[tokio::test]
    async fn closes_on_a_bad_credential_without_replying() {
        let (addr, slot) = start_listener("s3cr3t").await;

        let mut agent = TcpStream::connect(addr).await.unwrap();
        agent.write_all(b"wrong\n").await.unwrap();

        let mut buf = [0u8; 16];
        let n = timeout(Duration::from_secs(5), agent.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);
        assert!(!slot.is_attached().await);
    }

    #[tokio::test]
    async fn second_agent_is_acked_but_dropped() {
        let (addr, slot) = start_listener("s3cr3t").await;

        let mut first = TcpStream::connect(addr).await.unwrap();
        first.write_all(b"s3cr3t\n").await.unwrap();

        let mut first_reader = BufReader::new(&mut first);
        let mut line = String::new();
        timeout(Duration::from_secs(5), first_reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(line, "VALIDATION_OK\n");
        wait_until_attached(&slot).await;

        let mut second = TcpStream::connect(addr).await.unwrap();
        second.write_all(b"s3cr3t\n").await.unwrap();

        // The newcomer still sees the acknowledgement, then the close.
        let mut reader = BufReader::new(&mut second);
        let mut line = String::new();
        timeout(Duration::from_secs(5), reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(line, "VALIDATION_OK\n");

        line.clear();
        let n = timeout(Duration::from_secs(5), reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n, 0);

        // The first session is still the one attached: it keeps receiving
        // liveness probes.
        line.clear();
        timeout(Duration::from_secs(5), first_reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(line, "KEEP_ALIVE\n");
    }
}
