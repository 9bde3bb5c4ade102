use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Duration, timeout};
use tracing::{debug, info, warn};

use crate::agent::{Args, open_pairing};
use crate::common::{TunnelError, TunnelResult, create_tcp_conn, protocol, write_line};

/// Dials the broker, authenticates, then serves new-connection signals
/// until the control channel is lost or `running` is cleared.
///
/// One run per call: a lost session returns an error instead of
/// reconnecting.
pub async fn connect_and_serve(args: &Args, running: Arc<AtomicBool>) -> TunnelResult<()> {
    info!("Connecting to broker control channel at {}", args.control_addr);
    let mut control = create_tcp_conn(&args.control_addr, args.connection_timeout).await?;

    write_line(&mut control, &args.secret)
        .await
        .map_err(|e| TunnelError::Auth(format!("failed to send credential: {}", e)))?;

    let mut reader = BufReader::new(control);
    let mut line = String::new();
    match timeout(
        Duration::from_secs(args.connection_timeout),
        reader.read_line(&mut line),
    )
    .await
    {
        Ok(Ok(0)) => {
            return Err(TunnelError::Auth(
                "broker closed the connection during authentication".into(),
            ));
        }
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            return Err(TunnelError::Auth(format!("failed to read auth reply: {}", e)));
        }
        Err(_) => {
            return Err(TunnelError::Auth("timed out waiting for auth reply".into()));
        }
    }

    if line.trim_end_matches('\n') != protocol::VALIDATION_OK {
        return Err(TunnelError::Auth(format!(
            "broker rejected credential: {:?}",
            line.trim()
        )));
    }

    info!("Authenticated with broker, waiting for connection signals");

    let mut line = String::new();
    loop {
        // The short read timeout only exists to poll the shutdown flag. A
        // timed-out read may leave a partial line behind; it stays in the
        // buffer and the next pass completes it.
        match timeout(Duration::from_secs(1), reader.read_line(&mut line)).await {
            Ok(Ok(0)) => {
                return Err(TunnelError::SessionLost(
                    "broker closed the control channel".into(),
                ));
            }
            Ok(Ok(_)) => {
                match line.trim() {
                    protocol::NEW_CONNECTION => {
                        debug!("New connection signal from broker");
                        let local_addr = args.local_addr.clone();
                        let tunnel_addr = args.tunnel_addr.clone();
                        let connect_timeout = args.connection_timeout;
                        tokio::spawn(async move {
                            open_pairing(&local_addr, &tunnel_addr, connect_timeout).await;
                        });
                    }
                    protocol::KEEP_ALIVE => {
                        // Having read it is the whole point.
                        debug!("Keepalive from broker");
                    }
                    other => {
                        warn!("Unexpected control message: {:?}", other);
                    }
                }
                line.clear();
            }
            Ok(Err(e)) => {
                return Err(TunnelError::SessionLost(format!(
                    "control channel read failed: {}",
                    e
                )));
            }
            Err(_) => {
                if !running.load(Ordering::SeqCst) {
                    info!("Shutdown signal received, leaving control loop");
                    return Ok(());
                }
            }
        }
    }
}
