use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Duration, timeout};
use tracing::debug;

use crate::common::{TunnelError, TunnelResult};

pub async fn create_tcp_listener(addr: &str) -> TunnelResult<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    Ok(listener)
}

/// Dials `addr` with a connect timeout and applies the usual socket options.
pub async fn create_tcp_conn(addr: &str, connect_timeout: u64) -> TunnelResult<TcpStream> {
    match timeout(
        Duration::from_secs(connect_timeout),
        TcpStream::connect(addr),
    )
    .await
    {
        Ok(Ok(stream)) => {
            configure_stream(&stream);
            Ok(stream)
        }
        Ok(Err(e)) => Err(TunnelError::Connect(format!(
            "failed to connect to {}: {}",
            addr, e
        ))),
        Err(_) => Err(TunnelError::Connect(format!(
            "connection timeout while connecting to {}",
            addr
        ))),
    }
}

/// Best-effort socket tuning; failures are logged and never fatal.
pub fn configure_stream(stream: &TcpStream) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }

    let socket_ref = socket2::SockRef::from(stream);
    if let Err(e) = socket_ref.set_keepalive(true) {
        debug!("Failed to set SO_KEEPALIVE: {}", e);
    }
}
