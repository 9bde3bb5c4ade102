use tokio::io;
use tokio::net::TcpStream;
use tracing::{debug, error, info};

use crate::common::{configure_stream, is_connection_error};

/// Splices two connected streams into one byte pipe.
///
/// Both directions are copied concurrently; whichever direction finishes
/// first (EOF or error) ends the session, and dropping the split halves
/// closes both sockets exactly once. The in-flight opposite copy observes
/// the close on the peer and terminates shortly after.
pub async fn join_streams(a: TcpStream, b: TcpStream) {
    configure_stream(&a);
    configure_stream(&b);

    let session_id = chrono::Utc::now().timestamp_millis();
    debug!("Relay session {} started", session_id);

    let (mut ar, mut aw) = a.into_split();
    let (mut br, mut bw) = b.into_split();

    tokio::select! {
        result = io::copy(&mut ar, &mut bw) => {
            log_copy_result(session_id, "a -> b", result);
        }
        result = io::copy(&mut br, &mut aw) => {
            log_copy_result(session_id, "b -> a", result);
        }
    }

    info!("Relay session {} closed", session_id);
}

fn log_copy_result(session_id: i64, direction: &str, result: io::Result<u64>) {
    match result {
        Ok(bytes) => {
            info!(
                "Session {}: {} finished after {} bytes",
                session_id, direction, bytes
            );
        }
        Err(e) if is_connection_error(&e) => {
            info!("Session {}: {} connection closed: {}", session_id, direction, e);
        }
        Err(e) => {
            error!("Session {}: error copying {}: {}", session_id, direction, e);
        }
    }
}
