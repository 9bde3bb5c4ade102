use clap::Parser;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

use burrow::agent::{Args, connect_and_serve};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    info!("Starting tunnel agent");
    info!(
        "Control: {}, Tunnel: {}, Local service: {}",
        args.control_addr, args.tunnel_addr, args.local_addr
    );
    info!("Connection timeout: {}s", args.connection_timeout);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigint = signal(SignalKind::interrupt()).unwrap();
        let mut sigterm = signal(SignalKind::terminate()).unwrap();

        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
            r.store(false, Ordering::SeqCst);
        });
    }

    // One run per process: a lost control session ends the agent instead
    // of reconnecting.
    if let Err(e) = connect_and_serve(&args, running).await {
        error!("Agent terminated: {}", e);
        std::process::exit(1);
    }

    info!("Agent stopped");
}
