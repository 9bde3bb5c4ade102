use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use burrow::broker::{
    Args, PendingPool, SessionSlot, run_control_listener, run_public_listener, run_sweeper,
    run_tunnel_listener,
};
use burrow::common::create_tcp_listener;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    info!("Starting tunnel broker");
    info!(
        "Control: {}, Tunnel: {}, Public: {}",
        args.control_addr, args.tunnel_addr, args.public_addr
    );

    // A listener that cannot bind leaves the broker unable to serve its
    // role; give up at startup.
    let control_listener = match create_tcp_listener(&args.control_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind control listener on {}: {}", args.control_addr, e);
            std::process::exit(1);
        }
    };
    let tunnel_listener = match create_tcp_listener(&args.tunnel_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind tunnel listener on {}: {}", args.tunnel_addr, e);
            std::process::exit(1);
        }
    };
    let public_listener = match create_tcp_listener(&args.public_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind public listener on {}: {}", args.public_addr, e);
            std::process::exit(1);
        }
    };

    info!("All listeners bound, waiting for an agent");

    let slot = Arc::new(SessionSlot::new());
    let pool = Arc::new(PendingPool::new());

    tokio::spawn(run_control_listener(
        control_listener,
        slot.clone(),
        args.secret.clone(),
    ));
    tokio::spawn(run_public_listener(
        public_listener,
        pool.clone(),
        slot.clone(),
    ));
    tokio::spawn(run_tunnel_listener(tunnel_listener, pool.clone()));
    tokio::spawn(run_sweeper(pool));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received interrupt, shutting down"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
