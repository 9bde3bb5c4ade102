pub mod agent;
pub mod broker;
pub mod common;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Seconds between liveness probes written to the attached agent.
pub const KEEP_ALIVE_INTERVAL_SECS: u64 = 3;

/// Seconds between sweeps of the pending-connection pool.
pub const POOL_SWEEP_INTERVAL_SECS: u64 = 5;

/// Seconds a pooled user connection may wait for a tunnel before it is
/// evicted and closed.
pub const POOL_TTL_SECS: u64 = 10;

pub const DEFAULT_CONNECTION_TIMEOUT: u64 = 5;

pub use common::{
    TunnelError, TunnelResult, create_tcp_conn, create_tcp_listener, is_connection_error,
    join_streams, write_line,
};

pub use broker::{PendingPool, SessionSlot};

pub use agent::{connect_and_serve, open_pairing};
