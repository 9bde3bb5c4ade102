pub mod control;
pub mod public;
pub mod tunnel;

pub use control::run_control_listener;
pub use public::run_public_listener;
pub use tunnel::run_tunnel_listener;
