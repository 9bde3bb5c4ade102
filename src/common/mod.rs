//! Plumbing shared by the broker and the agent: the control-channel line
//! protocol, error types, socket helpers and the stream splicer.

pub mod errors;
pub mod join;
pub mod net;
pub mod protocol;

pub use errors::*;
pub use join::*;
pub use net::*;
pub use protocol::*;
