use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error(transparent)]
    Io(#[from] tokio::io::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Control session lost: {0}")]
    SessionLost(String),

    #[error("Other: {0}")]
    Msg(String),
}

impl From<&str> for TunnelError {
    fn from(s: &str) -> Self {
        TunnelError::Msg(s.to_string())
    }
}

impl From<String> for TunnelError {
    fn from(s: String) -> Self {
        TunnelError::Msg(s)
    }
}

pub type TunnelResult<T> = std::result::Result<T, TunnelError>;

/// Classifies I/O errors that just mean the peer went away.
pub fn is_connection_error(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::TimedOut
    )
}
