use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Broker control-channel address
    #[arg(long = "control", short = 'c', default_value = "127.0.0.1:8009")]
    pub control_addr: String,

    /// Broker tunnel address, dialed once per new-connection signal
    #[arg(long = "tunnel", short = 'T', default_value = "127.0.0.1:8008")]
    pub tunnel_addr: String,

    /// Local service being exposed through the broker
    #[arg(long = "local", short = 'l', default_value = "127.0.0.1:8000")]
    pub local_addr: String,

    /// Shared secret presented to the broker
    #[arg(long = "secret", short = 's')]
    pub secret: String,

    /// Dial timeout in seconds
    #[arg(long = "connection-timeout", short = 't', default_value_t = crate::DEFAULT_CONNECTION_TIMEOUT)]
    pub connection_timeout: u64,
}
