use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address the agent dials its control channel to (e.g., 0.0.0.0:8009)
    #[arg(long = "control", short = 'c', default_value = "0.0.0.0:8009")]
    pub control_addr: String,

    /// Address the agent dials tunnel connections to
    #[arg(long = "tunnel", short = 'T', default_value = "0.0.0.0:8008")]
    pub tunnel_addr: String,

    /// User-facing address being forwarded to the private service
    #[arg(long = "public", short = 'p', default_value = "0.0.0.0:8007")]
    pub public_addr: String,

    /// Shared secret the agent must present on its control connection
    #[arg(long = "secret", short = 's')]
    pub secret: String,
}
