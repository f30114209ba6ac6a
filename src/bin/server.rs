use clap::Parser;
use minidb::{server, Error};

const HOST: &str = "127.0.0.1";
const PORT: u16 = 31337;
const MAX_CONNECTIONS: usize = 64;

#[derive(Parser, Debug)]
struct Args {
    /// The host to bind to
    #[arg(long, default_value = HOST, env = "MINIDB_HOST")]
    host: String,

    /// The port to listen on
    #[arg(short, long, default_value_t = PORT, env = "MINIDB_PORT")]
    port: u16,

    /// Maximum number of concurrent connections
    #[arg(short, long, default_value_t = MAX_CONNECTIONS, env = "MINIDB_MAX_CONNECTIONS")]
    max_connections: usize,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    server::run(&args.host, args.port, args.max_connections).await
}
