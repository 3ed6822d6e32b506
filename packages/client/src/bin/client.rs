//! Interactive synchronized playback client.
//!
//! Connects to a coordinator, keeps its clock estimate fresh and follows the
//! room's countdown and playback with a simulated player.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin cuepoint-client
//! cargo run --bin cuepoint-client -- --server 127.0.0.1:3000 --media movie.mp4
//! ```

use std::time::Duration;

use clap::Parser;
use cuepoint_client::config::ClientConfig;
use cuepoint_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "cuepoint-client")]
#[command(about = "Synchronized playback client", long_about = None)]
struct Args {
    /// Coordinator address (host:port)
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Media file to join the room with
    #[arg(short = 'm', long)]
    media: Option<String>,

    /// Seconds between clock-sync probes
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    sync_interval_secs: u64,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let config = match ClientConfig::new(args.server, Duration::from_secs(args.sync_interval_secs)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = cuepoint_client::run_client(config, args.media).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
