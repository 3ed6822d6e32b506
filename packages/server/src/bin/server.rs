//! Synchronized playback coordination server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin cuepoint-server
//! cargo run --bin cuepoint-server -- --host 0.0.0.0 --port 3000 --room-id lobby
//! ```

use std::sync::Arc;

use clap::Parser;
use cuepoint_server::{
    domain::{Room, RoomId, Timestamp},
    infrastructure::message_pusher::WebSocketMessagePusher,
    ui::Server,
    usecase::{SessionCoordinator, SyncClockUseCase},
};
use cuepoint_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "cuepoint-server")]
#[command(about = "Synchronized playback coordination server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Identifier of the shared room
    #[arg(short = 'r', long, default_value = "main")]
    room_id: String,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let room_id = match RoomId::new(args.room_id) {
        Ok(room_id) => room_id,
        Err(e) => {
            tracing::error!("Invalid room id: {}", e);
            std::process::exit(1);
        }
    };

    // 1. Clock
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 2. Room
    let room = Room::new(room_id, Timestamp::new(clock.now_millis()));
    tracing::info!("Room {} created!", room.id.as_str());

    // 3. MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::default());

    // 4. UseCases
    let coordinator = SessionCoordinator::new(room, message_pusher, clock.clone());
    let sync_clock = Arc::new(SyncClockUseCase::new(clock));

    // 5. Server
    let server = Server::new(coordinator, sync_clock);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
