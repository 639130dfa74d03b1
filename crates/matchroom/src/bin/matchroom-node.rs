//! The Matchroom server binary.
//!
//! Starts one game node: WebSocket transport for clients, the room
//! service behind it, and (when `--redis` is given) the cross-node kick
//! bus. A demo room with id 1 is created at startup so a fresh node is
//! immediately exercisable.

use clap::Parser;
use matchroom::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Matchroom game-room node.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Transport listen port.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Node identifier used in kick records.
    #[arg(long, default_value = "node-1")]
    node: String,

    /// Listen host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Redis URL for the cross-node kick bus (e.g. redis://127.0.0.1:6379).
    #[arg(long)]
    redis: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = NodeConfig {
        node_id: args.node.clone(),
        host: args.host,
        port: args.port,
        redis_url: args.redis,
    };

    let builder: Builder<RoomActor> =
        Box::new(|room_id, info| RoomActor::spawn(room_id, info, RoomOptions::new()));
    let node = GameNode::new(config, builder).await?;

    let demo = MatchInfo {
        game_id: 0,
        match_id: 0,
        max_player_wait_time: 60,
        max_game_time: 300,
        players: Vec::new(),
    };
    match node.service().create_room(1, demo) {
        Ok(_) => tracing::info!("created demo room 1"),
        Err(error) => tracing::warn!(%error, "demo room not created"),
    }

    tracing::info!(node = %args.node, port = args.port, "matchroom node starting");
    tokio::select! {
        result = node.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }
    Ok(())
}
