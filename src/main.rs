//! Maze Race Server
//!
//! Loads configuration from the environment, starts the session
//! coordinator and serves WebSocket clients until Ctrl+C.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use maze_race::{GameServer, ServerConfig, SessionConfig, SessionCoordinator, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let server_config = ServerConfig::from_env().context("invalid server configuration")?;
    let session_config = SessionConfig::from_env().context("invalid session configuration")?;

    info!("Maze Race Server v{}", VERSION);
    info!(
        "Ticks: positions {:?}, win check {:?}, scoreboard {:?}",
        session_config.position_broadcast_interval,
        session_config.win_check_interval,
        session_config.scoreboard_interval
    );

    let (session, coordinator) = SessionCoordinator::spawn(session_config);
    let server = GameServer::new(server_config, session);

    tokio::select! {
        result = server.run() => {
            result.context("server stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            server.shutdown();
        }
    }

    drop(server);
    coordinator.abort();

    Ok(())
}
