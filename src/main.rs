//! Bingo Room Server - Entry Point
//!
//! Starts the TCP listener and BingoServer actor, accepting connections.

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bingo_server::{handle_connection, BingoServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=bingo_server=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bingo_server=info")),
        )
        .init();

    // Bind address from command line, BINGO_ADDR or PORT
    let config = ServerConfig::from_env()?;

    // Start TCP listener
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Bingo server listening on {}", config.bind_addr);

    // Create BingoServer actor channel and start
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
    let server = BingoServer::new(cmd_rx, cmd_tx.downgrade(), config.game.clone());
    tokio::spawn(server.run());

    info!("BingoServer actor started");

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();
                let outbound_buffer = config.outbound_buffer;

                // Spawn handler task for each connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx, outbound_buffer).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
