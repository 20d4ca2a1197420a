//! Multiplayer Bingo Room Server Library
//!
//! A WebSocket server coordinating turn-based number-calling rooms, built
//! with tokio-tungstenite using the Actor pattern for state management.
//!
//! # Features
//! - Room creation with 6-character codes, joining by code
//! - Individually shuffled N×N boards (N = 5..=8) per player
//! - Host-started games with strict turn order
//! - 15-second turn countdown with automatic calls on timeout
//! - Win detection on five completed lines (rows, columns, diagonals)
//! - Host and turn repair on disconnect
//! - Room listing and liveness probe
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `BingoServer` is the central actor owning the `RoomRegistry`
//! - Each connection has a `handler` task communicating with the server
//! - Each running game has a `TurnTimer` task feeding ticks into the same
//!   mailbox, so timeouts and manual calls never race
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use bingo_server::{BingoServer, GameConfig, handle_connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(BingoServer::new(cmd_rx, cmd_tx.downgrade(), GameConfig::default()).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx, 64));
//!     }
//! }
//! ```

pub mod board;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod player;
pub mod registry;
pub mod server;
pub mod session;
pub mod timer;
pub mod types;
pub mod win;

// Re-export main types for convenience
pub use client::Client;
pub use config::{GameConfig, ServerConfig};
pub use error::{AppError, ConfigError, SendError};
pub use handler::handle_connection;
pub use message::{ClientMessage, ErrorCode, PlayerView, RoomSummary, ServerMessage};
pub use registry::RoomRegistry;
pub use server::{BingoServer, ServerCommand};
pub use session::{GameSession, Phase};
pub use timer::TurnTimer;
pub use types::{ClientId, RoomCode, SessionId};
