//! Error types for the bingo server
//!
//! Defines application-level errors, message send errors and
//! configuration errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// business errors (send error message to the requesting client only).
/// Business errors never leave a partially mutated session behind.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Room not found with the given code
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Joining a room whose game has already left the lobby
    #[error("Game already started")]
    GameAlreadyStarted,

    /// Calling a number while the game is not running
    #[error("Game not in progress")]
    GameNotInProgress,

    /// Caller is not the player holding the turn
    #[error("Not your turn")]
    NotYourTurn,

    /// Number is already in the called history
    #[error("Number already called: {0}")]
    NumberAlreadyCalled(u32),

    /// Number lies outside 1..=size²
    #[error("Number out of range: {number} (max {max})")]
    NumberOutOfRange { number: u32, max: u32 },

    /// Only the host may start the game
    #[error("Only the host can start the game")]
    NotHost,

    /// Requested grid size is outside the supported range
    #[error("Invalid grid size: {size} (allowed {min}..={max})")]
    InvalidGridSize { size: usize, min: usize, max: usize },

    /// Client already belongs to this room
    #[error("Already in room")]
    AlreadyInRoom,

    /// No free room code could be found
    #[error("No free room code after {0} attempts")]
    RoomCapacity(usize),
}

/// Message send errors
///
/// Occurs when an outbound event cannot be queued for a connection.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The connection is not draining its outbound queue
    #[error("Channel full")]
    ChannelFull,
}

/// Configuration errors (startup only)
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed
    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },
}
