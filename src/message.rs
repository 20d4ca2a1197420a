//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's tagged enum
//! for type-safe serialization/deserialization. Message names and fields
//! are camelCase on the wire; error codes are snake_case.

use serde::{Deserialize, Serialize};

use crate::board::Grid;
use crate::error::AppError;
use crate::types::ClientId;
use crate::win::Line;

/// Client → Server message
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Create a new room; the sender becomes its host
    CreateRoom {
        username: String,
        grid_size: usize,
        #[serde(default)]
        theme: Option<String>,
    },
    /// Join an existing room by code
    JoinRoom {
        room_code: String,
        username: String,
        #[serde(default)]
        theme: Option<String>,
    },
    /// Start the game (host only)
    StartGame { room_code: String },
    /// Call a number on the sender's turn
    CallNumber { room_code: String, number: u32 },
    /// List live rooms
    ListRooms,
    /// Liveness probe
    Health,
}

/// Public view of a player, shared with everyone in the room
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: String,
    pub username: String,
    pub score: u32,
    pub is_host: bool,
    pub is_turn: bool,
}

/// One entry of the room listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub code: String,
    pub players: usize,
    pub grid_size: usize,
    pub started: bool,
    pub ended: bool,
}

/// Server → Client message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Connection successful, client ID issued
    Connected { client_id: String },
    /// Room created successfully
    RoomCreated { room_code: String },
    /// Roster after a join
    PlayerJoined { players: Vec<PlayerView> },
    /// Roster after a departure
    PlayerLeft { players: Vec<PlayerView> },
    /// Full snapshot for a (re)joining connection, including its own board
    GameState {
        room_code: String,
        grid_size: usize,
        players: Vec<PlayerView>,
        board: Grid,
        called_numbers: Vec<u32>,
        started: bool,
        ended: bool,
        winner: Option<String>,
    },
    /// The host started the game
    GameStarted {
        players: Vec<PlayerView>,
        current_player: String,
    },
    /// A number was called, manually or by the turn timer
    NumberCalled {
        number: u32,
        called_numbers: Vec<u32>,
        called_by: String,
        automatic: bool,
    },
    /// The turn moved to another player
    TurnChanged { current_player: String, time_left: u32 },
    /// Countdown tick
    TimeUpdate { time_left: u32 },
    /// A player completed enough lines
    GameEnded {
        winner: String,
        winning_lines: Vec<Line>,
    },
    /// Room listing
    Rooms { rooms: Vec<RoomSummary> },
    /// Liveness probe answer
    Health { status: String, rooms: usize },
    /// Error occurred (sent to the offending connection only)
    Error { code: ErrorCode, message: String },
}

/// Error codes for ServerMessage::Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    RoomNotFound,
    GameAlreadyStarted,
    GameNotInProgress,
    NotYourTurn,
    NumberAlreadyCalled,
    NumberOutOfRange,
    NotHost,
    InvalidGridSize,
    AlreadyInRoom,
    RoomCapacity,
    /// Invalid message format
    InvalidMessage,
}

/// Who an outbound message is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every player currently in the room
    Room,
    /// A single connection
    Client(ClientId),
}

/// An outbound message produced by a session transition, in emission order
#[derive(Debug, Clone)]
pub struct Outbound {
    pub to: Recipient,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn room(message: ServerMessage) -> Self {
        Self {
            to: Recipient::Room,
            message,
        }
    }

    pub fn client(client_id: ClientId, message: ServerMessage) -> Self {
        Self {
            to: Recipient::Client(client_id),
            message,
        }
    }
}

impl AppError {
    /// Wire error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::RoomNotFound(_) => ErrorCode::RoomNotFound,
            AppError::GameAlreadyStarted => ErrorCode::GameAlreadyStarted,
            AppError::GameNotInProgress => ErrorCode::GameNotInProgress,
            AppError::NotYourTurn => ErrorCode::NotYourTurn,
            AppError::NumberAlreadyCalled(_) => ErrorCode::NumberAlreadyCalled,
            AppError::NumberOutOfRange { .. } => ErrorCode::NumberOutOfRange,
            AppError::NotHost => ErrorCode::NotHost,
            AppError::InvalidGridSize { .. } => ErrorCode::InvalidGridSize,
            AppError::AlreadyInRoom => ErrorCode::AlreadyInRoom,
            AppError::RoomCapacity(_) => ErrorCode::RoomCapacity,
            // Fatal errors are not typically converted (connection closes)
            _ => ErrorCode::InvalidMessage,
        }
    }
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        let code = err.code();
        let message = match &err {
            AppError::RoomNotFound(room_code) => format!("Room '{}' not found", room_code),
            AppError::WebSocket(_) | AppError::ChannelSend => "Internal error".to_string(),
            other => other.to_string(),
        };
        ServerMessage::Error { code, message }
    }
}
