//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake,
//! message parsing, and bidirectional communication with the BingoServer.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::{ClientMessage, ServerMessage};
use crate::server::ServerCommand;
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, registers the connection with the
/// BingoServer and pumps frames both ways until either side goes away.
/// The server is always told about the disconnect, so the client's seats
/// are released in every room it joined.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
    outbound_buffer: usize,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (ws_sender, ws_receiver) = ws_stream.split();

    let client_id = ClientId::new();
    info!("Client {} connected from {}", client_id, peer_addr);

    // Server -> client queue; the greeting goes first so it precedes any event
    let (msg_tx, msg_rx) = mpsc::channel::<ServerMessage>(outbound_buffer.max(1));
    msg_tx
        .try_send(ServerMessage::Connected {
            client_id: client_id.to_string(),
        })
        .map_err(|_| AppError::ChannelSend)?;

    if cmd_tx
        .send(ServerCommand::Connect {
            client_id,
            sender: msg_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register client {} - server closed", client_id);
        return Err(AppError::ChannelSend);
    }

    let mut read_task = tokio::spawn(read_frames(client_id, ws_receiver, cmd_tx.clone()));
    let mut write_task = tokio::spawn(write_events(client_id, ws_sender, msg_rx));

    tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", client_id);
            write_task.abort();
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", client_id);
            read_task.abort();
        }
    }

    let _ = cmd_tx.send(ServerCommand::Disconnect { client_id }).await;
    info!("Client {} disconnected", client_id);

    Ok(())
}

/// WebSocket -> ServerCommand
async fn read_frames(
    client_id: ClientId,
    mut ws_receiver: SplitStream<WebSocketStream<TcpStream>>,
    cmd_tx: mpsc::Sender<ServerCommand>,
) {
    while let Some(frame) = ws_receiver.next().await {
        let cmd = match frame {
            Ok(Message::Text(text)) => parse_frame(client_id, &text),
            Ok(Message::Binary(_)) => ServerCommand::InvalidMessage {
                client_id,
                reason: "binary frames are not supported".to_string(),
            },
            Ok(Message::Close(_)) => {
                debug!("Client {} sent close frame", client_id);
                break;
            }
            Ok(_) => {
                // Ping/Pong are answered by tungstenite
                continue;
            }
            Err(e) => {
                error!("WebSocket error for {}: {}", client_id, e);
                break;
            }
        };

        if cmd_tx.send(cmd).await.is_err() {
            debug!("Server closed, ending read task for {}", client_id);
            break;
        }
    }
    debug!("Read task ended for {}", client_id);
}

/// ServerMessage -> WebSocket
async fn write_events(
    client_id: ClientId,
    mut ws_sender: SplitSink<WebSocketStream<TcpStream>, Message>,
    mut msg_rx: mpsc::Receiver<ServerMessage>,
) {
    while let Some(msg) = msg_rx.recv().await {
        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                // Skip the event, keep the connection
                error!("Failed to serialize message for {}: {}", client_id, e);
                continue;
            }
        };
        if ws_sender.send(Message::Text(json.into())).await.is_err() {
            debug!("WebSocket send failed, ending write task for {}", client_id);
            break;
        }
    }
    debug!("Write task ended for {}", client_id);

    let _ = ws_sender.close().await;
}

/// Decode one text frame into the command it asks for
fn parse_frame(client_id: ClientId, text: &str) -> ServerCommand {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => client_message_to_command(client_id, msg),
        Err(e) => {
            warn!("Invalid JSON from {}: {}", client_id, e);
            ServerCommand::InvalidMessage {
                client_id,
                reason: e.to_string(),
            }
        }
    }
}

/// Convert a ClientMessage to a ServerCommand
fn client_message_to_command(client_id: ClientId, msg: ClientMessage) -> ServerCommand {
    match msg {
        ClientMessage::CreateRoom {
            username,
            grid_size,
            theme,
        } => ServerCommand::CreateRoom {
            client_id,
            username,
            grid_size,
            theme,
        },
        ClientMessage::JoinRoom {
            room_code,
            username,
            theme,
        } => ServerCommand::JoinRoom {
            client_id,
            room_code,
            username,
            theme,
        },
        ClientMessage::StartGame { room_code } => ServerCommand::StartGame {
            client_id,
            room_code,
        },
        ClientMessage::CallNumber { room_code, number } => ServerCommand::CallNumber {
            client_id,
            room_code,
            number,
        },
        ClientMessage::ListRooms => ServerCommand::ListRooms { client_id },
        ClientMessage::Health => ServerCommand::Health { client_id },
    }
}
