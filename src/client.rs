//! Client struct definition
//!
//! Represents a connected client with its outbound channel and the rooms
//! it is seated in.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::{ClientId, RoomCode};

/// Connected client information
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
    /// Rooms this connection holds a seat in
    pub rooms: HashSet<RoomCode>,
}

impl Client {
    /// Create a new client with the given ID and sender channel
    pub fn new(id: ClientId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            sender,
            rooms: HashSet::new(),
        }
    }

    /// Queue a message for this client without waiting
    ///
    /// Delivery is fire-and-forget: a slow or closed connection never
    /// holds up the coordinator.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            TrySendError::Full(_) => SendError::ChannelFull,
            TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    pub fn join_room(&mut self, code: RoomCode) {
        self.rooms.insert(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let (tx, _rx) = mpsc::channel(1);
        let client = Client::new(ClientId::new(), tx);
        assert!(client.rooms.is_empty());
    }

    #[test]
    fn test_room_membership() {
        let (tx, _rx) = mpsc::channel(1);
        let mut client = Client::new(ClientId::new(), tx);
        let code = RoomCode::from_string("ABC123".to_string());

        client.join_room(code.clone());
        client.join_room(code.clone());
        assert_eq!(client.rooms.len(), 1);
        assert!(client.rooms.contains(&code));
    }

    #[test]
    fn test_send_full_and_closed() {
        let (tx, rx) = mpsc::channel(1);
        let client = Client::new(ClientId::new(), tx);
        let msg = ServerMessage::TimeUpdate { time_left: 3 };

        assert!(client.send(msg.clone()).is_ok());
        assert!(matches!(client.send(msg.clone()), Err(SendError::ChannelFull)));

        drop(rx);
        assert!(matches!(client.send(msg), Err(SendError::ChannelClosed)));
    }
}
