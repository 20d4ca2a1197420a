//! BingoServer Actor implementation
//!
//! The central actor that owns every connection and every room. All inbound
//! commands and all turn-timer ticks arrive through one ordered mailbox, so
//! at most one mutation per room is ever in flight.

use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::config::GameConfig;
use crate::error::AppError;
use crate::message::{ErrorCode, Outbound, Recipient, RoomSummary, ServerMessage};
use crate::registry::RoomRegistry;
use crate::session::GameSession;
use crate::timer::TurnTimer;
use crate::types::{ClientId, RoomCode, SessionId};

/// Commands sent to the BingoServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New client connected
    Connect {
        client_id: ClientId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Client disconnected
    Disconnect { client_id: ClientId },
    /// Create a new room hosted by the client
    CreateRoom {
        client_id: ClientId,
        username: String,
        grid_size: usize,
        theme: Option<String>,
    },
    /// Join an existing room
    JoinRoom {
        client_id: ClientId,
        room_code: String,
        username: String,
        theme: Option<String>,
    },
    /// Host starts the game
    StartGame {
        client_id: ClientId,
        room_code: String,
    },
    /// Player calls a number
    CallNumber {
        client_id: ClientId,
        room_code: String,
        number: u32,
    },
    /// One second of a room's turn countdown elapsed
    TimerTick {
        room_code: RoomCode,
        session_id: SessionId,
        turn: u64,
    },
    /// Client asked for the room listing
    ListRooms { client_id: ClientId },
    /// Client liveness probe
    Health { client_id: ClientId },
    /// Client sent something that could not be parsed
    InvalidMessage { client_id: ClientId, reason: String },
    /// Room listing for in-process callers
    Status {
        reply: oneshot::Sender<Vec<RoomSummary>>,
    },
}

/// The main BingoServer actor
pub struct BingoServer {
    /// All connected clients: ClientId -> Client
    clients: HashMap<ClientId, Client>,
    /// All live rooms
    registry: RoomRegistry,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
    /// Handed to turn timers so their ticks share the mailbox
    commands: mpsc::WeakSender<ServerCommand>,
    rng: StdRng,
}

impl BingoServer {
    /// Create a new BingoServer.
    ///
    /// `commands` must be the sending side of `receiver`; it is held weakly
    /// so the actor still stops once every connection handler is gone.
    pub fn new(
        receiver: mpsc::Receiver<ServerCommand>,
        commands: mpsc::WeakSender<ServerCommand>,
        rules: GameConfig,
    ) -> Self {
        Self {
            clients: HashMap::new(),
            registry: RoomRegistry::new(rules),
            receiver,
            commands,
            rng: StdRng::from_entropy(),
        }
    }

    /// Run the BingoServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("BingoServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("BingoServer shutting down");
    }

    /// Process a single command
    fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { client_id, sender } => {
                self.handle_connect(client_id, sender);
            }
            ServerCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id);
            }
            ServerCommand::CreateRoom {
                client_id,
                username,
                grid_size,
                theme,
            } => {
                let result = self.handle_create_room(client_id, username, grid_size, theme);
                self.report(client_id, result);
            }
            ServerCommand::JoinRoom {
                client_id,
                room_code,
                username,
                theme,
            } => {
                let result = self.handle_join_room(client_id, room_code, username, theme);
                self.report(client_id, result);
            }
            ServerCommand::StartGame {
                client_id,
                room_code,
            } => {
                let result = self.handle_start_game(client_id, room_code);
                self.report(client_id, result);
            }
            ServerCommand::CallNumber {
                client_id,
                room_code,
                number,
            } => {
                let result = self.handle_call_number(client_id, room_code, number);
                self.report(client_id, result);
            }
            ServerCommand::TimerTick {
                room_code,
                session_id,
                turn,
            } => {
                self.handle_timer_tick(room_code, session_id, turn);
            }
            ServerCommand::ListRooms { client_id } => {
                let rooms = self.registry.list();
                self.send_to(client_id, ServerMessage::Rooms { rooms });
            }
            ServerCommand::Health { client_id } => {
                let rooms = self.registry.len();
                self.send_to(
                    client_id,
                    ServerMessage::Health {
                        status: "ok".to_string(),
                        rooms,
                    },
                );
            }
            ServerCommand::InvalidMessage { client_id, reason } => {
                self.send_to(
                    client_id,
                    ServerMessage::Error {
                        code: ErrorCode::InvalidMessage,
                        message: format!("Invalid message format: {}", reason),
                    },
                );
            }
            ServerCommand::Status { reply } => {
                let _ = reply.send(self.registry.list());
            }
        }
    }

    /// Handle new client connection
    fn handle_connect(&mut self, client_id: ClientId, sender: mpsc::Sender<ServerMessage>) {
        info!("Client {} connected", client_id);
        self.clients.insert(client_id, Client::new(client_id, sender));
        debug!(
            "Total clients: {}, Total rooms: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    /// Handle client disconnection: leave every room the client sits in
    fn handle_disconnect(&mut self, client_id: ClientId) {
        info!("Client {} disconnected", client_id);

        let Some(client) = self.clients.remove(&client_id) else {
            return;
        };

        let period = self.registry.rules().tick_interval;
        for room_code in client.rooms {
            let Ok(session) = self.registry.get_mut(&room_code) else {
                continue;
            };
            let out = session.remove_player(client_id);
            if session.is_empty() {
                self.registry.remove_if_empty(&room_code);
                continue;
            }
            sync_timer(&self.commands, period, session);
            deliver(&self.clients, session, out);
        }

        debug!(
            "Total clients: {}, Total rooms: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    /// Handle room creation
    fn handle_create_room(
        &mut self,
        client_id: ClientId,
        username: String,
        grid_size: usize,
        theme: Option<String>,
    ) -> Result<(), AppError> {
        let Some(client) = self.clients.get_mut(&client_id) else {
            return Ok(());
        };

        let session = self
            .registry
            .create(client_id, username, theme, grid_size, &mut self.rng)?;
        let room_code = session.code().clone();
        client.join_room(room_code.clone());

        info!("Client {} created room {}", client_id, room_code);

        let mut out = vec![Outbound::client(
            client_id,
            ServerMessage::RoomCreated {
                room_code: room_code.to_string(),
            },
        )];
        out.extend(
            session
                .snapshot_for(client_id)
                .map(|state| Outbound::client(client_id, state)),
        );
        deliver(&self.clients, session, out);
        Ok(())
    }

    /// Handle room joining
    fn handle_join_room(
        &mut self,
        client_id: ClientId,
        room_code: String,
        username: String,
        theme: Option<String>,
    ) -> Result<(), AppError> {
        let Some(client) = self.clients.get_mut(&client_id) else {
            return Ok(());
        };

        let room_code = RoomCode::from_string(room_code);
        let session = self.registry.get_mut(&room_code)?;
        let out = session.join(client_id, username, theme, &mut self.rng)?;
        client.join_room(room_code.clone());

        info!("Client {} joined room {}", client_id, room_code);

        deliver(&self.clients, session, out);
        Ok(())
    }

    /// Handle game start and arm the room's turn timer
    fn handle_start_game(&mut self, client_id: ClientId, room_code: String) -> Result<(), AppError> {
        let room_code = RoomCode::from_string(room_code);
        let period = self.registry.rules().tick_interval;
        let session = self.registry.get_mut(&room_code)?;
        let out = session.start(client_id)?;
        sync_timer(&self.commands, period, session);
        deliver(&self.clients, session, out);
        Ok(())
    }

    /// Handle a manual number call
    fn handle_call_number(
        &mut self,
        client_id: ClientId,
        room_code: String,
        number: u32,
    ) -> Result<(), AppError> {
        let room_code = RoomCode::from_string(room_code);
        let period = self.registry.rules().tick_interval;
        let session = self.registry.get_mut(&room_code)?;
        let out = session.call_number(client_id, number)?;
        sync_timer(&self.commands, period, session);
        deliver(&self.clients, session, out);
        Ok(())
    }

    /// Handle one countdown step for a room
    ///
    /// Ticks from a previous session under the same code, or from a turn
    /// that has already passed, are dropped.
    fn handle_timer_tick(&mut self, room_code: RoomCode, session_id: SessionId, turn: u64) {
        let period = self.registry.rules().tick_interval;
        let Ok(session) = self.registry.get_mut(&room_code) else {
            debug!("Tick for deleted room {}", room_code);
            return;
        };
        if session.id() != session_id {
            debug!("Stale tick for reused room code {}", room_code);
            return;
        }
        if session.turn_seq() != turn {
            debug!("Tick for a finished turn in room {}", room_code);
            return;
        }

        let out = session.tick(&mut self.rng);
        sync_timer(&self.commands, period, session);
        deliver(&self.clients, session, out);
    }

    /// Helper: tell the requesting client about a rejected command
    fn report(&self, client_id: ClientId, result: Result<(), AppError>) {
        if let Err(err) = result {
            debug!("Rejected command from {}: {}", client_id, err);
            self.send_to(client_id, err.into());
        }
    }

    /// Helper: send one message to one client
    fn send_to(&self, client_id: ClientId, msg: ServerMessage) {
        if let Some(client) = self.clients.get(&client_id) {
            if let Err(e) = client.send(msg) {
                warn!("Dropped message for {}: {}", client_id, e);
            }
        }
    }
}

/// Spawn a countdown for the session's current turn if it lacks one.
fn sync_timer(
    commands: &mpsc::WeakSender<ServerCommand>,
    period: Duration,
    session: &mut GameSession,
) {
    if !session.needs_timer() {
        return;
    }
    match commands.upgrade() {
        Some(commands) => {
            let timer = TurnTimer::spawn(
                session.code().clone(),
                session.id(),
                session.turn_seq(),
                period,
                commands,
            );
            session.arm_timer(timer);
        }
        None => warn!(
            "Command channel closed, room {} runs without timer",
            session.code()
        ),
    }
}

/// Fan a transition's messages out to their recipients, in order.
///
/// Room-wide messages go to the session's current roster.
fn deliver(clients: &HashMap<ClientId, Client>, session: &GameSession, out: Vec<Outbound>) {
    for Outbound { to, message } in out {
        match to {
            Recipient::Room => {
                for player in session.players() {
                    send_or_warn(clients, player.id, message.clone());
                }
            }
            Recipient::Client(client_id) => send_or_warn(clients, client_id, message),
        }
    }
}

fn send_or_warn(clients: &HashMap<ClientId, Client>, client_id: ClientId, message: ServerMessage) {
    if let Some(client) = clients.get(&client_id) {
        if let Err(e) = client.send(message) {
            warn!("Dropped message for {}: {}", client_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(rules: GameConfig) -> (BingoServer, mpsc::Sender<ServerCommand>) {
        let (tx, rx) = mpsc::channel(64);
        (BingoServer::new(rx, tx.downgrade(), rules), tx)
    }

    fn connect(server: &mut BingoServer) -> (ClientId, mpsc::Receiver<ServerMessage>) {
        let client_id = ClientId::new();
        let (sender, rx) = mpsc::channel(64);
        server.handle_command(ServerCommand::Connect { client_id, sender });
        (client_id, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn create(
        server: &mut BingoServer,
        host: ClientId,
        rx: &mut mpsc::Receiver<ServerMessage>,
    ) -> RoomCode {
        server.handle_command(ServerCommand::CreateRoom {
            client_id: host,
            username: "Host".to_string(),
            grid_size: 5,
            theme: None,
        });
        drain(rx)
            .into_iter()
            .find_map(|msg| match msg {
                ServerMessage::RoomCreated { room_code } => Some(RoomCode::from_string(room_code)),
                _ => None,
            })
            .expect("room was not created")
    }

    fn start(server: &mut BingoServer, host: ClientId, code: &RoomCode) {
        server.handle_command(ServerCommand::StartGame {
            client_id: host,
            room_code: code.to_string(),
        });
    }

    // No await points: the spawned timers never get to run, so every tick
    // below is injected by hand.

    #[tokio::test(start_paused = true)]
    async fn test_tick_from_old_session_skips_reused_code() {
        let rules = GameConfig {
            room_code_len: 1,
            room_code_attempts: 10_000,
            ..GameConfig::default()
        };
        let (mut server, _tx) = server(rules);

        let (alice, mut alice_rx) = connect(&mut server);
        let code = create(&mut server, alice, &mut alice_rx);
        start(&mut server, alice, &code);
        let old_session = server.registry.get(&code).unwrap().id();

        server.handle_command(ServerCommand::Disconnect { client_id: alice });
        assert!(!server.registry.contains(&code));

        // 36 possible codes: the freed one is handed out again within 36 rooms
        let mut reused = None;
        for _ in 0..36 {
            let (host, mut rx) = connect(&mut server);
            if create(&mut server, host, &mut rx) == code {
                reused = Some((host, rx));
                break;
            }
        }
        let (bob, mut bob_rx) = reused.expect("freed code was never reissued");
        start(&mut server, bob, &code);
        drain(&mut bob_rx);

        let session = server.registry.get(&code).unwrap();
        assert_ne!(session.id(), old_session);
        let (new_session, turn) = (session.id(), session.turn_seq());

        server.handle_command(ServerCommand::TimerTick {
            room_code: code.clone(),
            session_id: old_session,
            turn,
        });
        assert!(drain(&mut bob_rx).is_empty());
        assert_eq!(server.registry.get(&code).unwrap().time_left(), 15);

        server.handle_command(ServerCommand::TimerTick {
            room_code: code.clone(),
            session_id: new_session,
            turn,
        });
        assert!(matches!(
            drain(&mut bob_rx).as_slice(),
            [ServerMessage::TimeUpdate { time_left: 14 }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_from_finished_turn_is_dropped() {
        let (mut server, _tx) = server(GameConfig::default());
        let (alice, mut alice_rx) = connect(&mut server);
        let code = create(&mut server, alice, &mut alice_rx);
        start(&mut server, alice, &code);

        let session = server.registry.get(&code).unwrap();
        let (session_id, first_turn) = (session.id(), session.turn_seq());
        assert_eq!(session.timer_turn(), Some(first_turn));

        server.handle_command(ServerCommand::CallNumber {
            client_id: alice,
            room_code: code.to_string(),
            number: 7,
        });
        let session = server.registry.get(&code).unwrap();
        assert_ne!(session.turn_seq(), first_turn);
        assert_eq!(session.timer_turn(), Some(session.turn_seq()));
        drain(&mut alice_rx);

        server.handle_command(ServerCommand::TimerTick {
            room_code: code.clone(),
            session_id,
            turn: first_turn,
        });
        assert!(drain(&mut alice_rx).is_empty());
        assert_eq!(server.registry.get(&code).unwrap().time_left(), 15);
    }
}
