//! Game session state machine
//!
//! A `GameSession` is one room: its roster, the shared call history, the
//! turn pointer and the outcome. Every transition either fails without
//! touching state or succeeds and returns the ordered list of messages the
//! gateway has to deliver.
//!
//! ```text
//! Lobby --start--> InProgress --win--> Ended
//! ```

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::error::AppError;
use crate::message::{Outbound, PlayerView, RoomSummary, ServerMessage};
use crate::player::Player;
use crate::timer::TurnTimer;
use crate::types::{ClientId, RoomCode, SessionId};

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting players, no turns yet
    Lobby,
    /// Turns and timer running
    InProgress,
    /// Someone won; terminal
    Ended,
}

/// One room's game state.
///
/// Invariants:
/// - exactly one player has `is_turn` while `InProgress`, none otherwise
/// - exactly one player has `is_host` while the roster is non-empty
/// - `current_turn` indexes into `players` whenever `players` is non-empty
/// - `called` only grows and never holds a number twice
#[derive(Debug)]
pub struct GameSession {
    id: SessionId,
    code: RoomCode,
    grid_size: usize,
    rules: GameConfig,
    /// Join order is turn order
    players: Vec<Player>,
    called: Vec<u32>,
    called_set: HashSet<u32>,
    current_turn: usize,
    /// Bumped on every turn assignment; stamps the ticks of the live timer
    turn_seq: u64,
    phase: Phase,
    winner: Option<String>,
    time_left: u32,
    timer: Option<TurnTimer>,
}

impl GameSession {
    /// Create a session in the lobby with `creator` as its host.
    pub fn new<R: Rng + ?Sized>(
        code: RoomCode,
        creator: ClientId,
        username: String,
        theme: Option<String>,
        grid_size: usize,
        rules: GameConfig,
        rng: &mut R,
    ) -> Result<Self, AppError> {
        if !rules.grid_sizes.contains(&grid_size) {
            return Err(AppError::InvalidGridSize {
                size: grid_size,
                min: *rules.grid_sizes.start(),
                max: *rules.grid_sizes.end(),
            });
        }

        let mut host = Player::new(creator, username, theme, grid_size, rng);
        host.is_host = true;

        Ok(Self {
            id: SessionId::new(),
            code,
            grid_size,
            time_left: rules.turn_seconds,
            rules,
            players: vec![host],
            called: Vec::new(),
            called_set: HashSet::new(),
            current_turn: 0,
            turn_seq: 0,
            phase: Phase::Lobby,
            winner: None,
            timer: None,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        self.phase != Phase::Lobby
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, client_id: ClientId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == client_id)
    }

    pub fn contains(&self, client_id: ClientId) -> bool {
        self.player(client_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn called_numbers(&self) -> &[u32] {
        &self.called
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    /// The player on the clock, if the game is running
    pub fn current_player(&self) -> Option<&Player> {
        if self.phase == Phase::InProgress {
            self.players.get(self.current_turn)
        } else {
            None
        }
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn turn_seq(&self) -> u64 {
        self.turn_seq
    }

    pub fn has_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(TurnTimer::is_active)
    }

    /// Turn the armed timer ticks for, if one is running
    pub fn timer_turn(&self) -> Option<u64> {
        self.timer
            .as_ref()
            .filter(|timer| timer.is_active())
            .map(TurnTimer::turn)
    }

    /// True while the game runs without a timer for the current turn
    pub fn needs_timer(&self) -> bool {
        self.phase == Phase::InProgress && self.timer_turn() != Some(self.turn_seq)
    }

    pub fn player_views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.to_string(),
            players: self.players.len(),
            grid_size: self.grid_size,
            started: self.is_started(),
            ended: self.is_ended(),
        }
    }

    /// Full state as seen by `client_id`, including its own board
    pub fn snapshot_for(&self, client_id: ClientId) -> Option<ServerMessage> {
        let player = self.player(client_id)?;
        Some(ServerMessage::GameState {
            room_code: self.code.to_string(),
            grid_size: self.grid_size,
            players: self.player_views(),
            board: player.board.clone(),
            called_numbers: self.called.clone(),
            started: self.is_started(),
            ended: self.is_ended(),
            winner: self.winner.clone(),
        })
    }

    /// Add a player while the session is still in the lobby.
    pub fn join<R: Rng + ?Sized>(
        &mut self,
        client_id: ClientId,
        username: String,
        theme: Option<String>,
        rng: &mut R,
    ) -> Result<Vec<Outbound>, AppError> {
        if self.phase != Phase::Lobby {
            return Err(AppError::GameAlreadyStarted);
        }
        if self.contains(client_id) {
            return Err(AppError::AlreadyInRoom);
        }

        let player = Player::new(client_id, username, theme, self.grid_size, rng);
        info!("{} joined room {}", player.username, self.code);
        self.players.push(player);

        let mut out = vec![Outbound::room(ServerMessage::PlayerJoined {
            players: self.player_views(),
        })];
        out.extend(
            self.snapshot_for(client_id)
                .map(|state| Outbound::client(client_id, state)),
        );
        Ok(out)
    }

    /// Lobby → InProgress. Only the host may start.
    ///
    /// The caller is expected to arm a [`TurnTimer`] afterwards, and again
    /// whenever [`needs_timer`](Self::needs_timer) reports a new turn.
    pub fn start(&mut self, caller: ClientId) -> Result<Vec<Outbound>, AppError> {
        if !self.player(caller).is_some_and(|p| p.is_host) {
            return Err(AppError::NotHost);
        }
        if self.phase != Phase::Lobby {
            return Err(AppError::GameAlreadyStarted);
        }

        self.phase = Phase::InProgress;
        self.current_turn = 0;
        self.time_left = self.rules.turn_seconds;
        self.assign_turn();
        info!("Game started in room {}", self.code);

        let current_player = self.current_name();
        Ok(vec![
            Outbound::room(ServerMessage::GameStarted {
                players: self.player_views(),
                current_player: current_player.clone(),
            }),
            Outbound::room(ServerMessage::TurnChanged {
                current_player,
                time_left: self.time_left,
            }),
        ])
    }

    /// Manual call by the player holding the turn.
    ///
    /// Checks, in order: game running, caller's turn, number not yet
    /// called, number on the board. A rejection leaves state untouched.
    pub fn call_number(&mut self, caller: ClientId, number: u32) -> Result<Vec<Outbound>, AppError> {
        if self.phase != Phase::InProgress {
            return Err(AppError::GameNotInProgress);
        }
        if !self
            .players
            .get(self.current_turn)
            .is_some_and(|p| p.id == caller && p.is_turn)
        {
            return Err(AppError::NotYourTurn);
        }
        if self.called_set.contains(&number) {
            return Err(AppError::NumberAlreadyCalled(number));
        }
        let max = self.max_number();
        if number == 0 || number > max {
            return Err(AppError::NumberOutOfRange { number, max });
        }

        Ok(self.apply_call(number, false))
    }

    /// One countdown step. Reaching zero triggers an automatic call for
    /// the player on the clock.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Outbound> {
        if self.phase != Phase::InProgress {
            return Vec::new();
        }

        self.time_left = self.time_left.saturating_sub(1);
        let mut out = vec![Outbound::room(ServerMessage::TimeUpdate {
            time_left: self.time_left,
        })];
        if self.time_left > 0 {
            return out;
        }

        let uncalled: Vec<u32> = (1..=self.max_number())
            .filter(|n| !self.called_set.contains(n))
            .collect();
        match uncalled.choose(rng) {
            Some(&number) => out.extend(self.apply_call(number, true)),
            None => {
                // Nothing left to call; restart the countdown silently
                self.time_left = self.rules.turn_seconds;
            }
        }
        out
    }

    /// Remove a departing connection and repair host and turn.
    ///
    /// Returns nothing if the client was not seated here. When the roster
    /// becomes empty the timer is cancelled and the caller must drop the
    /// session.
    pub fn remove_player(&mut self, client_id: ClientId) -> Vec<Outbound> {
        let Some(index) = self.players.iter().position(|p| p.id == client_id) else {
            return Vec::new();
        };
        let departed = self.players.remove(index);
        info!("{} left room {}", departed.username, self.code);

        if self.players.is_empty() {
            self.cancel_timer();
            return Vec::new();
        }

        if departed.is_host {
            self.players[0].is_host = true;
        }

        let mut out = Vec::new();
        if self.phase == Phase::InProgress {
            if departed.is_turn {
                if self.current_turn >= self.players.len() {
                    self.current_turn = 0;
                }
                self.assign_turn();
                self.time_left = self.rules.turn_seconds;
                out.push(Outbound::room(ServerMessage::TurnChanged {
                    current_player: self.current_name(),
                    time_left: self.time_left,
                }));
            } else if index < self.current_turn {
                // Keep the turn with the same player after the shift
                self.current_turn -= 1;
            }
        } else if self.current_turn >= self.players.len() {
            self.current_turn = 0;
        }

        out.push(Outbound::room(ServerMessage::PlayerLeft {
            players: self.player_views(),
        }));
        out
    }

    /// Attach the countdown for the current turn. A previous timer is cancelled.
    pub fn arm_timer(&mut self, timer: TurnTimer) {
        self.cancel_timer();
        self.timer = Some(timer);
    }

    /// Stop the countdown, if any. Idempotent.
    pub fn cancel_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
            debug!("Timer cancelled for room {}", self.code);
        }
    }

    fn max_number(&self) -> u32 {
        (self.grid_size * self.grid_size) as u32
    }

    fn current_name(&self) -> String {
        self.players
            .get(self.current_turn)
            .map(|p| p.username.clone())
            .unwrap_or_default()
    }

    fn assign_turn(&mut self) {
        self.turn_seq += 1;
        let running = self.phase == Phase::InProgress;
        let current = self.current_turn;
        for (i, player) in self.players.iter_mut().enumerate() {
            player.is_turn = running && i == current;
        }
    }

    /// Record `number`, mark every board, then either end the game or pass
    /// the turn on.
    fn apply_call(&mut self, number: u32, automatic: bool) -> Vec<Outbound> {
        let called_by = self.current_name();
        self.called.push(number);
        self.called_set.insert(number);
        for player in &mut self.players {
            player.mark(number);
        }
        debug!(
            "Room {}: {} called {} (automatic: {})",
            self.code, called_by, number, automatic
        );

        let mut out = vec![Outbound::room(ServerMessage::NumberCalled {
            number,
            called_numbers: self.called.clone(),
            called_by,
            automatic,
        })];

        // Lowest roster index wins a simultaneous finish
        let needed = self.rules.winning_lines;
        let winner = self.players.iter().enumerate().find_map(|(i, p)| {
            let lines = p.completed_lines();
            (lines.len() >= needed).then_some((i, lines))
        });

        match winner {
            Some((index, winning_lines)) => {
                self.phase = Phase::Ended;
                self.cancel_timer();
                self.assign_turn();
                let player = &mut self.players[index];
                player.score += self.rules.win_bonus;
                self.winner = Some(player.username.clone());
                info!("{} won in room {}", player.username, self.code);

                out.push(Outbound::room(ServerMessage::GameEnded {
                    winner: player.username.clone(),
                    winning_lines,
                }));
            }
            None => {
                self.current_turn = (self.current_turn + 1) % self.players.len();
                self.time_left = self.rules.turn_seconds;
                self.assign_turn();
                out.push(Outbound::room(ServerMessage::TurnChanged {
                    current_player: self.current_name(),
                    time_left: self.time_left,
                }));
            }
        }
        out
    }
}
