//! Room registry
//!
//! Process-wide map of room code → `GameSession`. Owned by the coordinator
//! actor, so every access is already serialized through its mailbox.

use std::collections::HashMap;

use rand::Rng;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::error::AppError;
use crate::message::RoomSummary;
use crate::session::GameSession;
use crate::types::{ClientId, RoomCode};

/// All live sessions, keyed by room code
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, GameSession>,
    rules: GameConfig,
}

impl RoomRegistry {
    pub fn new(rules: GameConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            rules,
        }
    }

    pub fn rules(&self) -> &GameConfig {
        &self.rules
    }

    /// Create a session hosted by `creator` under a fresh code.
    ///
    /// Codes are generated until one is not in use, up to the configured
    /// number of attempts.
    pub fn create<R: Rng + ?Sized>(
        &mut self,
        creator: ClientId,
        username: String,
        theme: Option<String>,
        grid_size: usize,
        rng: &mut R,
    ) -> Result<&mut GameSession, AppError> {
        let code = self.free_code(rng)?;
        let session = GameSession::new(
            code.clone(),
            creator,
            username,
            theme,
            grid_size,
            self.rules.clone(),
            rng,
        )?;
        info!("Room {} created ({}x{})", code, grid_size, grid_size);
        Ok(self.rooms.entry(code).or_insert(session))
    }

    pub fn get(&self, code: &RoomCode) -> Result<&GameSession, AppError> {
        self.rooms
            .get(code)
            .ok_or_else(|| AppError::RoomNotFound(code.to_string()))
    }

    pub fn get_mut(&mut self, code: &RoomCode) -> Result<&mut GameSession, AppError> {
        self.rooms
            .get_mut(code)
            .ok_or_else(|| AppError::RoomNotFound(code.to_string()))
    }

    /// Drop the session if its roster is empty. Returns true if removed.
    pub fn remove_if_empty(&mut self, code: &RoomCode) -> bool {
        if !self.rooms.get(code).is_some_and(GameSession::is_empty) {
            return false;
        }
        if let Some(mut session) = self.rooms.remove(code) {
            session.cancel_timer();
        }
        info!("Room {} deleted (empty)", code);
        true
    }

    /// Status of every live room, ordered by code
    pub fn list(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self.rooms.values().map(GameSession::summary).collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code));
        rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    fn free_code<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<RoomCode, AppError> {
        for _ in 0..self.rules.room_code_attempts {
            let code = RoomCode::generate(rng, self.rules.room_code_len);
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
            debug!("Room code {} already taken, retrying", code);
        }
        Err(AppError::RoomCapacity(self.rules.room_code_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn registry() -> (RoomRegistry, StdRng) {
        (
            RoomRegistry::new(GameConfig::default()),
            StdRng::seed_from_u64(17),
        )
    }

    #[test]
    fn test_create_and_get() {
        let (mut reg, mut rng) = registry();
        let host = ClientId::new();
        let code = reg
            .create(host, "Alice".to_string(), None, 5, &mut rng)
            .unwrap()
            .code()
            .clone();

        assert_eq!(code.as_str().len(), 6);
        let session = reg.get(&code).unwrap();
        assert!(session.contains(host));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_unknown_code() {
        let (reg, _) = registry();
        let err = reg.get(&RoomCode::from_string("NOPE00".to_string())).unwrap_err();
        assert!(matches!(err, AppError::RoomNotFound(code) if code == "NOPE00"));
    }

    #[test]
    fn test_invalid_grid_size_creates_nothing() {
        let (mut reg, mut rng) = registry();
        let err = reg
            .create(ClientId::new(), "Alice".to_string(), None, 9, &mut rng)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidGridSize { .. }));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_codes_never_collide() {
        let rules = GameConfig {
            room_code_len: 1,
            room_code_attempts: 10_000,
            ..GameConfig::default()
        };
        let mut reg = RoomRegistry::new(rules);
        let mut rng = StdRng::seed_from_u64(23);

        // 26 letters + 10 digits
        for _ in 0..36 {
            reg.create(ClientId::new(), "P".to_string(), None, 5, &mut rng)
                .unwrap();
        }
        assert_eq!(reg.len(), 36);

        let err = reg
            .create(ClientId::new(), "P".to_string(), None, 5, &mut rng)
            .unwrap_err();
        assert!(matches!(err, AppError::RoomCapacity(10_000)));
        assert_eq!(reg.len(), 36);
    }

    #[test]
    fn test_remove_if_empty() {
        let (mut reg, mut rng) = registry();
        let host = ClientId::new();
        let code = reg
            .create(host, "Alice".to_string(), None, 5, &mut rng)
            .unwrap()
            .code()
            .clone();

        assert!(!reg.remove_if_empty(&code));
        reg.get_mut(&code).unwrap().remove_player(host);
        assert!(reg.remove_if_empty(&code));
        assert!(!reg.contains(&code));
        assert!(!reg.remove_if_empty(&code));
    }

    #[test]
    fn test_list_reports_status() {
        let (mut reg, mut rng) = registry();
        let host = ClientId::new();
        let code = reg
            .create(host, "Alice".to_string(), None, 7, &mut rng)
            .unwrap()
            .code()
            .clone();
        reg.get_mut(&code).unwrap().start(host).unwrap();
        reg.create(ClientId::new(), "Bob".to_string(), None, 5, &mut rng)
            .unwrap();

        let rooms = reg.list();
        assert_eq!(rooms.len(), 2);
        let started = rooms.iter().find(|r| r.code == code.as_str()).unwrap();
        assert_eq!(started.players, 1);
        assert_eq!(started.grid_size, 7);
        assert!(started.started);
        assert!(!started.ended);
        assert!(rooms.windows(2).all(|w| w[0].code <= w[1].code));
    }
}
