//! Basic type definitions for the bingo server
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based connection identifier
//! - `SessionId`: UUID-based identifier of one game session instance
//! - `RoomCode`: short uppercase alphanumeric room code

use rand::Rng;
use uuid::Uuid;

/// Unique client identifier (newtype pattern)
///
/// Wraps a UUID v4. Stable for the lifetime of a connection and used as the
/// player's identity inside every room that connection joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single `GameSession` instance.
///
/// Room codes can be reused once a room is destroyed; timer ticks carry this
/// id so a tick queued for a dead session is never applied to its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Characters a generated room code is made of
pub const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Room code (uppercase alphanumeric)
///
/// Used to identify and join game rooms.
/// Generated randomly or parsed from user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Generate a random room code of `len` characters, each drawn
    /// uniformly from `A-Z0-9`
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Self {
        let code: String = (0..len)
            .map(|_| char::from(ROOM_CODE_CHARSET[rng.gen_range(0..ROOM_CODE_CHARSET.len())]))
            .collect();
        Self(code)
    }

    /// Create a RoomCode from a string (converts to uppercase)
    pub fn from_string(code: String) -> Self {
        Self(code.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_client_id_unique() {
        let id1 = ClientId::new();
        let id2 = ClientId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_room_code_length() {
        let mut rng = StdRng::seed_from_u64(7);
        let code = RoomCode::generate(&mut rng, 6);
        assert_eq!(code.0.len(), 6);
    }

    #[test]
    fn test_room_code_generated_uppercase() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let code = RoomCode::generate(&mut rng, 6);
            assert!(code
                .as_str()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_room_code_covers_charset_evenly() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut counts = std::collections::HashMap::new();
        for _ in 0..36_000 {
            let code = RoomCode::generate(&mut rng, 1);
            *counts.entry(code.0).or_insert(0u32) += 1;
        }

        assert_eq!(counts.len(), ROOM_CODE_CHARSET.len());
        // Expected 1000 each; letters and digits alike
        assert!(counts.values().all(|&n| (800..1200).contains(&n)));
    }

    #[test]
    fn test_room_code_uppercase() {
        let code = RoomCode::from_string(" abc123 ".to_string());
        assert_eq!(code.0, "ABC123");
    }
}
