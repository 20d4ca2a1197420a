//! Player state inside a game session

use rand::Rng;

use crate::board::{empty_marks, generate_board, Grid, MarkGrid};
use crate::message::PlayerView;
use crate::types::ClientId;
use crate::win::{completed_lines, Line};

/// Theme used when a client does not pick one
pub const DEFAULT_THEME: &str = "default";

/// One seat in a session.
///
/// `marked[r][c]` is true iff `board[r][c]` has been called in the session.
#[derive(Debug, Clone)]
pub struct Player {
    /// Connection identity
    pub id: ClientId,
    pub username: String,
    /// Cosmetic board theme, opaque to the server
    pub theme: String,
    pub score: u32,
    pub is_host: bool,
    pub is_turn: bool,
    pub board: Grid,
    pub marked: MarkGrid,
}

impl Player {
    /// Seat a player with a freshly generated board
    pub fn new<R: Rng + ?Sized>(
        id: ClientId,
        username: String,
        theme: Option<String>,
        size: usize,
        rng: &mut R,
    ) -> Self {
        Self {
            id,
            username,
            theme: theme.unwrap_or_else(|| DEFAULT_THEME.to_string()),
            score: 0,
            is_host: false,
            is_turn: false,
            board: generate_board(size, rng),
            marked: empty_marks(size),
        }
    }

    /// Mark every cell holding `number`. Returns true if a cell was marked.
    pub fn mark(&mut self, number: u32) -> bool {
        let mut hit = false;
        for (row, marks) in self.board.iter().zip(self.marked.iter_mut()) {
            for (cell, mark) in row.iter().zip(marks.iter_mut()) {
                if *cell == number {
                    *mark = true;
                    hit = true;
                }
            }
        }
        hit
    }

    /// Lines currently complete on this player's board
    pub fn completed_lines(&self) -> Vec<Line> {
        completed_lines(&self.marked, self.board.len())
    }

    /// Public view shared with the rest of the room
    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id.to_string(),
            username: self.username.clone(),
            score: self.score,
            is_host: self.is_host,
            is_turn: self.is_turn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn player(size: usize) -> Player {
        let mut rng = StdRng::seed_from_u64(3);
        Player::new(ClientId::new(), "Alice".to_string(), None, size, &mut rng)
    }

    #[test]
    fn test_new_player_defaults() {
        let p = player(5);
        assert_eq!(p.score, 0);
        assert!(!p.is_host);
        assert!(!p.is_turn);
        assert_eq!(p.theme, DEFAULT_THEME);
        assert!(p.marked.iter().flatten().all(|m| !m));
    }

    #[test]
    fn test_mark_matches_board_cell() {
        let mut p = player(5);
        let number = p.board[1][3];
        assert!(p.mark(number));
        assert!(p.marked[1][3]);
        assert_eq!(p.marked.iter().flatten().filter(|m| **m).count(), 1);
    }

    #[test]
    fn test_mark_unknown_number() {
        let mut p = player(5);
        assert!(!p.mark(26));
        assert!(p.marked.iter().flatten().all(|m| !m));
    }

    #[test]
    fn test_completed_row_after_marking() {
        let mut p = player(5);
        let row = p.board[0].clone();
        for n in row {
            p.mark(n);
        }
        assert_eq!(p.completed_lines(), vec![vec![0, 1, 2, 3, 4]]);
    }
}
