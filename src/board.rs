//! Board generation
//!
//! A board is an N×N grid holding every number of 1..=N² exactly once,
//! laid out row-major from a uniform shuffle.

use rand::seq::SliceRandom;
use rand::Rng;

/// An N×N grid of numbers, indexed `[row][col]`.
pub type Grid = Vec<Vec<u32>>;

/// An N×N grid of marks parallel to a [`Grid`].
pub type MarkGrid = Vec<Vec<bool>>;

/// Generate a board for a grid of dimension `size`.
///
/// Each call is independent: players in the same room receive different
/// arrangements of the same number universe.
pub fn generate_board<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Grid {
    let max = (size * size) as u32;
    let mut numbers: Vec<u32> = (1..=max).collect();
    numbers.shuffle(rng);

    numbers.chunks(size.max(1)).map(<[u32]>::to_vec).collect()
}

/// An all-false mark grid of dimension `size`.
pub fn empty_marks(size: usize) -> MarkGrid {
    vec![vec![false; size]; size]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_board_is_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        for size in 5..=8 {
            let board = generate_board(size, &mut rng);
            assert_eq!(board.len(), size);
            assert!(board.iter().all(|row| row.len() == size));

            let mut flat: Vec<u32> = board.into_iter().flatten().collect();
            flat.sort_unstable();
            let expected: Vec<u32> = (1..=(size * size) as u32).collect();
            assert_eq!(flat, expected);
        }
    }

    #[test]
    fn test_boards_are_independent() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = generate_board(5, &mut rng);
        let b = generate_board(5, &mut rng);
        // 25! arrangements; two identical draws would mean the shuffle is broken
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_marks() {
        let marks = empty_marks(6);
        assert_eq!(marks.len(), 6);
        assert!(marks.iter().flatten().all(|m| !m));
    }
}
