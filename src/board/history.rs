//! Persisted move-history encoding.
//!
//! A saved game is the starting FEN, one 16-bit signed integer per move
//! (the canonical move hash) and the count of moves that were done at
//! save time. External collaborators store and exchange this form.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::MoveParseError;
use super::types::Move;

/// Persisted form of a chessboard's move history.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SavedGame {
    /// FEN the history is replayed from.
    pub starting_fen: String,
    /// Canonical move hashes, in play order.
    pub moves: Vec<i16>,
    /// How many of `moves` were done (not undone) at save time.
    pub done_count: usize,
}

impl SavedGame {
    /// Encode a move list into its persisted form.
    #[must_use]
    pub fn encode(starting_fen: &str, moves: &[Move], done_count: usize) -> Self {
        SavedGame {
            starting_fen: starting_fen.to_string(),
            // Move hashes stay below 2^15 by construction.
            moves: moves.iter().map(|mv| mv.hash() as i16).collect(),
            done_count,
        }
    }

    /// Decode every persisted hash back into a move.
    pub fn decode_moves(&self) -> Result<Vec<Move>, MoveParseError> {
        self.moves
            .iter()
            .map(|&hash| {
                u16::try_from(hash)
                    .ok()
                    .and_then(Move::from_hash)
                    .ok_or(MoveParseError::HashOutOfRange { hash: hash.into() })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(s: &str) -> Move {
        s.parse().unwrap()
    }

    #[test]
    fn encode_decode_round_trips() {
        let moves = vec![mv("e2e4"), mv("e7e5"), mv("g1f3"), mv("e7e8q")];
        let saved = SavedGame::encode("fen placeholder", &moves, 3);
        assert_eq!(saved.moves.len(), 4);
        assert_eq!(saved.done_count, 3);
        assert_eq!(saved.decode_moves().unwrap(), moves);
    }

    #[test]
    fn negative_hash_is_rejected() {
        let saved = SavedGame {
            starting_fen: String::new(),
            moves: vec![-1],
            done_count: 0,
        };
        assert!(matches!(
            saved.decode_moves(),
            Err(MoveParseError::HashOutOfRange { hash: -1 })
        ));
    }

    #[test]
    fn out_of_range_hash_is_rejected() {
        let saved = SavedGame {
            starting_fen: String::new(),
            moves: vec![i16::MAX],
            done_count: 0,
        };
        assert!(saved.decode_moves().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip() {
        let saved = SavedGame::encode("fen placeholder", &[mv("e2e4"), mv("e7e5")], 2);
        let json = serde_json::to_string(&saved).unwrap();
        let back: SavedGame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, saved);
    }
}
