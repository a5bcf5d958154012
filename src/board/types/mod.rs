//! Value types shared by the protocol and chessboard layers.

pub mod moves;
pub mod piece;
pub mod square;

pub use moves::{Move, Promotion, MAX_MOVE_HASH};
pub use piece::{Color, Piece, PieceKind};
pub use square::Square;

/// Piece layout of a position, indexed `[rank][file]` with rank 0 = rank 1.
pub type PieceGrid = [[Option<Piece>; 8]; 8];
