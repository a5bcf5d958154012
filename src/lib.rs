//! Bridge to an external UCI chess engine process.
//!
//! The engine owns all chess knowledge; this crate owns the process, the
//! wire protocol and the move history, and re-derives position, legality
//! and piece layout from the engine after every mutation.

pub mod board;
pub mod process;
pub mod protocol;

pub use board::fen::{is_valid_fen, STARTING_FEN};
pub use board::{
    AnalysisChessboard, BoardError, BoardObserver, Chessboard, Color, GamePlayChessboard, Move,
    Piece, PieceGrid, PieceKind, Promotion, SavedGame, Square,
};
pub use process::{EngineConfig, EngineError, EngineProcess};
pub use protocol::ProtocolError;
