//! Chessboard state machines driven by an external engine.
//!
//! A chessboard here holds move history, never chess knowledge: after every
//! mutation it pushes the starting position plus the full move history to
//! the engine and re-derives the current FEN, the legal-move set and the
//! piece layout from it. The derived fields are recomputed together and
//! are never stale relative to the last completed mutation.
//!
//! Two variants share the [`Chessboard`] trait: [`GamePlayChessboard`]
//! keeps a linear history with an undo cursor, [`AnalysisChessboard`]
//! keeps a branching variation tree.
//!
//! Boards are owned by their caller and are not internally synchronized;
//! only the embedded [`EngineProcess`] serializes its own wire exchanges.

pub mod analysis;
pub mod error;
pub mod fen;
pub mod gameplay;
pub mod history;
pub mod observer;
pub mod types;

pub use analysis::AnalysisChessboard;
pub use error::BoardError;
pub use gameplay::GamePlayChessboard;
pub use history::SavedGame;
pub use observer::BoardObserver;
pub use types::{Color, Move, Piece, PieceGrid, PieceKind, Promotion, Square};

use crate::process::EngineProcess;
use crate::protocol;

/// Perft depth used when the engine is probed only for the legal-move set.
const LEGALITY_PROBE_DEPTH: u32 = 1;

/// Common interface of the two chessboard variants.
///
/// Every operation on a disposed board fails with [`BoardError::Disposed`];
/// mutations additionally fail with [`BoardError::IllegalMove`] when the
/// requested move is not in the current legal set, leaving all state
/// untouched.
pub trait Chessboard {
    /// Validate `fen`, clear the move history and make it the new starting
    /// position.
    fn reset(&mut self, fen: &str) -> Result<(), BoardError>;

    /// Play `mv` from the current position.
    fn perform_move(&mut self, mv: Move) -> Result<(), BoardError>;

    /// Take back the last done move. No-op at the start of history.
    fn undo(&mut self) -> Result<(), BoardError>;

    /// Replay the next explored continuation. No-op when none exists.
    fn redo(&mut self) -> Result<(), BoardError>;

    /// Terminate the owned engine and release derived state. Idempotent;
    /// the board is unusable afterwards.
    fn dispose(&mut self);

    /// Whether [`Chessboard::dispose`] has been called.
    fn is_disposed(&self) -> bool;

    /// FEN of the current position, as reported by the engine.
    fn current_fen(&self) -> Result<&str, BoardError>;

    /// FEN the history is replayed from; fixed until the next `reset`.
    fn starting_fen(&self) -> Result<&str, BoardError>;

    /// Legal moves in the current position.
    fn possible_moves(&self) -> Result<&[Move], BoardError>;

    /// Piece layout of the current position.
    fn pieces(&self) -> Result<&PieceGrid, BoardError>;

    /// Number of moves between the starting position and the current one.
    fn done_moves_count(&self) -> Result<usize, BoardError>;

    /// The moves between the starting position and the current one.
    fn done_moves(&self) -> Result<Vec<Move>, BoardError>;

    /// Engine-recommended move for the current position, searched to
    /// `depth`.
    fn best_move(&self, depth: u32) -> Result<Move, BoardError>;

    /// Register an observer; notified synchronously, in registration order.
    fn add_observer(&mut self, observer: Box<dyn BoardObserver>);

    /// Legal moves leaving from `square`.
    fn possible_moves_for(&self, square: Square) -> Result<Vec<Move>, BoardError> {
        Ok(self
            .possible_moves()?
            .iter()
            .copied()
            .filter(|mv| mv.from() == square)
            .collect())
    }

    /// Piece on `square`, if any.
    fn piece_at(&self, square: Square) -> Result<Option<Piece>, BoardError> {
        Ok(self.pieces()?[square.rank()][square.file()])
    }
}

/// Fields re-derived from the engine after every mutation.
pub(crate) struct DerivedState {
    pub(crate) current_fen: String,
    pub(crate) possible_moves: Vec<Move>,
    pub(crate) pieces: PieceGrid,
}

impl DerivedState {
    /// One full engine round-trip: push the history, pull the FEN, decode
    /// the piece grid locally, pull the legal-move set.
    pub(crate) fn derive(
        engine: &EngineProcess,
        starting_fen: &str,
        moves: &[Move],
    ) -> Result<Self, BoardError> {
        protocol::set_position(engine, starting_fen, moves)?;
        let current_fen = protocol::get_position(engine)?;
        let pieces = fen::piece_grid(&current_fen)?;
        let rated = protocol::get_all_moves_rating(engine, LEGALITY_PROBE_DEPTH)?;
        let possible_moves = rated.into_iter().map(|(mv, _)| mv).collect();
        Ok(DerivedState {
            current_fen,
            possible_moves,
            pieces,
        })
    }

    fn released() -> Self {
        DerivedState {
            current_fen: String::new(),
            possible_moves: Vec::new(),
            pieces: [[None; 8]; 8],
        }
    }
}

/// State shared by both chessboard variants: the owned engine, the
/// starting position, the derived fields and the observer list.
pub(crate) struct BoardCore {
    pub(crate) engine: EngineProcess,
    pub(crate) starting_fen: String,
    pub(crate) derived: DerivedState,
    pub(crate) observers: Vec<Box<dyn BoardObserver>>,
    pub(crate) disposed: bool,
}

impl BoardCore {
    /// Handshake with a freshly started engine and apply the options
    /// recorded on its configuration. The caller derives the initial state
    /// afterwards (gameplay boards signal a new game first).
    pub(crate) fn attach(engine: EngineProcess, starting_fen: &str) -> Result<Self, BoardError> {
        fen::assert_fen_validity(starting_fen)?;
        protocol::handshake(&engine)?;
        protocol::apply_configured_options(&engine)?;
        protocol::wait_for_ready(&engine)?;
        Ok(BoardCore {
            engine,
            starting_fen: starting_fen.to_string(),
            derived: DerivedState::released(),
            observers: Vec::new(),
            disposed: false,
        })
    }

    pub(crate) fn ensure_active(&self) -> Result<(), BoardError> {
        if self.disposed {
            Err(BoardError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Reject `mv` unless it is in the current legal set.
    pub(crate) fn ensure_legal(&self, mv: Move) -> Result<(), BoardError> {
        if self.derived.possible_moves.contains(&mv) {
            Ok(())
        } else {
            Err(BoardError::IllegalMove {
                notation: mv.to_string(),
            })
        }
    }

    /// Derive the state that `moves` would produce, without committing.
    pub(crate) fn derive_for(&self, moves: &[Move]) -> Result<DerivedState, BoardError> {
        DerivedState::derive(&self.engine, &self.starting_fen, moves)
    }

    /// Search the position reached by `moves` and return the engine's
    /// recommendation. The position is re-pushed first so the search never
    /// runs against a leftover engine state.
    pub(crate) fn best_move_for(&self, moves: &[Move], depth: u32) -> Result<Move, BoardError> {
        protocol::set_position(&self.engine, &self.starting_fen, moves)?;
        Ok(protocol::get_best_move(&self.engine, depth)?)
    }

    pub(crate) fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.engine.close();
        self.derived = DerivedState::released();
        self.observers.clear();
    }
}
