//! Linear-history chessboard for playing through a game.

use super::error::BoardError;
use super::fen::{assert_fen_validity, STARTING_FEN};
use super::history::SavedGame;
use super::observer::{self, BoardObserver, MoveEvent};
use super::types::{Move, PieceGrid};
use super::{BoardCore, Chessboard, DerivedState};
use crate::process::EngineProcess;
use crate::protocol;

/// A chessboard with an append-only move list and a "done" cursor.
///
/// Undo and redo slide the cursor; performing a move while the cursor is
/// before the end of the list truncates everything past it first.
pub struct GamePlayChessboard {
    core: BoardCore,
    moves: Vec<Move>,
    done: usize,
}

impl GamePlayChessboard {
    /// Attach to a started engine at the standard starting position.
    pub fn new(engine: EngineProcess) -> Result<Self, BoardError> {
        Self::with_fen(engine, STARTING_FEN)
    }

    /// Attach to a started engine at an arbitrary starting position.
    pub fn with_fen(engine: EngineProcess, starting_fen: &str) -> Result<Self, BoardError> {
        let mut core = BoardCore::attach(engine, starting_fen)?;
        protocol::new_game(&core.engine)?;
        core.derived = core.derive_for(&[])?;
        Ok(GamePlayChessboard {
            core,
            moves: Vec::new(),
            done: 0,
        })
    }

    /// Rebuild a board from its persisted form, replaying every move
    /// through the engine. Undone moves stay redoable.
    pub fn load(engine: EngineProcess, saved: &SavedGame) -> Result<Self, BoardError> {
        let moves = saved.decode_moves()?;
        if saved.done_count > moves.len() {
            return Err(BoardError::CorruptSavedGame {
                done_count: saved.done_count,
                moves: moves.len(),
            });
        }

        let mut board = Self::with_fen(engine, &saved.starting_fen)?;
        for &mv in &moves {
            board.perform_move(mv)?;
        }
        for _ in saved.done_count..moves.len() {
            board.undo()?;
        }
        Ok(board)
    }

    /// Persist the starting position, the full move list and the cursor.
    pub fn save(&self) -> Result<SavedGame, BoardError> {
        self.core.ensure_active()?;
        Ok(SavedGame::encode(
            &self.core.starting_fen,
            &self.moves,
            self.done,
        ))
    }

    /// The full move list, including undone moves past the cursor.
    pub fn all_moves(&self) -> Result<&[Move], BoardError> {
        self.core.ensure_active()?;
        Ok(&self.moves)
    }

    fn notify(&self, event: MoveEvent, mv: Move) {
        observer::notify_all(&self.core.observers, self, event, mv);
    }
}

impl Chessboard for GamePlayChessboard {
    fn reset(&mut self, fen: &str) -> Result<(), BoardError> {
        self.core.ensure_active()?;
        assert_fen_validity(fen)?;
        protocol::new_game(&self.core.engine)?;
        let derived = DerivedState::derive(&self.core.engine, fen, &[])?;
        self.core.starting_fen = fen.to_string();
        self.core.derived = derived;
        self.moves.clear();
        self.done = 0;
        Ok(())
    }

    fn perform_move(&mut self, mv: Move) -> Result<(), BoardError> {
        self.core.ensure_active()?;
        self.core.ensure_legal(mv)?;

        let mut prospective = self.moves[..self.done].to_vec();
        prospective.push(mv);
        let derived = self.core.derive_for(&prospective)?;

        self.moves.truncate(self.done);
        self.moves.push(mv);
        self.done += 1;
        self.core.derived = derived;

        self.notify(MoveEvent::Done, mv);
        Ok(())
    }

    fn undo(&mut self) -> Result<(), BoardError> {
        self.core.ensure_active()?;
        if self.done == 0 {
            return Ok(());
        }

        let derived = self.core.derive_for(&self.moves[..self.done - 1])?;
        self.done -= 1;
        self.core.derived = derived;

        self.notify(MoveEvent::Undone, self.moves[self.done]);
        Ok(())
    }

    fn redo(&mut self) -> Result<(), BoardError> {
        self.core.ensure_active()?;
        if self.done == self.moves.len() {
            return Ok(());
        }

        let derived = self.core.derive_for(&self.moves[..self.done + 1])?;
        self.done += 1;
        self.core.derived = derived;

        self.notify(MoveEvent::Redone, self.moves[self.done - 1]);
        Ok(())
    }

    fn dispose(&mut self) {
        self.core.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.core.disposed
    }

    fn current_fen(&self) -> Result<&str, BoardError> {
        self.core.ensure_active()?;
        Ok(&self.core.derived.current_fen)
    }

    fn starting_fen(&self) -> Result<&str, BoardError> {
        self.core.ensure_active()?;
        Ok(&self.core.starting_fen)
    }

    fn possible_moves(&self) -> Result<&[Move], BoardError> {
        self.core.ensure_active()?;
        Ok(&self.core.derived.possible_moves)
    }

    fn pieces(&self) -> Result<&PieceGrid, BoardError> {
        self.core.ensure_active()?;
        Ok(&self.core.derived.pieces)
    }

    fn done_moves_count(&self) -> Result<usize, BoardError> {
        self.core.ensure_active()?;
        Ok(self.done)
    }

    fn done_moves(&self) -> Result<Vec<Move>, BoardError> {
        self.core.ensure_active()?;
        Ok(self.moves[..self.done].to_vec())
    }

    fn best_move(&self, depth: u32) -> Result<Move, BoardError> {
        self.core.ensure_active()?;
        self.core.best_move_for(&self.moves[..self.done], depth)
    }

    fn add_observer(&mut self, observer: Box<dyn BoardObserver>) {
        self.core.observers.push(observer);
    }
}
