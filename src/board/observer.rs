//! Chessboard observers.
//!
//! Each board owns its observer list; there is no global registry.
//! Notifications are dispatched synchronously on the mutating thread, in
//! registration order, after the board's derived state has been refreshed.
//! An observer therefore always sees the board in the state produced by
//! the mutation it is being told about.

use super::types::Move;
use super::Chessboard;

/// Receives move lifecycle notifications from a chessboard.
pub trait BoardObserver: Send {
    /// A move was performed on `board`.
    fn move_done(&self, board: &dyn Chessboard, mv: Move);

    /// A move was taken back on `board`.
    fn move_undone(&self, board: &dyn Chessboard, mv: Move);

    /// A previously undone move was replayed on `board`.
    fn move_redone(&self, board: &dyn Chessboard, mv: Move);
}

/// Which lifecycle event to dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MoveEvent {
    Done,
    Undone,
    Redone,
}

pub(crate) fn notify_all(
    observers: &[Box<dyn BoardObserver>],
    board: &dyn Chessboard,
    event: MoveEvent,
    mv: Move,
) {
    for observer in observers {
        match event {
            MoveEvent::Done => observer.move_done(board, mv),
            MoveEvent::Undone => observer.move_undone(board, mv),
            MoveEvent::Redone => observer.move_redone(board, mv),
        }
    }
}
