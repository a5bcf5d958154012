//! Branching-history chessboard for analysing variations.

use super::error::BoardError;
use super::fen::{assert_fen_validity, STARTING_FEN};
use super::observer::{self, BoardObserver, MoveEvent};
use super::types::{Move, PieceGrid};
use super::{BoardCore, Chessboard, DerivedState};
use crate::process::EngineProcess;

/// Index of a node in the variation tree's arena.
type NodeId = usize;

struct Node {
    mv: Move,
    /// Explored continuations, in exploration order. Index 0 is the
    /// mainline.
    children: Vec<NodeId>,
}

/// Rooted ordered tree of explored moves plus the path to the current
/// position.
///
/// Nodes live in an arena and refer to children by index; there are no
/// parent back-references.
struct VariationTree {
    nodes: Vec<Node>,
    root_children: Vec<NodeId>,
    path: Vec<NodeId>,
}

impl VariationTree {
    fn new() -> Self {
        VariationTree {
            nodes: Vec::new(),
            root_children: Vec::new(),
            path: Vec::new(),
        }
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.root_children.clear();
        self.path.clear();
    }

    fn current_children(&self) -> &[NodeId] {
        match self.path.last() {
            Some(&id) => &self.nodes[id].children,
            None => &self.root_children,
        }
    }

    /// Moves from the root to the current position.
    fn path_moves(&self) -> Vec<Move> {
        self.path.iter().map(|&id| self.nodes[id].mv).collect()
    }

    fn last_move(&self) -> Option<Move> {
        self.path.last().map(|&id| self.nodes[id].mv)
    }

    /// Move the mainline continuation would replay, if one is explored.
    fn mainline_move(&self) -> Option<Move> {
        self.current_children()
            .first()
            .map(|&id| self.nodes[id].mv)
    }

    /// Descend into `mv`, reusing an already-explored child or creating a
    /// new one.
    fn descend(&mut self, mv: Move) {
        let existing = self
            .current_children()
            .iter()
            .copied()
            .find(|&id| self.nodes[id].mv == mv);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.nodes.len();
                self.nodes.push(Node {
                    mv,
                    children: Vec::new(),
                });
                match self.path.last() {
                    Some(&parent) => self.nodes[parent].children.push(id),
                    None => self.root_children.push(id),
                }
                id
            }
        };
        self.path.push(id);
    }

    /// Step back towards the root, returning the move left behind.
    fn ascend(&mut self) -> Option<Move> {
        self.path.pop().map(|id| self.nodes[id].mv)
    }

    /// Descend into the mainline. Returns the replayed move.
    fn descend_mainline(&mut self) -> Option<Move> {
        let id = *self.current_children().first()?;
        self.path.push(id);
        Some(self.nodes[id].mv)
    }
}

/// A chessboard that records every explored variation.
///
/// Performing a move that was already explored from the current position
/// descends into the existing branch; redo without an explicit choice
/// always follows the mainline (the first-explored child), regardless of
/// which sibling was played most recently.
pub struct AnalysisChessboard {
    core: BoardCore,
    tree: VariationTree,
}

impl AnalysisChessboard {
    /// Attach to a started engine at the standard starting position.
    pub fn new(engine: EngineProcess) -> Result<Self, BoardError> {
        Self::with_fen(engine, STARTING_FEN)
    }

    /// Attach to a started engine at an arbitrary starting position.
    pub fn with_fen(engine: EngineProcess, starting_fen: &str) -> Result<Self, BoardError> {
        let mut core = BoardCore::attach(engine, starting_fen)?;
        core.derived = core.derive_for(&[])?;
        Ok(AnalysisChessboard {
            core,
            tree: VariationTree::new(),
        })
    }

    /// Moves of the explored continuations from the current position, the
    /// mainline first.
    pub fn explored_continuations(&self) -> Result<Vec<Move>, BoardError> {
        self.core.ensure_active()?;
        Ok(self
            .tree
            .current_children()
            .iter()
            .map(|&id| self.tree.nodes[id].mv)
            .collect())
    }

    fn notify(&self, event: MoveEvent, mv: Move) {
        observer::notify_all(&self.core.observers, self, event, mv);
    }
}

impl Chessboard for AnalysisChessboard {
    fn reset(&mut self, fen: &str) -> Result<(), BoardError> {
        self.core.ensure_active()?;
        assert_fen_validity(fen)?;
        let derived = DerivedState::derive(&self.core.engine, fen, &[])?;
        self.core.starting_fen = fen.to_string();
        self.core.derived = derived;
        self.tree.clear();
        Ok(())
    }

    fn perform_move(&mut self, mv: Move) -> Result<(), BoardError> {
        self.core.ensure_active()?;
        self.core.ensure_legal(mv)?;

        let mut prospective = self.tree.path_moves();
        prospective.push(mv);
        let derived = self.core.derive_for(&prospective)?;

        self.tree.descend(mv);
        self.core.derived = derived;

        self.notify(MoveEvent::Done, mv);
        Ok(())
    }

    fn undo(&mut self) -> Result<(), BoardError> {
        self.core.ensure_active()?;
        let Some(mv) = self.tree.last_move() else {
            return Ok(());
        };

        let mut prospective = self.tree.path_moves();
        prospective.pop();
        let derived = self.core.derive_for(&prospective)?;

        self.tree.ascend();
        self.core.derived = derived;

        self.notify(MoveEvent::Undone, mv);
        Ok(())
    }

    fn redo(&mut self) -> Result<(), BoardError> {
        self.core.ensure_active()?;
        let Some(mv) = self.tree.mainline_move() else {
            return Ok(());
        };

        let mut prospective = self.tree.path_moves();
        prospective.push(mv);
        let derived = self.core.derive_for(&prospective)?;

        self.tree.descend_mainline();
        self.core.derived = derived;

        self.notify(MoveEvent::Redone, mv);
        Ok(())
    }

    fn dispose(&mut self) {
        self.core.dispose();
        self.tree.clear();
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
        Ok(self.tree.path.len())
    }

    fn done_moves(&self) -> Result<Vec<Move>, BoardError> {
        self.core.ensure_active()?;
        Ok(self.tree.path_moves())
    }

    fn best_move(&self, depth: u32) -> Result<Move, BoardError> {
        self.core.ensure_active()?;
        self.core.best_move_for(&self.tree.path_moves(), depth)
    }

    fn add_observer(&mut self, observer: Box<dyn BoardObserver>) {
        self.core.observers.push(observer);
    }
}
