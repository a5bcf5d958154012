//! Error types for chessboard operations.

use std::fmt;

use crate::process::EngineError;
use crate::protocol::ProtocolError;

/// Error type for FEN validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// The string does not match the 6-field FEN shape
    MalformedStructure { fen: String },
    /// A rank's file count does not sum to 8
    BadRankWidth { rank: usize, files: usize },
    /// A side does not have exactly one king
    BadKingCount { white: usize, black: usize },
    /// A side has more than 8 pawns
    TooManyPawns { side: &'static str, pawns: usize },
    /// A side has more than 15 non-king pieces
    TooManyPieces { side: &'static str, pieces: usize },
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::MalformedStructure { fen } => {
                write!(f, "FEN '{fen}' does not match the 6-field structure")
            }
            FenError::BadRankWidth { rank, files } => {
                write!(f, "Rank {rank} covers {files} files, expected exactly 8")
            }
            FenError::BadKingCount { white, black } => {
                write!(
                    f,
                    "Each side needs exactly one king, found {white} white and {black} black"
                )
            }
            FenError::TooManyPawns { side, pawns } => {
                write!(f, "{side} has {pawns} pawns, at most 8 allowed")
            }
            FenError::TooManyPieces { side, pieces } => {
                write!(f, "{side} has {pieces} non-king pieces, at most 15 allowed")
            }
        }
    }
}

impl std::error::Error for FenError {}

/// Error type for square construction and parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    /// Rank index out of bounds (must be 0-7)
    RankOutOfBounds { rank: usize },
    /// File index out of bounds (must be 0-7)
    FileOutOfBounds { file: usize },
    /// Square notation is not `[a-h][1-8]`
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::RankOutOfBounds { rank } => {
                write!(f, "Rank index {rank} out of bounds (0-7)")
            }
            SquareError::FileOutOfBounds { file } => {
                write!(f, "File index {file} out of bounds (0-7)")
            }
            SquareError::InvalidNotation { notation } => {
                write!(f, "Invalid square notation '{notation}'")
            }
        }
    }
}

impl std::error::Error for SquareError {}

/// Error type for move parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    /// Move string has invalid length (must be 4-5 characters)
    InvalidLength { len: usize },
    /// Invalid square notation in move
    InvalidSquare { notation: String },
    /// Invalid promotion piece
    InvalidPromotion { char: char },
    /// Persisted move hash outside the encodable range
    HashOutOfRange { hash: i32 },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { len } => {
                write!(f, "Move must be 4-5 characters, found {len}")
            }
            MoveParseError::InvalidSquare { notation } => {
                write!(f, "Invalid square notation in '{notation}'")
            }
            MoveParseError::InvalidPromotion { char } => {
                write!(f, "Invalid promotion piece '{char}'")
            }
            MoveParseError::HashOutOfRange { hash } => {
                write!(f, "Move hash {hash} outside the encodable range")
            }
        }
    }
}

impl std::error::Error for MoveParseError {}

/// Error type for chessboard state-machine operations.
#[derive(Debug)]
pub enum BoardError {
    /// Requested move is not in the current legal set; state unchanged
    IllegalMove { notation: String },
    /// The board has been disposed; terminal state
    Disposed,
    /// Caller-supplied FEN failed validation before any I/O
    Fen(FenError),
    /// Caller-supplied move text or hash failed validation
    Move(MoveParseError),
    /// The underlying engine process failed
    Engine(EngineError),
    /// The engine answered a protocol request with an unparseable payload
    Protocol { command: String, line: String },
    /// A saved game's done cursor exceeds its move list
    CorruptSavedGame { done_count: usize, moves: usize },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::IllegalMove { notation } => {
                write!(f, "Move '{notation}' is not legal in the current position")
            }
            BoardError::Disposed => write!(f, "Chessboard has been disposed"),
            BoardError::Fen(e) => write!(f, "Invalid FEN: {e}"),
            BoardError::Move(e) => write!(f, "Invalid move: {e}"),
            BoardError::Engine(e) => write!(f, "Engine failure: {e}"),
            BoardError::Protocol { command, line } => {
                write!(f, "Malformed engine response to '{command}': '{line}'")
            }
            BoardError::CorruptSavedGame { done_count, moves } => {
                write!(
                    f,
                    "Saved game marks {done_count} moves done but stores only {moves}"
                )
            }
        }
    }
}

impl std::error::Error for BoardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BoardError::Fen(e) => Some(e),
            BoardError::Move(e) => Some(e),
            BoardError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FenError> for BoardError {
    fn from(e: FenError) -> Self {
        BoardError::Fen(e)
    }
}

impl From<MoveParseError> for BoardError {
    fn from(e: MoveParseError) -> Self {
        BoardError::Move(e)
    }
}

impl From<EngineError> for BoardError {
    fn from(e: EngineError) -> Self {
        BoardError::Engine(e)
    }
}

impl From<ProtocolError> for BoardError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Fen(e) => BoardError::Fen(e),
            ProtocolError::Engine(e) => BoardError::Engine(e),
            ProtocolError::MalformedResponse { command, line } => {
                BoardError::Protocol { command, line }
            }
        }
    }
}
