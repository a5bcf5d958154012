//! FEN validation and decoding.
//!
//! Everything here is pure and engine-free: validation runs before any
//! caller-supplied text is sent to the engine, and the piece-grid decoder
//! is how the chessboards turn an engine-reported FEN into a layout.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{FenError, SquareError};
use super::types::{Color, Piece, PieceGrid, PieceKind, Square};

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Shape of a 6-field FEN: placement, side to move, castling rights,
/// en passant square, halfmove clock, fullmove number. Castling rights
/// are a non-empty subset of KQkq in that order, spelled out because the
/// alternatives must not match the empty string.
static FEN_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[pnbrqkPNBRQK1-8]{1,8}/){7}[pnbrqkPNBRQK1-8]{1,8} [wb] (?:-|KQ?k?q?|Qk?q?|kq?|q) (?:-|[a-h][36]) \d+ \d+$",
    )
    .expect("FEN shape regex is valid")
});

/// Check whether `fen` is structurally valid and satisfies the piece-count
/// invariants (each rank sums to 8 files, exactly one king per side, at
/// most 8 pawns and 15 non-king pieces per side).
#[must_use]
pub fn is_valid_fen(fen: &str) -> bool {
    assert_fen_validity(fen).is_ok()
}

/// Validate `fen`, returning a descriptive error on failure.
pub fn assert_fen_validity(fen: &str) -> Result<(), FenError> {
    if !FEN_SHAPE.is_match(fen) {
        return Err(FenError::MalformedStructure {
            fen: fen.to_string(),
        });
    }

    let placement = fen.split(' ').next().unwrap_or_default();

    let mut white_kings = 0usize;
    let mut black_kings = 0usize;
    let mut white_pawns = 0usize;
    let mut black_pawns = 0usize;
    let mut white_pieces = 0usize;
    let mut black_pieces = 0usize;

    for (rank_idx, rank) in placement.split('/').enumerate() {
        let mut files = 0usize;
        for c in rank.chars() {
            if let Some(skip) = c.to_digit(10) {
                files += skip as usize;
                continue;
            }
            files += 1;
            // The shape regex already restricted letters to pnbrqk.
            let piece = match Piece::from_fen_char(c) {
                Some(p) => p,
                None => {
                    return Err(FenError::MalformedStructure {
                        fen: fen.to_string(),
                    })
                }
            };
            let white = piece.color == Color::White;
            match piece.kind {
                PieceKind::King => {
                    if white {
                        white_kings += 1;
                    } else {
                        black_kings += 1;
                    }
                }
                kind => {
                    if kind == PieceKind::Pawn {
                        if white {
                            white_pawns += 1;
                        } else {
                            black_pawns += 1;
                        }
                    }
                    if white {
                        white_pieces += 1;
                    } else {
                        black_pieces += 1;
                    }
                }
            }
        }
        if files != 8 {
            return Err(FenError::BadRankWidth {
                rank: 8 - rank_idx,
                files,
            });
        }
    }

    if white_kings != 1 || black_kings != 1 {
        return Err(FenError::BadKingCount {
            white: white_kings,
            black: black_kings,
        });
    }
    if white_pawns > 8 {
        return Err(FenError::TooManyPawns {
            side: "White",
            pawns: white_pawns,
        });
    }
    if black_pawns > 8 {
        return Err(FenError::TooManyPawns {
            side: "Black",
            pawns: black_pawns,
        });
    }
    if white_pieces > 15 {
        return Err(FenError::TooManyPieces {
            side: "White",
            pieces: white_pieces,
        });
    }
    if black_pieces > 15 {
        return Err(FenError::TooManyPieces {
            side: "Black",
            pieces: black_pieces,
        });
    }

    Ok(())
}

/// Validate square notation, returning the parsed square.
pub fn assert_square_validity(notation: &str) -> Result<Square, SquareError> {
    notation.parse()
}

/// Decode the placement field of a validated FEN into the 8x8 piece grid.
pub fn piece_grid(fen: &str) -> Result<PieceGrid, FenError> {
    assert_fen_validity(fen)?;

    let placement = fen.split(' ').next().unwrap_or_default();
    let mut grid: PieceGrid = [[None; 8]; 8];

    // FEN lists ranks from 8 down to 1.
    for (rank_idx, rank) in placement.split('/').enumerate() {
        let mut file = 0usize;
        for c in rank.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
            } else if let Some(piece) = Piece::from_fen_char(c) {
                grid[7 - rank_idx][file] = Some(piece);
                file += 1;
            }
        }
    }

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_starting_position() {
        assert!(is_valid_fen(STARTING_FEN));
    }

    #[test]
    fn accepts_positions_without_castling_or_en_passant() {
        assert!(is_valid_fen("8/8/8/4k3/8/8/4K3/8 w - - 12 40"));
        assert!(is_valid_fen(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        ));
    }

    #[test]
    fn rejects_two_kings_per_side() {
        assert!(!is_valid_fen(
            "rnbqkknr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        ));
    }

    #[test]
    fn rejects_nine_pawns() {
        assert!(!is_valid_fen(
            "rnbqkbnr/pppppppp/p7/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        ));
    }

    #[test]
    fn rejects_rank_not_summing_to_eight() {
        assert!(!is_valid_fen(
            "rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        ));
    }

    #[test]
    fn accepts_partial_castling_rights() {
        assert!(is_valid_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w Kq - 0 1"
        ));
        assert!(is_valid_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w q - 0 1"
        ));
    }

    #[test]
    fn rejects_duplicate_or_misordered_castling_rights() {
        assert!(!is_valid_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KKkk - 0 1"
        ));
        assert!(!is_valid_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w qK - 0 1"
        ));
        assert!(!is_valid_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w  - 0 1"
        ));
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(!is_valid_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"
        ));
        assert!(!is_valid_fen(""));
    }

    #[test]
    fn decodes_starting_grid() {
        let grid = piece_grid(STARTING_FEN).unwrap();
        let e2 = grid[1][4].unwrap();
        assert_eq!(e2.kind, PieceKind::Pawn);
        assert_eq!(e2.color, Color::White);
        let e8 = grid[7][4].unwrap();
        assert_eq!(e8.kind, PieceKind::King);
        assert_eq!(e8.color, Color::Black);
        assert!(grid[3][3].is_none());
    }

    #[test]
    fn square_validity_helper() {
        assert!(assert_square_validity("e4").is_ok());
        assert!(assert_square_validity("z9").is_err());
    }
}
