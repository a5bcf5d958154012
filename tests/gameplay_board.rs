//! GamePlayChessboard tests: linear history, undo/redo, truncation,
//! illegal moves and the saved-game round trip.

use uci_bridge::{
    BoardError, Chessboard, EngineConfig, EngineProcess, GamePlayChessboard, Move, Square,
};

fn mock_config() -> EngineConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    EngineConfig::new(env!("CARGO_BIN_EXE_mock_engine"))
}

fn mock_engine() -> EngineProcess {
    mock_config().spawn().expect("mock engine must start")
}

fn board() -> GamePlayChessboard {
    GamePlayChessboard::new(mock_engine()).expect("board must attach")
}

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const AFTER_E2E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
const AFTER_E2E4_E7E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";

fn mv(s: &str) -> Move {
    s.parse().unwrap()
}

#[test]
fn initial_state_is_derived_from_engine() {
    let board = board();
    assert_eq!(board.current_fen().unwrap(), STARTPOS);
    assert_eq!(board.starting_fen().unwrap(), STARTPOS);
    assert_eq!(board.possible_moves().unwrap().len(), 20);
    assert_eq!(board.done_moves_count().unwrap(), 0);

    let e2: Square = "e2".parse().unwrap();
    assert!(board.piece_at(e2).unwrap().is_some());
    let from_e2 = board.possible_moves_for(e2).unwrap();
    assert_eq!(from_e2, vec![mv("e2e3"), mv("e2e4")]);
}

#[test]
fn perform_undo_redo_round_trip() {
    let mut board = board();

    board.perform_move(mv("e2e4")).unwrap();
    assert_eq!(board.current_fen().unwrap(), AFTER_E2E4);
    assert_eq!(board.done_moves_count().unwrap(), 1);

    board.undo().unwrap();
    assert_eq!(board.done_moves_count().unwrap(), 0);
    assert_eq!(board.current_fen().unwrap(), STARTPOS);

    board.redo().unwrap();
    assert_eq!(board.done_moves_count().unwrap(), 1);
    assert_eq!(board.current_fen().unwrap(), AFTER_E2E4);
}

#[test]
fn undo_at_start_and_redo_at_end_are_noops() {
    let mut board = board();
    board.undo().unwrap();
    assert_eq!(board.done_moves_count().unwrap(), 0);
    board.redo().unwrap();
    assert_eq!(board.done_moves_count().unwrap(), 0);
    assert_eq!(board.current_fen().unwrap(), STARTPOS);
}

#[test]
fn performing_after_undo_truncates_the_tail() {
    let mut board = board();
    board.perform_move(mv("e2e4")).unwrap();
    board.undo().unwrap();
    board.perform_move(mv("e2e3")).unwrap();

    assert_eq!(board.all_moves().unwrap(), &[mv("e2e3")]);
    assert_eq!(board.done_moves().unwrap(), vec![mv("e2e3")]);

    // The truncated branch is gone.
    board.undo().unwrap();
    board.redo().unwrap();
    assert_eq!(board.done_moves().unwrap(), vec![mv("e2e3")]);
}

#[test]
fn illegal_move_fails_and_leaves_state_untouched() {
    let mut board = board();
    let fen_before = board.current_fen().unwrap().to_string();
    let moves_before = board.possible_moves().unwrap().to_vec();
    let pieces_before = *board.pieces().unwrap();

    let err = board.perform_move(mv("e2e5")).unwrap_err();
    assert!(matches!(err, BoardError::IllegalMove { .. }));

    assert_eq!(board.current_fen().unwrap(), fen_before);
    assert_eq!(board.possible_moves().unwrap(), moves_before.as_slice());
    assert_eq!(*board.pieces().unwrap(), pieces_before);
    assert_eq!(board.done_moves_count().unwrap(), 0);
}

#[test]
fn reset_clears_history() {
    let mut board = board();
    board.perform_move(mv("e2e4")).unwrap();
    board.reset(STARTPOS).unwrap();

    assert_eq!(board.done_moves_count().unwrap(), 0);
    assert_eq!(board.all_moves().unwrap(), &[] as &[Move]);
    assert_eq!(board.current_fen().unwrap(), STARTPOS);
}

#[test]
fn reset_rejects_invalid_fen() {
    let mut board = board();
    board.perform_move(mv("e2e4")).unwrap();
    assert!(matches!(
        board.reset("garbage"),
        Err(BoardError::Fen(_))
    ));
    // Failed reset leaves the board alone.
    assert_eq!(board.current_fen().unwrap(), AFTER_E2E4);
}

#[test]
fn best_move_tracks_the_current_position() {
    let mut board = board();
    let hint = board.best_move(3).unwrap();
    assert!(board.possible_moves().unwrap().contains(&hint));

    board.perform_move(mv("e2e4")).unwrap();
    let hint = board.best_move(3).unwrap();
    assert!(board.possible_moves().unwrap().contains(&hint));
}

#[test]
fn configured_engine_options_are_applied_on_attach() {
    // The mock's BestMoveOverride option replaces its searched move, so a
    // board attached with it proves the recorded options went out.
    let engine = mock_config()
        .option("BestMoveOverride", "g1f3")
        .spawn()
        .unwrap();
    let board = GamePlayChessboard::new(engine).unwrap();
    assert_eq!(board.best_move(3).unwrap(), mv("g1f3"));
}

#[test]
fn saved_game_round_trips_including_undone_tail() {
    let mut board = board();
    board.perform_move(mv("e2e4")).unwrap();
    board.perform_move(mv("e7e5")).unwrap();
    board.undo().unwrap();

    let saved = board.save().unwrap();
    assert_eq!(saved.moves.len(), 2);
    assert_eq!(saved.done_count, 1);

    let mut restored = GamePlayChessboard::load(mock_engine(), &saved).unwrap();
    assert_eq!(restored.current_fen().unwrap(), AFTER_E2E4);
    assert_eq!(restored.done_moves_count().unwrap(), 1);
    assert_eq!(restored.all_moves().unwrap(), &[mv("e2e4"), mv("e7e5")]);

    restored.redo().unwrap();
    assert_eq!(restored.current_fen().unwrap(), AFTER_E2E4_E7E5);
}

#[test]
fn dispose_is_terminal_and_idempotent() {
    let mut board = board();
    board.dispose();
    board.dispose();
    assert!(board.is_disposed());

    assert!(matches!(board.current_fen(), Err(BoardError::Disposed)));
    assert!(matches!(board.possible_moves(), Err(BoardError::Disposed)));
    assert!(matches!(
        board.perform_move(mv("e2e4")),
        Err(BoardError::Disposed)
    ));
    assert!(matches!(board.undo(), Err(BoardError::Disposed)));
    assert!(matches!(board.redo(), Err(BoardError::Disposed)));
    assert!(matches!(board.best_move(1), Err(BoardError::Disposed)));
    assert!(matches!(board.save(), Err(BoardError::Disposed)));
    assert!(matches!(board.reset(STARTPOS), Err(BoardError::Disposed)));
}
