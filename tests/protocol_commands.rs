//! Protocol helper tests against the scripted mock engine.

use uci_bridge::{protocol, EngineConfig, EngineProcess, Move, ProtocolError};

fn mock_config() -> EngineConfig {
    let _ = env_logger::builder().is_test(true).try_init();
    EngineConfig::new(env!("CARGO_BIN_EXE_mock_engine"))
}

fn mock_engine() -> EngineProcess {
    mock_config().spawn().expect("mock engine must start")
}

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const AFTER_E2E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

fn mv(s: &str) -> Move {
    s.parse().unwrap()
}

#[test]
fn get_position_extracts_fen_line() {
    let engine = mock_engine();
    protocol::handshake(&engine).unwrap();

    protocol::set_position(&engine, STARTPOS, &[]).unwrap();
    assert_eq!(protocol::get_position(&engine).unwrap(), STARTPOS);

    protocol::set_position(&engine, STARTPOS, &[mv("e2e4")]).unwrap();
    assert_eq!(protocol::get_position(&engine).unwrap(), AFTER_E2E4);
}

#[test]
fn set_position_rejects_invalid_fen_locally() {
    let engine = mock_engine();
    let err = protocol::set_position(&engine, "definitely not fen", &[]).unwrap_err();
    assert!(matches!(err, ProtocolError::Fen(_)));
}

#[test]
fn get_all_moves_rating_collects_until_summary() {
    let engine = mock_engine();
    protocol::handshake(&engine).unwrap();
    protocol::set_position(&engine, STARTPOS, &[]).unwrap();

    let rated = protocol::get_all_moves_rating(&engine, 1).unwrap();
    assert_eq!(rated.len(), 20);
    assert!(rated.iter().any(|(m, _)| *m == mv("e2e4")));
    assert!(rated.iter().all(|(_, count)| *count > 0));
}

#[test]
fn get_best_move_returns_a_legal_move() {
    let engine = mock_engine();
    protocol::handshake(&engine).unwrap();
    protocol::set_position(&engine, STARTPOS, &[]).unwrap();

    let best = protocol::get_best_move(&engine, 3).unwrap();
    let legal: Vec<Move> = protocol::get_all_moves_rating(&engine, 1)
        .unwrap()
        .into_iter()
        .map(|(m, _)| m)
        .collect();
    assert!(legal.contains(&best));
}

#[test]
fn options_are_fire_and_forget() {
    let engine = mock_engine();
    protocol::handshake(&engine).unwrap();
    protocol::set_option(&engine, "Hash", "16").unwrap();
    protocol::set_options(&engine, [("Threads", "1"), ("MultiPV", "2")]).unwrap();
    // The engine must still be in sync afterwards.
    protocol::wait_for_ready(&engine).unwrap();
}

#[test]
fn configured_options_reach_the_engine() {
    // The mock's BestMoveOverride option replaces its searched move, which
    // makes the applied options observable from this side of the pipe.
    let engine = mock_config()
        .option("BestMoveOverride", "g1f3")
        .spawn()
        .unwrap();
    protocol::handshake(&engine).unwrap();
    protocol::apply_configured_options(&engine).unwrap();
    protocol::wait_for_ready(&engine).unwrap();

    protocol::set_position(&engine, STARTPOS, &[]).unwrap();
    assert_eq!(protocol::get_best_move(&engine, 3).unwrap(), mv("g1f3"));
}

#[test]
fn new_game_keeps_the_session_usable() {
    let engine = mock_engine();
    protocol::handshake(&engine).unwrap();
    protocol::new_game(&engine).unwrap();
    protocol::wait_for_ready(&engine).unwrap();
    protocol::set_position(&engine, STARTPOS, &[]).unwrap();
    assert_eq!(protocol::get_position(&engine).unwrap(), STARTPOS);
}
