//! UCI protocol helpers.
//!
//! Stateless functions that compose specific engine commands and parse the
//! matching response lines, built only on [`EngineProcess`]. Caller input
//! is validated locally before anything reaches the wire; every response
//! wait is bounded by the process's exchange timeout.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use crate::board::error::FenError;
use crate::board::fen::assert_fen_validity;
use crate::board::types::Move;
use crate::process::{EngineError, EngineProcess};

/// Error type for protocol exchanges.
#[derive(Debug, Clone)]
pub enum ProtocolError {
    /// Caller-supplied FEN rejected before any I/O
    Fen(FenError),
    /// The underlying process failed (spawn, write, termination, timeout)
    Engine(EngineError),
    /// The engine answered, but the expected payload could not be parsed
    MalformedResponse { command: String, line: String },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Fen(e) => write!(f, "Invalid FEN: {e}"),
            ProtocolError::Engine(e) => write!(f, "{e}"),
            ProtocolError::MalformedResponse { command, line } => {
                write!(f, "Malformed response to '{command}': '{line}'")
            }
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Fen(e) => Some(e),
            ProtocolError::Engine(e) => Some(e),
            ProtocolError::MalformedResponse { .. } => None,
        }
    }
}

impl From<FenError> for ProtocolError {
    fn from(e: FenError) -> Self {
        ProtocolError::Fen(e)
    }
}

impl From<EngineError> for ProtocolError {
    fn from(e: EngineError) -> Self {
        ProtocolError::Engine(e)
    }
}

/// One enumerated root move with its node count, e.g. `e2e4: 20`.
static PERFT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-h][1-8][a-h][1-8][nbrq]?): (\d+)$").expect("perft line regex is valid")
});

/// Perform the `uci` handshake, waiting for `uciok`.
pub fn handshake(engine: &EngineProcess) -> Result<(), ProtocolError> {
    engine.exchange("uci", |line| line != "uciok")?;
    Ok(())
}

/// Probe readiness with `isready`, waiting for `readyok`.
pub fn wait_for_ready(engine: &EngineProcess) -> Result<(), ProtocolError> {
    engine.exchange("isready", |line| line != "readyok")?;
    Ok(())
}

/// Signal the start of a new game. Fire and forget.
pub fn new_game(engine: &EngineProcess) -> Result<(), ProtocolError> {
    engine.send_serialized("ucinewgame")?;
    Ok(())
}

/// Set a single engine option. Fire and forget.
pub fn set_option(engine: &EngineProcess, name: &str, value: &str) -> Result<(), ProtocolError> {
    engine.send_serialized(&format!("setoption name {name} value {value}"))?;
    Ok(())
}

/// Set several engine options in order.
pub fn set_options<'a, I>(engine: &EngineProcess, options: I) -> Result<(), ProtocolError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    for (name, value) in options {
        set_option(engine, name, value)?;
    }
    Ok(())
}

/// Apply every option recorded on the process's configuration, in
/// recording order.
pub fn apply_configured_options(engine: &EngineProcess) -> Result<(), ProtocolError> {
    let options = engine.configured_options();
    set_options(engine, options.iter().map(|(n, v)| (n.as_str(), v.as_str())))
}

/// Push a base position plus the moves already applied to it. The engine,
/// not this layer, maintains the resulting board.
pub fn set_position(
    engine: &EngineProcess,
    fen: &str,
    moves: &[Move],
) -> Result<(), ProtocolError> {
    assert_fen_validity(fen)?;

    let mut command = format!("position fen {fen}");
    if !moves.is_empty() {
        command.push_str(" moves");
        for mv in moves {
            command.push(' ');
            command.push_str(&mv.to_string());
        }
    }
    engine.send_serialized(&command)?;
    Ok(())
}

/// Ask the engine to show its current board and extract the FEN from the
/// `Fen: ` line.
pub fn get_position(engine: &EngineProcess) -> Result<String, ProtocolError> {
    let found: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&found);

    engine.exchange("d", move |line| {
        if let Some(fen) = line.strip_prefix("Fen: ") {
            *sink.lock() = Some(fen.trim().to_string());
            return false;
        }
        true
    })?;

    let fen = found.lock().take().ok_or_else(|| ProtocolError::MalformedResponse {
        command: "d".to_string(),
        line: String::new(),
    })?;
    assert_fen_validity(&fen)?;
    Ok(fen)
}

/// Run a depth-bounded search and return the move from the `bestmove` line.
pub fn get_best_move(engine: &EngineProcess, depth: u32) -> Result<Move, ProtocolError> {
    let command = format!("go depth {depth}");
    let found: Arc<Mutex<Option<Result<Move, String>>>> = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&found);

    engine.exchange(&command, move |line| {
        if let Some(rest) = line.strip_prefix("bestmove ") {
            let token = rest.split_whitespace().next().unwrap_or_default();
            *sink.lock() = Some(token.parse::<Move>().map_err(|_| line.to_string()));
            return false;
        }
        true
    })?;

    let outcome = found.lock().take();
    match outcome {
        Some(Ok(mv)) => Ok(mv),
        Some(Err(line)) => Err(ProtocolError::MalformedResponse { command, line }),
        None => Err(ProtocolError::MalformedResponse {
            command,
            line: String::new(),
        }),
    }
}

/// Enumerate the legal root moves with their perft node counts.
///
/// Accumulates `<move>: <count>` pairs until the `Nodes searched:` summary
/// line. The chessboards use only the move keys; the counts are exposed
/// for callers that want them.
pub fn get_all_moves_rating(
    engine: &EngineProcess,
    depth: u32,
) -> Result<Vec<(Move, u64)>, ProtocolError> {
    let command = format!("go perft {depth}");
    let collected: Arc<Mutex<Vec<(Move, u64)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);

    engine.exchange(&command, move |line| {
        if line.starts_with("Nodes searched:") {
            return false;
        }
        if let Some(caps) = PERFT_LINE.captures(line) {
            let mv = caps[1].parse::<Move>();
            let count = caps[2].parse::<u64>();
            if let (Ok(mv), Ok(count)) = (mv, count) {
                sink.lock().push((mv, count));
            }
        }
        true
    })?;

    let moves = std::mem::take(&mut *collected.lock());
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perft_line_shapes() {
        assert!(PERFT_LINE.is_match("e2e4: 20"));
        assert!(PERFT_LINE.is_match("e7e8q: 1"));
        assert!(!PERFT_LINE.is_match("Nodes searched: 400"));
        assert!(!PERFT_LINE.is_match("info depth 1"));
        assert!(!PERFT_LINE.is_match("e2e4:20"));
    }

    #[test]
    fn set_position_rejects_bad_fen_before_io() {
        // Never started: a validation failure must win over any I/O error.
        let engine = EngineProcess::new(crate::process::EngineConfig::new("unused"));
        let err = set_position(&engine, "not a fen", &[]).unwrap_err();
        assert!(matches!(err, ProtocolError::Fen(_)));
    }
}
