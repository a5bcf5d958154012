//! Scripted UCI engine used by the integration tests.
//!
//! Speaks just enough of the protocol to stand in for a real engine:
//! handshake, readiness probe, `setoption`,
//! `position`/`d`/`go perft`/`go depth`/`go movetime`. The chess knowledge
//! is a small table of positions around the standard starting position;
//! unknown commands are ignored, like a real engine ignores noise on its
//! input. Two scripted hooks exist for the tests: the `BestMoveOverride`
//! option replaces the searched move, and `go movetime <ms>` really sleeps
//! before answering.

use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

struct MockPosition {
    fen: &'static str,
    legal: &'static [&'static str],
    /// (move, index of the resulting position)
    transitions: &'static [(&'static str, usize)],
}

const WHITE_FIRST_MOVES: &[&str] = &[
    "a2a3", "b2b3", "c2c3", "d2d3", "e2e3", "f2f3", "g2g3", "h2h3", "a2a4", "b2b4", "c2c4",
    "d2d4", "e2e4", "f2f4", "g2g4", "h2h4", "b1a3", "b1c3", "g1f3", "g1h3",
];

const BLACK_FIRST_MOVES: &[&str] = &[
    "a7a6", "b7b6", "c7c6", "d7d6", "e7e6", "f7f6", "g7g6", "h7h6", "a7a5", "b7b5", "c7c5",
    "d7d5", "e7e5", "f7f5", "g7g5", "h7h5", "b8a6", "b8c6", "g8f6", "g8h6",
];

const OPEN_GAME_WHITE_MOVES: &[&str] = &[
    "a2a3", "b2b3", "c2c3", "d2d3", "f2f3", "g2g3", "h2h3", "a2a4", "b2b4", "c2c4", "d2d4",
    "f2f4", "g2g4", "h2h4", "b1a3", "b1c3", "g1f3", "g1h3", "g1e2", "f1e2", "f1d3", "f1c4",
    "f1b5", "f1a6", "d1e2", "d1f3", "d1g4", "d1h5", "e1e2",
];

static POSITIONS: &[MockPosition] = &[
    MockPosition {
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        legal: WHITE_FIRST_MOVES,
        transitions: &[("e2e4", 1), ("e2e3", 2)],
    },
    MockPosition {
        fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        legal: BLACK_FIRST_MOVES,
        transitions: &[("e7e5", 3)],
    },
    MockPosition {
        fen: "rnbqkbnr/pppppppp/8/8/8/4P3/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
        legal: BLACK_FIRST_MOVES,
        transitions: &[],
    },
    MockPosition {
        fen: "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
        legal: OPEN_GAME_WHITE_MOVES,
        transitions: &[],
    },
];

fn resolve(base_fen: &str, moves: &[&str]) -> usize {
    let mut current = POSITIONS
        .iter()
        .position(|p| p.fen == base_fen)
        .unwrap_or(0);
    for mv in moves {
        match POSITIONS[current]
            .transitions
            .iter()
            .find(|(m, _)| m == mv)
        {
            Some(&(_, next)) => current = next,
            None => eprintln!("mock_engine: no scripted transition for {mv}"),
        }
    }
    current
}

/// Expected shape: name <name> value <value>.
fn parse_setoption(rest: &str) -> Option<(String, String)> {
    let rest = rest.strip_prefix("name ")?;
    let (name, value) = rest.split_once(" value ")?;
    Some((name.trim().to_string(), value.trim().to_string()))
}

fn parse_position(rest: &str) -> usize {
    // Expected shape: fen <6 fields> [moves <move>...]
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    if tokens.first() != Some(&"fen") || tokens.len() < 7 {
        return 0;
    }
    let fen = tokens[1..7].join(" ");
    let moves = match tokens.get(7) {
        Some(&"moves") => &tokens[8..],
        _ => &[][..],
    };
    resolve(&fen, moves)
}

fn main() {
    println!("Mock UCI engine for uci_bridge tests");

    let stdin = io::stdin();
    let mut current = 0usize;
    let mut options: Vec<(String, String)> = Vec::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((c, r)) => (c, r),
            None => (line, ""),
        };

        match command {
            "uci" => {
                println!("id name mock_engine");
                println!("id author uci_bridge tests");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "setoption" => match parse_setoption(rest) {
                Some(option) => options.push(option),
                None => eprintln!("mock_engine: malformed setoption '{rest}'"),
            },
            "ucinewgame" | "stop" => {}
            "position" => current = parse_position(rest),
            "d" => {
                let pos = &POSITIONS[current];
                println!();
                println!("(board diagram omitted)");
                println!("Fen: {}", pos.fen);
                println!("Checkers: ");
            }
            "go" => {
                let pos = &POSITIONS[current];
                if rest.starts_with("perft") {
                    for mv in pos.legal {
                        println!("{mv}: 1");
                    }
                    println!();
                    println!("Nodes searched: {}", pos.legal.len());
                } else {
                    if let Some(ms) = rest
                        .strip_prefix("movetime ")
                        .and_then(|ms| ms.trim().parse::<u64>().ok())
                    {
                        thread::sleep(Duration::from_millis(ms));
                    }
                    let scripted = options
                        .iter()
                        .rev()
                        .find(|(name, _)| name == "BestMoveOverride")
                        .map(|(_, value)| value.as_str());
                    println!("info depth 1 score cp 0");
                    println!(
                        "bestmove {}",
                        scripted.unwrap_or_else(|| pos.legal.first().copied().unwrap_or("0000"))
                    );
                }
            }
            "quit" => break,
            _ => eprintln!("mock_engine: unknown command '{line}'"),
        }
    }
}
