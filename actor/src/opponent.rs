//! Opponents for games that are not pure self-play.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use engine_core::{GameState, MoveInput};
use games_tictactoe::State;
use mcts::Opponent;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::{debug, warn};

/// How often a waiting prompt checks the abort flag.
const ABORT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Plays a uniformly random legal move.
pub struct RandomOpponent {
    rng: ChaCha20Rng,
}

impl RandomOpponent {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl<G: GameState> Opponent<G> for RandomOpponent {
    fn select_move(&mut self, state: &G) -> Option<usize> {
        let num_legal = state.legal_actions().len();
        if num_legal == 0 {
            // Out of range for the driver, which reports it as illegal
            return Some(0);
        }
        Some(self.rng.gen_range(0..num_legal))
    }
}

/// What a prompt produced.
enum Reply {
    Line(String),
    Closed,
    Aborted,
}

/// Reads moves as `row col` from a text stream, re-prompting on bad input.
///
/// Lines are read on a helper thread so a pending prompt can be abandoned
/// when the abort flag is raised. `random` plays a random legal move. Once
/// the input is closed every later move is random.
pub struct HumanOpponent<W> {
    lines: Receiver<io::Result<String>>,
    output: W,
    fallback: RandomOpponent,
    abort: Option<Arc<AtomicBool>>,
    closed: bool,
}

fn read_lines<R: BufRead>(mut input: R, lines: Sender<io::Result<String>>) {
    loop {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if lines.send(Ok(line)).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = lines.send(Err(e));
                break;
            }
        }
    }
}

impl<W: Write> HumanOpponent<W> {
    pub fn new<R: BufRead + Send + 'static>(input: R, output: W, seed: u64) -> Self {
        let (sender, lines) = mpsc::channel();
        thread::spawn(move || read_lines(input, sender));

        Self {
            lines,
            output,
            fallback: RandomOpponent::new(seed),
            abort: None,
            closed: false,
        }
    }

    /// Give up a pending prompt once `flag` is set.
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    fn aborted(&self) -> bool {
        self.abort
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn prompt(&mut self, state: &State) -> Reply {
        // Terminal output is best effort; a broken pipe must not end the game
        let _ = write!(self.output, "\n{}Your move (row col, or random): ", state);
        let _ = self.output.flush();

        loop {
            if self.aborted() {
                return Reply::Aborted;
            }
            match self.lines.recv_timeout(ABORT_POLL_INTERVAL) {
                Ok(Ok(line)) => return Reply::Line(line),
                Ok(Err(e)) => {
                    warn!("Failed to read move: {}", e);
                    return Reply::Closed;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Reply::Closed,
            }
        }
    }
}

impl<W: Write> Opponent<State> for HumanOpponent<W> {
    fn select_move(&mut self, state: &State) -> Option<usize> {
        while !self.closed {
            let line = match self.prompt(state) {
                Reply::Line(line) => line,
                Reply::Aborted => {
                    debug!("Move prompt abandoned");
                    return None;
                }
                Reply::Closed => {
                    warn!("Move input closed, playing random moves");
                    self.closed = true;
                    break;
                }
            };

            if line.trim() == "random" {
                break;
            }

            match state.parse_move(&line) {
                MoveInput::Parsed(local) => return Some(local),
                MoveInput::InvalidInput(reason) => {
                    let _ = writeln!(self.output, "Invalid move: {}", reason);
                }
            }
        }

        self.fallback.select_move(state)
    }
}
