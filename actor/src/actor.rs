//! Game runner: plays the configured number of games with the search driver

use anyhow::{anyhow, Result};
use engine_core::GameState;
use games_tictactoe::State;
use mcts::{
    Evaluator, GameRecord, MctsConfig, Mover, Opponent, PlayMode, RolloutEvaluator, SearchStats,
    SelfPlay, SelfPlayError, SelfPlayObserver, UniformEvaluator,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::io::{self, BufReader};
use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Arc,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::{Config, EvaluatorKind, OpponentKind};
use crate::opponent::{HumanOpponent, RandomOpponent};

/// Offset applied to the run seed for the opponent's own generator.
const OPPONENT_SEED_OFFSET: u64 = 0x5eed;

/// Aggregated search stats for one game.
#[derive(Debug, Default)]
struct GameStats {
    /// Number of searches performed
    pub search_count: u32,
    pub simulations: u32,
    pub evaluations: u32,
    pub terminal_hits: u32,
    /// Total wall-clock time across all searches (microseconds)
    pub total_time_us: u64,
    pub search_moves: u32,
    pub opponent_moves: u32,
}

impl SelfPlayObserver for GameStats {
    fn on_search(&mut self, ply: u32, stats: &SearchStats) {
        self.search_count += 1;
        self.simulations += stats.simulations;
        self.evaluations += stats.evaluations;
        self.terminal_hits += stats.terminal_hits;
        self.total_time_us += stats.total_time_us;
        debug!(
            ply,
            simulations = stats.simulations,
            expansions = stats.expansions,
            reused_visits = stats.reused_visits,
            time_us = stats.total_time_us,
            "search complete"
        );
    }

    fn on_move(&mut self, _ply: u32, _action: usize, mover: Mover) {
        match mover {
            Mover::Search => self.search_moves += 1,
            Mover::Opponent => self.opponent_moves += 1,
        }
    }
}

impl GameStats {
    fn log_summary(&self, game_num: u32) {
        if self.search_count == 0 {
            return;
        }

        let total_ms = self.total_time_us as f64 / 1000.0;
        let sims_per_sec = if self.total_time_us > 0 {
            self.simulations as f64 * 1_000_000.0 / self.total_time_us as f64
        } else {
            0.0
        };

        info!(
            game = game_num,
            searches = self.search_count,
            search_moves = self.search_moves,
            opponent_moves = self.opponent_moves,
            total_ms = format!("{:.1}", total_ms),
            sims_per_sec = format!("{:.0}", sims_per_sec),
            evaluations = self.evaluations,
            terminal_hits = self.terminal_hits,
            "MCTS game stats"
        );
    }
}

/// Result of a finished game, seen from the first player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    FirstWins,
    SecondWins,
    Draw,
}

impl Outcome {
    pub fn of<G: GameState>(record: &GameRecord<G>) -> Self {
        // The first sample is the starting position, moved by the first player
        let value = record.value_targets().first().copied().unwrap_or(0.0);
        if value > 0.0 {
            Outcome::FirstWins
        } else if value < 0.0 {
            Outcome::SecondWins
        } else {
            Outcome::Draw
        }
    }
}

/// Totals over every game in a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub games: u32,
    pub first_wins: u32,
    pub second_wins: u32,
    pub draws: u32,
    pub failed: u32,
    pub samples: usize,
    pub total_plies: u64,
}

impl RunSummary {
    fn record<G: GameState>(&mut self, record: &GameRecord<G>) -> Outcome {
        let outcome = Outcome::of(record);
        self.games += 1;
        self.samples += record.len();
        self.total_plies += record.final_ply as u64;
        match outcome {
            Outcome::FirstWins => self.first_wins += 1,
            Outcome::SecondWins => self.second_wins += 1,
            Outcome::Draw => self.draws += 1,
        }
        outcome
    }

    pub fn avg_game_length(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_plies as f64 / self.games as f64
        }
    }
}

pub struct Actor {
    config: Config,
    mcts_config: MctsConfig,
    opponent_kind: OpponentKind,
    evaluator: Box<dyn Evaluator<State>>,
    shutdown_signal: Arc<AtomicBool>,
    games_played: AtomicU32,
}

impl Actor {
    pub fn new(config: Config) -> Result<Self> {
        let opponent_kind = config.opponent_kind()?;
        let evaluator: Box<dyn Evaluator<State>> = match config.evaluator_kind()? {
            EvaluatorKind::Uniform => Box::new(UniformEvaluator::new()),
            EvaluatorKind::Rollout => {
                Box::new(RolloutEvaluator::new(config.rollout_depth, config.seed))
            }
        };
        let mcts_config = config.mcts_config();

        info!(
            evaluator = %config.evaluator,
            opponent = %config.opponent,
            num_simulations = mcts_config.num_simulations,
            c_puct = mcts_config.c_puct,
            temp_threshold = mcts_config.temp_threshold,
            "Actor initialized"
        );

        Ok(Self {
            config,
            mcts_config,
            opponent_kind,
            evaluator,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
            games_played: AtomicU32::new(0),
        })
    }

    pub fn games_played(&self) -> u32 {
        self.games_played.load(Ordering::Relaxed)
    }

    /// Abandon the game in progress, including a pending human prompt.
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown_signal.store(true, Ordering::Relaxed);
    }

    fn build_opponent(&self) -> Option<Box<dyn Opponent<State>>> {
        let seed = self.config.seed.wrapping_add(OPPONENT_SEED_OFFSET);
        match self.opponent_kind {
            OpponentKind::None => None,
            OpponentKind::Random => Some(Box::new(RandomOpponent::new(seed))),
            OpponentKind::Human => Some(Box::new(
                HumanOpponent::new(BufReader::new(io::stdin()), io::stdout(), seed)
                    .with_abort_flag(Arc::clone(&self.shutdown_signal)),
            )),
        }
    }

    /// Play games until the configured count is reached or shutdown is
    /// requested. A failing game is logged and skipped.
    pub fn run(&self) -> Result<RunSummary> {
        let mut rng = ChaCha20Rng::seed_from_u64(self.config.seed);
        let mut opponent = self.build_opponent();
        let mut summary = RunSummary::default();
        let start = Instant::now();

        loop {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                info!("Shutdown signal received, stopping");
                break;
            }

            let game_num = self.games_played.fetch_add(1, Ordering::Relaxed) + 1;
            if self.config.games > 0 && game_num > self.config.games {
                self.games_played.fetch_sub(1, Ordering::Relaxed);
                info!(games = self.config.games, "Reached game limit, stopping");
                break;
            }

            let mode = match opponent.as_deref_mut() {
                Some(opponent) => PlayMode::AgainstOpponent(opponent),
                None => PlayMode::SelfPlay,
            };

            let mut stats = GameStats::default();
            let result = SelfPlay::new(&*self.evaluator, self.mcts_config.clone())
                .with_abort_flag(Arc::clone(&self.shutdown_signal))
                .with_observer(&mut stats)
                .play(State::new(), mode, &mut rng);

            match result {
                Ok(record) => {
                    let outcome = summary.record(&record);
                    stats.log_summary(game_num);
                    info!(
                        game = game_num,
                        plies = record.final_ply,
                        samples = record.len(),
                        outcome = ?outcome,
                        "Game complete"
                    );
                    if self.opponent_kind == OpponentKind::Human {
                        println!("\n{}Result: {:?}", record.final_state, outcome);
                    }
                }
                Err(SelfPlayError::Aborted) => {
                    self.games_played.fetch_sub(1, Ordering::Relaxed);
                    warn!(game = game_num, "Game abandoned");
                    break;
                }
                Err(e) => {
                    error!(game = game_num, error = %e, "Game failed");
                    summary.failed += 1;
                    if summary.failed == game_num {
                        // Nothing has succeeded; the error will repeat
                        return Err(anyhow!("game {} failed: {}", game_num, e));
                    }
                }
            }
        }

        info!(
            games = summary.games,
            first_wins = summary.first_wins,
            second_wins = summary.second_wins,
            draws = summary.draws,
            failed = summary.failed,
            samples = summary.samples,
            avg_length = format!("{:.1}", summary.avg_game_length()),
            elapsed_s = format!("{:.2}", start.elapsed().as_secs_f64()),
            "Run finished"
        );

        Ok(summary)
    }
}
