//! Monte Carlo Tree Search (MCTS) with PUCT selection for AlphaZero-style
//! self-play.
//!
//! This crate provides a game-agnostic search that works with any game
//! implementing the `engine-core` [`GameState`](engine_core::GameState) trait.
//!
//! # Overview
//!
//! Each simulation consists of four phases:
//!
//! 1. **Selection**: Descend the tree by PUCT score,
//!    `w/n + c_puct * prior * sqrt(sum_n) / (1 + n)`, until an action
//!    without a child or a terminal node is reached
//! 2. **Expansion**: Apply that action to a copy of the parent state
//! 3. **Evaluation**: Score a terminal successor by its outcome, otherwise
//!    ask the [`Evaluator`] once for a prior and a value
//! 4. **Backpropagation**: Add the value to every edge on the path, signed
//!    for the player to move at each ancestor
//!
//! After search, the [`policy`] module picks the move to play and
//! [`SelfPlay`] strings searches together into a full game, recording a
//! [`TrainingSample`] per position.
//!
//! # Usage
//!
//! ```rust
//! use mcts::{GameRecord, MctsConfig, PlayMode, SelfPlay, UniformEvaluator};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let evaluator = UniformEvaluator::new();
//! let mut driver = SelfPlay::new(&evaluator, MctsConfig::for_testing());
//! let mut rng = ChaCha20Rng::seed_from_u64(42);
//!
//! let record: GameRecord<games_tictactoe::State> = driver
//!     .play(games_tictactoe::State::new(), PlayMode::SelfPlay, &mut rng)
//!     .unwrap();
//! assert_eq!(record.value_targets().len(), record.samples.len());
//! ```
//!
//! # Configuration
//!
//! The [`MctsConfig`] struct controls search behavior:
//!
//! - `num_simulations`: Number of simulations per move (default: 160)
//! - `c_puct`: Exploration constant for PUCT (default: 1.0)
//! - `temp_threshold`: Ply below which self-play samples its moves (default: 30)
//!
//! # Evaluators
//!
//! - [`UniformEvaluator`]: Returns uniform policy over legal moves (for testing)
//! - [`RolloutEvaluator`]: Uniform policy, value from a random playout
//! - Custom evaluators can wrap a trained network

pub mod config;
pub mod evaluator;
pub mod node;
pub mod policy;
pub mod search;
pub mod self_play;
pub mod tree;

#[cfg(test)]
mod testing;

// Re-export main types
pub use config::MctsConfig;
pub use evaluator::{EvalResult, Evaluator, EvaluatorError, RolloutEvaluator, UniformEvaluator};
pub use node::{NodeId, SearchNode};
pub use policy::choose_move;
pub use search::{
    run_mcts, select_action, MctsSearch, SearchError, SearchResult, SearchStats, Selection,
};
pub use self_play::{
    GameRecord, Mover, Opponent, PlayMode, SelfPlay, SelfPlayError, SelfPlayObserver,
    TrainingSample,
};
pub use tree::{MctsTree, TreeStats};
