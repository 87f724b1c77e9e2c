//! Evaluator trait for position evaluation.
//!
//! The evaluator is the policy/value oracle: for a position it returns move
//! probabilities over the whole action space and a value estimate for the
//! player to move. A learned model plugs in here; the crate ships a uniform
//! evaluator and a random-rollout evaluator that need no model.

use std::sync::Mutex;

use engine_core::GameState;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

use crate::node::same_mover;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Policy has {actual} entries, action space has {expected}")]
    PolicyLength { expected: usize, actual: usize },

    #[error("Value {0} is outside [-1, 1]")]
    InvalidValue(f32),
}

/// Result of evaluating a game state.
#[derive(Debug, Clone)]
pub struct EvalResult {
    /// Policy: probability distribution over the global action space.
    /// Index i corresponds to action i. Illegal actions are ignored.
    pub policy: Vec<f32>,

    /// Value estimate for the player to move.
    /// Range: -1.0 (certain loss) to +1.0 (certain win).
    pub value: f32,
}

impl EvalResult {
    /// Check the result against the oracle contract for an action space of
    /// `action_space_size` entries.
    pub fn validate(self, action_space_size: usize) -> Result<Self, EvaluatorError> {
        if self.policy.len() != action_space_size {
            return Err(EvaluatorError::PolicyLength {
                expected: action_space_size,
                actual: self.policy.len(),
            });
        }
        if !self.value.is_finite() || self.value.abs() > 1.0 {
            return Err(EvaluatorError::InvalidValue(self.value));
        }
        Ok(self)
    }
}

/// Trait for position evaluators.
///
/// Implementations could be:
/// - UniformEvaluator: Returns uniform policy (for testing)
/// - RolloutEvaluator: Random rollouts to terminal state
/// - a neural network wrapper for training/play
pub trait Evaluator<G: GameState>: Send + Sync {
    /// Evaluate a single non-terminal position.
    ///
    /// # Returns
    /// Policy of length `state.action_space_size()` and a value estimate
    /// from the perspective of the player to move in `state`.
    fn evaluate(&self, state: &G) -> Result<EvalResult, EvaluatorError>;

    /// Evaluate and check the result against the oracle contract.
    fn evaluate_checked(&self, state: &G) -> Result<EvalResult, EvaluatorError> {
        self.evaluate(state)?.validate(state.action_space_size())
    }
}

impl<G: GameState, E: Evaluator<G> + ?Sized> Evaluator<G> for &E {
    fn evaluate(&self, state: &G) -> Result<EvalResult, EvaluatorError> {
        (**self).evaluate(state)
    }
}

impl<G: GameState, E: Evaluator<G> + ?Sized> Evaluator<G> for Box<E> {
    fn evaluate(&self, state: &G) -> Result<EvalResult, EvaluatorError> {
        (**self).evaluate(state)
    }
}

/// Uniform evaluator that assigns equal probability to all legal moves.
/// Value is always 0.0 (neutral). Useful for testing MCTS without a model.
#[derive(Debug, Clone, Default)]
pub struct UniformEvaluator;

impl UniformEvaluator {
    pub fn new() -> Self {
        Self
    }
}

/// Uniform distribution over `legal` within an action space of `size`.
fn uniform_policy(size: usize, legal: &[usize]) -> Vec<f32> {
    let mut policy = vec![0.0; size];
    if legal.is_empty() {
        return policy;
    }

    let prob = 1.0 / legal.len() as f32;
    for &action in legal {
        if let Some(slot) = policy.get_mut(action) {
            *slot = prob;
        }
    }
    policy
}

impl<G: GameState> Evaluator<G> for UniformEvaluator {
    fn evaluate(&self, state: &G) -> Result<EvalResult, EvaluatorError> {
        let policy = uniform_policy(state.action_space_size(), &state.legal_actions());
        Ok(EvalResult { policy, value: 0.0 })
    }
}

/// Random rollout evaluator that plays random moves to a terminal state.
/// Returns the game outcome, seen from the evaluated position, as the value
/// estimate and a uniform policy.
#[derive(Debug)]
pub struct RolloutEvaluator {
    /// Maximum rollout depth to prevent infinite games. Rollouts cut off at
    /// this depth score 0.0.
    pub max_depth: u32,

    rng: Mutex<ChaCha20Rng>,
}

impl Default for RolloutEvaluator {
    fn default() -> Self {
        Self::new(100, 0)
    }
}

impl RolloutEvaluator {
    pub fn new(max_depth: u32, seed: u64) -> Self {
        Self {
            max_depth,
            rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }

    fn rollout<G: GameState>(&self, state: &G) -> Result<f32, EvaluatorError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| EvaluatorError::EvaluationFailed("rollout rng poisoned".into()))?;

        let mut current = state.clone();
        let mut depth = 0;
        while !current.is_terminal() {
            if depth == self.max_depth {
                return Ok(0.0);
            }
            let num_legal = current.legal_actions().len();
            if num_legal == 0 {
                return Err(EvaluatorError::EvaluationFailed(
                    "non-terminal position without legal actions".into(),
                ));
            }
            current = current.apply_action(rng.gen_range(0..num_legal));
            depth += 1;
        }

        let outcome = current.winner();
        if same_mover(state.to_play(), current.to_play(), depth) {
            Ok(outcome)
        } else {
            Ok(-outcome)
        }
    }
}

impl<G: GameState> Evaluator<G> for RolloutEvaluator {
    fn evaluate(&self, state: &G) -> Result<EvalResult, EvaluatorError> {
        let policy = uniform_policy(state.action_space_size(), &state.legal_actions());
        let value = self.rollout(state)?;
        Ok(EvalResult { policy, value })
    }
}
