//! Fixtures shared by the unit tests of this crate.

use std::sync::atomic::{AtomicUsize, Ordering};

use engine_core::GameState;

use crate::evaluator::{EvalResult, Evaluator, EvaluatorError, UniformEvaluator};

/// A game that ends after one move.
///
/// The start position has two legal moves with global ids 0 and 2 (id 1 is
/// never legal, so local and global indices differ). Local 0 ends the game
/// with outcome +1 for the side to move afterwards, local 1 with -1.
#[derive(Debug, Clone, PartialEq)]
pub enum TwoMoveGame {
    Start,
    Ended(f32),
}

impl GameState for TwoMoveGame {
    type Observation = Vec<f32>;

    fn action_space_size(&self) -> usize {
        3
    }

    fn legal_actions(&self) -> Vec<usize> {
        match self {
            TwoMoveGame::Start => vec![0, 2],
            TwoMoveGame::Ended(_) => Vec::new(),
        }
    }

    fn apply_action(&self, local: usize) -> Self {
        match (self, local) {
            (TwoMoveGame::Start, 0) => TwoMoveGame::Ended(1.0),
            (TwoMoveGame::Start, 1) => TwoMoveGame::Ended(-1.0),
            _ => self.clone(),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, TwoMoveGame::Ended(_))
    }

    fn winner(&self) -> f32 {
        match self {
            TwoMoveGame::Start => 0.0,
            TwoMoveGame::Ended(outcome) => *outcome,
        }
    }

    fn observation(&self) -> Self::Observation {
        vec![self.winner()]
    }
}

/// Uniform evaluator with a fixed value that counts its calls.
#[derive(Debug, Default)]
pub struct CountingEvaluator {
    pub value: f32,
    calls: AtomicUsize,
}

impl CountingEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: f32) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl<G: GameState> Evaluator<G> for CountingEvaluator {
    fn evaluate(&self, state: &G) -> Result<EvalResult, EvaluatorError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let uniform = UniformEvaluator::new().evaluate(state)?;
        Ok(EvalResult {
            policy: uniform.policy,
            value: self.value,
        })
    }
}

/// Evaluator that returns whatever it was built with.
#[derive(Debug, Clone)]
pub struct FixedEvaluator {
    pub policy: Vec<f32>,
    pub value: f32,
}

impl<G: GameState> Evaluator<G> for FixedEvaluator {
    fn evaluate(&self, _state: &G) -> Result<EvalResult, EvaluatorError> {
        Ok(EvalResult {
            policy: self.policy.clone(),
            value: self.value,
        })
    }
}
