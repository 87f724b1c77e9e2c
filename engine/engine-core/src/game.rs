//! Rules-engine contract consumed by the search.
//!
//! The search never inspects a position beyond this trait. Actions are
//! addressed in two spaces:
//!
//! * **global** ids in `0..action_space_size()`, the layout of the oracle's
//!   policy vector and of training targets
//! * **local** indices into `legal_actions()`, which is what search nodes
//!   store statistics against
//!
//! `legal_actions()` must return the same order every time it is called on
//! the same state, since that order defines the local indices.

use std::fmt::Debug;

/// Side to move in a two-player game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    First,
    Second,
}

impl Player {
    /// The other player.
    pub fn opponent(self) -> Self {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}

/// A game position as seen by the search.
///
/// Implementations should be cheap to clone; `apply_action` is called once
/// per expanded node and must not alias the receiver.
///
/// # Example
///
/// ```rust
/// use engine_core::GameState;
///
/// /// One pile of stones, take one or two, taking the last stone wins.
/// #[derive(Debug, Clone)]
/// struct Pile(u8);
///
/// impl GameState for Pile {
///     type Observation = Vec<f32>;
///
///     fn action_space_size(&self) -> usize {
///         2
///     }
///
///     fn legal_actions(&self) -> Vec<usize> {
///         (0..2).filter(|&a| a < self.0 as usize).collect()
///     }
///
///     fn apply_action(&self, local: usize) -> Self {
///         let take = self.legal_actions()[local] as u8 + 1;
///         Pile(self.0 - take)
///     }
///
///     fn is_terminal(&self) -> bool {
///         self.0 == 0
///     }
///
///     fn winner(&self) -> f32 {
///         // The previous mover took the last stone.
///         -1.0
///     }
///
///     fn observation(&self) -> Vec<f32> {
///         vec![self.0 as f32]
///     }
/// }
///
/// let start = Pile(3);
/// let next = start.apply_action(1);
/// assert_eq!(next.0, 1);
/// assert_eq!(start.0, 3);
/// ```
pub trait GameState: Clone + Debug {
    /// Oracle-ready encoding of a position (e.g. stacked feature planes).
    type Observation: Clone + Debug;

    /// Fixed size of the global action space (board cells, plus pass if any).
    fn action_space_size(&self) -> usize;

    /// Ordered global ids of the legal actions. Empty when terminal.
    fn legal_actions(&self) -> Vec<usize>;

    /// Apply the legal action at `local` (an index into `legal_actions()`)
    /// to a copy of this state and return the copy.
    fn apply_action(&self, local: usize) -> Self;

    /// Whether the game is over.
    fn is_terminal(&self) -> bool;

    /// Outcome of a finished game from the perspective of the player to move
    /// in this state: `1.0` won, `-1.0` lost, `0.0` drawn.
    ///
    /// Only meaningful when `is_terminal()` is true.
    fn winner(&self) -> f32;

    /// Encode this position for the policy/value oracle.
    fn observation(&self) -> Self::Observation;

    /// Player to move, when the game tracks it.
    ///
    /// Games where turns strictly alternate can leave this as `None`, in which
    /// case the search infers the mover from ply parity. Games with passes or
    /// multi-move turns must report it.
    fn to_play(&self) -> Option<Player> {
        None
    }
}
