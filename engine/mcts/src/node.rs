//! Search tree node representation.
//!
//! Each node owns one game position and the statistics of the edges leaving
//! it. Edge statistics live on the parent, in arrays indexed by the node's
//! *local* action index (position in `actions`), not by global action id.

use engine_core::{GameState, Player};
use rand::Rng;

/// Scale of the random visit-count seed given to every edge.
///
/// Keeps `n[a]` strictly positive so `w[a] / n[a]` is always defined, and is
/// small enough to vanish after the first real visit.
pub const VISIT_JITTER: f32 = 1e-10;

/// Whether the same player is to move in two positions `distance` plies
/// apart.
///
/// Uses the reported players when both are known and falls back to ply
/// parity otherwise.
#[inline]
pub fn same_mover(a: Option<Player>, b: Option<Player>, distance: u32) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => distance % 2 == 0,
    }
}

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode<G> {
    /// Position at this node, exclusively owned.
    pub state: G,

    /// Parent node and the local action that led here. `None` for the root.
    pub parent: Option<(NodeId, usize)>,

    /// Expanded children as (local action, NodeId) pairs.
    pub children: Vec<(usize, NodeId)>,

    /// Global ids of the legal actions, in the state's order.
    pub actions: Vec<usize>,

    /// Accumulated value per local action (`w`).
    pub w: Vec<f32>,

    /// Visit count per local action (`n`), seeded with jitter.
    pub n: Vec<f32>,

    /// Oracle prior per local action. 1.0 until the node is evaluated.
    pub prior: Vec<f32>,

    /// Whether the oracle has been queried for this node.
    pub evaluated: bool,

    /// Passes through this node during backpropagation, starting at 1.
    pub sum_n: u32,

    /// Plies from the start of the game.
    pub ply: u32,

    /// Cached `state.is_terminal()`.
    pub terminal: bool,

    /// Cached `state.to_play()`.
    pub to_play: Option<Player>,
}

impl<G: GameState> SearchNode<G> {
    /// Create a node with fresh statistics for `state`.
    pub fn new<R: Rng + ?Sized>(
        state: G,
        parent: Option<(NodeId, usize)>,
        ply: u32,
        rng: &mut R,
    ) -> Self {
        let actions = state.legal_actions();
        let k = actions.len();
        let n = (0..k)
            .map(|_| (1.0 + rng.gen::<f32>()) * VISIT_JITTER)
            .collect();
        let terminal = state.is_terminal();
        let to_play = state.to_play();

        Self {
            state,
            parent,
            children: Vec::new(),
            actions,
            w: vec![0.0; k],
            n,
            prior: vec![1.0; k],
            evaluated: false,
            sum_n: 1,
            ply,
            terminal,
            to_play,
        }
    }

    /// Number of legal actions at this node.
    #[inline]
    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    /// Child reached by the local `action`, if it has been expanded.
    #[inline]
    pub fn child(&self, action: usize) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, id)| *id)
    }

    /// Store the oracle policy restricted to this node's legal actions.
    ///
    /// `policy` is indexed by global action id. The restricted prior is not
    /// re-normalised.
    pub fn set_prior(&mut self, policy: &[f32]) {
        self.prior = self
            .actions
            .iter()
            .map(|&a| policy.get(a).copied().unwrap_or(0.0))
            .collect();
        self.evaluated = true;
    }

    /// Mean value `w[a] / n[a]` of a local action.
    #[inline]
    pub fn mean_value(&self, action: usize) -> f32 {
        self.w[action] / self.n[action]
    }

    /// PUCT score of a local action.
    ///
    /// `score(a) = w[a]/n[a] + c_puct * prior[a] * sqrt(sum_n) / (1 + n[a])`
    ///
    /// Takes pre-computed `sqrt(sum_n)` so callers scoring every action only
    /// take the root once.
    #[inline]
    pub fn puct_score(&self, action: usize, sum_n_sqrt: f32, c_puct: f32) -> f32 {
        let u = c_puct * self.prior[action] * sum_n_sqrt / (1.0 + self.n[action]);
        self.mean_value(action) + u
    }

    /// Total visit mass over all local actions.
    pub fn total_visits(&self) -> f32 {
        self.n.iter().sum()
    }

    /// Visit count distribution over local actions.
    /// Empty if the node has no legal actions.
    pub fn visit_distribution(&self) -> Vec<f32> {
        let total = self.total_visits();
        if total <= 0.0 {
            return vec![0.0; self.num_actions()];
        }
        self.n.iter().map(|&v| v / total).collect()
    }

    /// Visit distribution scattered into the global action space (for
    /// training targets). Zero everywhere except at legal actions.
    pub fn target_policy(&self) -> Vec<f32> {
        let mut policy = vec![0.0; self.state.action_space_size()];
        for (&action, p) in self.actions.iter().zip(self.visit_distribution()) {
            policy[action] = p;
        }
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TwoMoveGame;
    use games_tictactoe::State;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn root() -> SearchNode<State> {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        SearchNode::new(State::new(), None, 0, &mut rng)
    }

    #[test]
    fn test_new_node_statistics() {
        let node = root();

        assert!(node.parent.is_none());
        assert_eq!(node.num_actions(), 9);
        assert_eq!(node.sum_n, 1);
        assert_eq!(node.ply, 0);
        assert!(!node.evaluated);
        assert!(!node.terminal);
        assert!(node.children.is_empty());
        assert!(node.w.iter().all(|&w| w == 0.0));
        assert!(node.prior.iter().all(|&p| p == 1.0));
    }

    #[test]
    fn test_visit_jitter_is_positive_and_tiny() {
        let node = root();
        for &n in &node.n {
            assert!(n > 0.0);
            assert!(n >= VISIT_JITTER && n <= 2.0 * VISIT_JITTER);
        }
    }

    #[test]
    fn test_terminal_node_has_no_actions() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let node = SearchNode::new(TwoMoveGame::Ended(1.0), None, 1, &mut rng);
        assert!(node.terminal);
        assert_eq!(node.num_actions(), 0);
        assert!(node.visit_distribution().is_empty());
        assert_eq!(node.target_policy(), vec![0.0; 3]);
    }

    #[test]
    fn test_set_prior_restricts_to_legal_actions() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut node = SearchNode::new(TwoMoveGame::Start, None, 0, &mut rng);

        // Legal global ids are 0 and 2
        node.set_prior(&[0.2, 0.5, 0.3]);
        assert_eq!(node.prior, vec![0.2, 0.3]);
        assert!(node.evaluated);
    }

    #[test]
    fn test_puct_score() {
        let mut node = root();
        node.prior[0] = 0.5;
        node.n[0] = 10.0;
        node.w[0] = 5.0;

        // 0.5 + 1.0 * 0.5 * 10 / 11 = 0.9545...
        let score = node.puct_score(0, 100f32.sqrt(), 1.0);
        assert!((score - 0.9545).abs() < 1e-3);
    }

    #[test]
    fn test_target_policy_is_normalised() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut node = SearchNode::new(TwoMoveGame::Start, None, 0, &mut rng);
        node.n[0] += 3.0;
        node.n[1] += 1.0;

        let policy = node.target_policy();
        assert_eq!(policy.len(), 3);
        assert_eq!(policy[1], 0.0);
        assert!((policy[0] - 0.75).abs() < 1e-6);
        assert!((policy[2] - 0.25).abs() < 1e-6);
        assert!((policy.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_mover() {
        assert!(same_mover(None, None, 0));
        assert!(!same_mover(None, None, 1));
        assert!(same_mover(Some(Player::First), None, 2));
        // Reported players win over parity
        assert!(same_mover(Some(Player::First), Some(Player::First), 1));
        assert!(!same_mover(Some(Player::First), Some(Player::Second), 2));
    }

    #[test]
    fn test_child_lookup() {
        let mut node = root();
        assert_eq!(node.child(3), None);
        node.children.push((3, NodeId(1)));
        assert_eq!(node.child(3), Some(NodeId(1)));
    }
}
