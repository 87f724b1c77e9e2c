//! MCTS search implementation.
//!
//! Implements the core MCTS algorithm:
//! 1. Selection: descend with PUCT until an unexpanded action or a terminal
//!    node is reached
//! 2. Expansion: apply the action to a copy of the parent state
//! 3. Evaluation: terminal successors score their game outcome, others are
//!    sent to the evaluator exactly once
//! 4. Backpropagation: update edge statistics along the path to the root

use std::time::Instant;

use engine_core::GameState;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::MctsConfig;
use crate::evaluator::{Evaluator, EvaluatorError};
use crate::node::{NodeId, SearchNode};
use crate::policy::argmax_visits;
use crate::tree::MctsTree;

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("Non-terminal position has no legal actions")]
    NoLegalActions,
}

/// Where a selection descent stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// `action` (local to `node`) has no child yet.
    Expand { node: NodeId, action: usize },

    /// The descent reached a terminal node.
    Terminal(NodeId),
}

/// Counters collected while searching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub simulations: u32,
    pub expansions: u32,
    pub evaluations: u32,
    pub terminal_hits: u32,
    /// Root visits inherited from earlier searches on the same subtree.
    pub reused_visits: u32,
    pub total_time_us: u64,
}

/// Result of a standalone search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Most visited action, as a global action id
    pub action: usize,

    /// Policy distribution over the global action space (visit counts normalized)
    pub policy: Vec<f32>,

    /// Value estimate at root for the player to move
    pub value: f32,

    /// Search counters
    pub stats: SearchStats,
}

/// Local action with the highest PUCT score at `node`.
///
/// Ties resolve to the lowest local index. Returns `None` when the node has
/// no legal actions.
pub fn select_action<G: GameState>(node: &SearchNode<G>, c_puct: f32) -> Option<usize> {
    let sum_n_sqrt = (node.sum_n as f32).sqrt();

    let mut best: Option<(usize, f32)> = None;
    for action in 0..node.num_actions() {
        let score = node.puct_score(action, sum_n_sqrt, c_puct);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((action, score)),
        }
    }

    best.map(|(action, _)| action)
}

/// MCTS search over a borrowed tree.
///
/// The tree outlives the search so the driver can keep the subtree below the
/// chosen move for the next search.
pub struct MctsSearch<'a, G: GameState, E: Evaluator<G> + ?Sized> {
    tree: &'a mut MctsTree<G>,
    evaluator: &'a E,
    config: &'a MctsConfig,
    stats: SearchStats,
}

impl<'a, G: GameState, E: Evaluator<G> + ?Sized> MctsSearch<'a, G, E> {
    pub fn new(tree: &'a mut MctsTree<G>, evaluator: &'a E, config: &'a MctsConfig) -> Self {
        Self {
            tree,
            evaluator,
            config,
            stats: SearchStats::default(),
        }
    }

    /// Run the configured number of simulations from the tree root.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<SearchStats, SearchError> {
        let start = Instant::now();
        let root = self.tree.root();
        self.stats.reused_visits = self.tree.get(root).sum_n - 1;

        self.ensure_evaluated(root)?;

        if !self.tree.get(root).terminal {
            for _ in 0..self.config.num_simulations {
                self.simulate(rng)?;
            }
        }

        self.stats.total_time_us = start.elapsed().as_micros() as u64;

        let tree_stats = self.tree.stats();
        debug!(
            simulations = self.stats.simulations,
            expansions = self.stats.expansions,
            evaluations = self.stats.evaluations,
            terminal_hits = self.stats.terminal_hits,
            reused_visits = self.stats.reused_visits,
            tree_size = tree_stats.total_nodes,
            root_visits = tree_stats.root_visits,
            max_depth = tree_stats.max_depth,
            time_us = self.stats.total_time_us,
            "MCTS search complete"
        );

        Ok(self.stats.clone())
    }

    /// Run a single simulation (select -> expand -> evaluate -> backpropagate).
    /// Returns the leaf value that was backpropagated.
    pub fn simulate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<f32, SearchError> {
        let (leaf_id, value) = match self.select()? {
            Selection::Terminal(id) => {
                self.stats.terminal_hits += 1;
                (id, self.tree.get(id).state.winner())
            }
            Selection::Expand { node, action } => self.expand(node, action, rng)?,
        };

        self.tree.backpropagate(leaf_id, value);
        self.stats.simulations += 1;

        trace!(
            leaf = leaf_id.0,
            ply = self.tree.get(leaf_id).ply,
            value = value,
            "MCTS simulation complete"
        );

        Ok(value)
    }

    /// Descend from the root by PUCT score.
    pub fn select(&self) -> Result<Selection, SearchError> {
        let mut current = self.tree.root();

        loop {
            let node = self.tree.get(current);

            if node.terminal {
                return Ok(Selection::Terminal(current));
            }

            let action =
                select_action(node, self.config.c_puct).ok_or(SearchError::NoLegalActions)?;

            match node.child(action) {
                Some(child_id) => current = child_id,
                None => {
                    return Ok(Selection::Expand {
                        node: current,
                        action,
                    })
                }
            }
        }
    }

    /// Create the child of `parent_id` for the local `action`.
    ///
    /// The successor is evaluated before it is inserted, so a failing
    /// evaluator leaves the tree untouched. Returns the new child and its
    /// value for the player to move there.
    pub fn expand<R: Rng + ?Sized>(
        &mut self,
        parent_id: NodeId,
        action: usize,
        rng: &mut R,
    ) -> Result<(NodeId, f32), SearchError> {
        let state = self.tree.get(parent_id).state.apply_action(action);

        let (value, policy) = if state.is_terminal() {
            (state.winner(), None)
        } else {
            let eval = self.evaluator.evaluate_checked(&state)?;
            self.stats.evaluations += 1;
            (eval.value, Some(eval.policy))
        };

        let child_id = self.tree.add_child(parent_id, action, state, rng);
        if let Some(policy) = policy {
            self.tree.get_mut(child_id).set_prior(&policy);
        }
        self.stats.expansions += 1;

        Ok((child_id, value))
    }

    /// Child of `parent_id` for `action`, expanding it if the search never
    /// did. A freshly expanded child is not backpropagated.
    pub fn child_or_expand<R: Rng + ?Sized>(
        &mut self,
        parent_id: NodeId,
        action: usize,
        rng: &mut R,
    ) -> Result<NodeId, SearchError> {
        match self.tree.get(parent_id).child(action) {
            Some(child_id) => Ok(child_id),
            None => self.expand(parent_id, action, rng).map(|(child_id, _)| child_id),
        }
    }

    /// Query the evaluator for the prior of a node that never had one.
    pub fn ensure_evaluated(&mut self, node_id: NodeId) -> Result<(), SearchError> {
        let node = self.tree.get(node_id);
        if node.evaluated || node.terminal {
            return Ok(());
        }

        let eval = self.evaluator.evaluate_checked(&node.state)?;
        self.stats.evaluations += 1;
        self.tree.get_mut(node_id).set_prior(&eval.policy);
        Ok(())
    }

    /// Counters for the work done so far.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &MctsTree<G> {
        self.tree
    }
}

/// Average backed-up value at `node` for its player to move.
pub fn root_value<G: GameState>(node: &SearchNode<G>) -> f32 {
    let visits = node.total_visits();
    if visits <= 0.0 {
        return 0.0;
    }
    node.w.iter().sum::<f32>() / visits
}

/// Convenience function to run a single MCTS search from `state`.
pub fn run_mcts<G, E, R>(
    evaluator: &E,
    config: &MctsConfig,
    state: G,
    rng: &mut R,
) -> Result<SearchResult, SearchError>
where
    G: GameState,
    E: Evaluator<G> + ?Sized,
    R: Rng + ?Sized,
{
    let mut tree = MctsTree::new(state, 0, rng);
    let stats = MctsSearch::new(&mut tree, evaluator, config).run(rng)?;

    let root = tree.root_node();
    let local = argmax_visits(root).ok_or(SearchError::NoLegalActions)?;

    Ok(SearchResult {
        action: root.actions[local],
        policy: root.target_policy(),
        value: root_value(root),
        stats,
    })
}
