//! Self-play driver: plays one full game with search on every move and
//! collects training samples along the way.
//!
//! Each real move goes through the same cycle:
//!
//! ```text
//! Searching -> MoveSelected -> Advanced -> (Searching | Terminal)
//! ```
//!
//! The tree is kept between moves. Advancing re-roots it on the chosen child
//! so the statistics gathered below that child seed the next search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use engine_core::GameState;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::MctsConfig;
use crate::evaluator::Evaluator;
use crate::node::{same_mover, SearchNode};
use crate::policy::choose_move;
use crate::search::{MctsSearch, SearchError, SearchStats};
use crate::tree::MctsTree;

/// Errors that end a self-play game early.
#[derive(Debug, Error)]
pub enum SelfPlayError {
    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Game aborted")]
    Aborted,

    #[error("Opponent chose action {action}, position has {num_actions} legal actions")]
    IllegalOpponentMove { action: usize, num_actions: usize },
}

/// One recorded position with its search policy.
#[derive(Debug, Clone)]
pub struct TrainingSample<G: GameState> {
    pub state: G,
    pub observation: G::Observation,
    /// Normalized visit counts over the global action space.
    pub policy: Vec<f32>,
    /// Game ply of the position.
    pub ply: u32,
}

impl<G: GameState> TrainingSample<G> {
    pub fn from_node(node: &SearchNode<G>) -> Self {
        Self {
            state: node.state.clone(),
            observation: node.state.observation(),
            policy: node.target_policy(),
            ply: node.ply,
        }
    }
}

/// A finished game.
#[derive(Debug, Clone)]
pub struct GameRecord<G: GameState> {
    /// Samples in the order they were recorded.
    pub samples: Vec<TrainingSample<G>>,
    pub final_state: G,
    /// `final_state.winner()`, for the player to move in the final state.
    pub winner: f32,
    pub final_ply: u32,
}

impl<G: GameState> GameRecord<G> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Game outcome for the player to move at each sample, in sample order.
    pub fn value_targets(&self) -> Vec<f32> {
        let final_player = self.final_state.to_play();
        self.samples
            .iter()
            .map(|sample| {
                let distance = self.final_ply.saturating_sub(sample.ply);
                if same_mover(sample.state.to_play(), final_player, distance) {
                    self.winner
                } else {
                    -self.winner
                }
            })
            .collect()
    }
}

/// Source of moves for the side that does not search.
pub trait Opponent<G: GameState> {
    /// Local action index (into `state.legal_actions()`) to play, or `None`
    /// to abandon the game.
    fn select_move(&mut self, state: &G) -> Option<usize>;
}

impl<G: GameState, F: FnMut(&G) -> Option<usize>> Opponent<G> for F {
    fn select_move(&mut self, state: &G) -> Option<usize> {
        self(state)
    }
}

/// Who plays the side that does not search.
pub enum PlayMode<'a, G: GameState> {
    /// Search picks every move; opening moves are sampled.
    SelfPlay,

    /// Search and the opponent alternate, search moving first. Every search
    /// move is greedy.
    AgainstOpponent(&'a mut dyn Opponent<G>),
}

/// Which side made a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Search,
    Opponent,
}

/// Hooks into a running game.
pub trait SelfPlayObserver {
    fn on_search(&mut self, _ply: u32, _stats: &SearchStats) {}

    fn on_move(&mut self, _ply: u32, _action: usize, _mover: Mover) {}
}

/// Self-play driver.
pub struct SelfPlay<'a, E: ?Sized> {
    evaluator: &'a E,
    config: MctsConfig,
    abort: Option<Arc<AtomicBool>>,
    observer: Option<&'a mut dyn SelfPlayObserver>,
}

impl<'a, E: ?Sized> SelfPlay<'a, E> {
    pub fn new(evaluator: &'a E, config: MctsConfig) -> Self {
        Self {
            evaluator,
            config,
            abort: None,
            observer: None,
        }
    }

    /// Abandon the game once `flag` is set. Checked between moves.
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    pub fn with_observer(mut self, observer: &'a mut dyn SelfPlayObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    fn check_abort(&self) -> Result<(), SelfPlayError> {
        match &self.abort {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(SelfPlayError::Aborted),
            _ => Ok(()),
        }
    }

    /// Play one game from `start` (game ply 0) to a terminal state.
    ///
    /// On error the partial history is dropped.
    pub fn play<G, R>(
        &mut self,
        start: G,
        mode: PlayMode<'_, G>,
        rng: &mut R,
    ) -> Result<GameRecord<G>, SelfPlayError>
    where
        G: GameState,
        E: Evaluator<G>,
        R: Rng + ?Sized,
    {
        let (explore, mut opponent) = match mode {
            PlayMode::SelfPlay => (true, None),
            PlayMode::AgainstOpponent(opponent) => (false, Some(opponent)),
        };

        let mut tree = MctsTree::new(start, 0, rng);
        let mut samples = Vec::new();

        loop {
            self.check_abort()?;
            if tree.root_node().terminal {
                break;
            }

            // Searching
            let stats = MctsSearch::new(&mut tree, self.evaluator, &self.config).run(rng)?;
            let ply = tree.root_node().ply;
            if let Some(observer) = self.observer.as_deref_mut() {
                observer.on_search(ply, &stats);
            }

            // MoveSelected
            samples.push(TrainingSample::from_node(tree.root_node()));
            let action = choose_move(tree.root_node(), &self.config, explore, rng)
                .ok_or(SearchError::NoLegalActions)?;

            // Advanced
            self.advance(&mut tree, action, rng)?;
            debug!(ply, action, tree_size = tree.len(), "search move played");
            if let Some(observer) = self.observer.as_deref_mut() {
                observer.on_move(ply, action, Mover::Search);
            }

            let Some(opponent) = opponent.as_mut() else {
                continue;
            };
            if tree.root_node().terminal {
                break;
            }

            samples.push(TrainingSample::from_node(tree.root_node()));
            self.check_abort()?;

            let root = tree.root_node();
            let ply = root.ply;
            let num_actions = root.num_actions();
            let Some(action) = opponent.select_move(&root.state) else {
                debug!(ply, "opponent abandoned the game");
                return Err(SelfPlayError::Aborted);
            };
            if action >= num_actions {
                return Err(SelfPlayError::IllegalOpponentMove {
                    action,
                    num_actions,
                });
            }

            self.advance(&mut tree, action, rng)?;
            debug!(ply, action, tree_size = tree.len(), "opponent move played");
            if let Some(observer) = self.observer.as_deref_mut() {
                observer.on_move(ply, action, Mover::Opponent);
            }
        }

        let root = tree.root_node();
        let record = GameRecord {
            samples,
            final_state: root.state.clone(),
            winner: root.state.winner(),
            final_ply: root.ply,
        };

        info!(
            plies = record.final_ply,
            samples = record.len(),
            winner = record.winner,
            "game finished"
        );

        Ok(record)
    }

    /// Re-root `tree` on the child for the local `action`, creating the
    /// child first if search never expanded it.
    fn advance<G, R>(
        &self,
        tree: &mut MctsTree<G>,
        action: usize,
        rng: &mut R,
    ) -> Result<(), SearchError>
    where
        G: GameState,
        E: Evaluator<G>,
        R: Rng + ?Sized,
    {
        let root = tree.root();
        let child = MctsSearch::new(tree, self.evaluator, &self.config)
            .child_or_expand(root, action, rng)?;
        tree.promote(child);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{EvaluatorError, UniformEvaluator};
    use crate::node::NodeId;
    use crate::testing::{CountingEvaluator, FixedEvaluator, TwoMoveGame};
    use engine_core::Player;
    use games_tictactoe::State;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn rng(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }

    #[derive(Default)]
    struct Recorder {
        searches: Vec<u32>,
        reused: Vec<(u32, u32)>,
        moves: Vec<(u32, usize, Mover)>,
        abort_after: Option<(usize, Arc<AtomicBool>)>,
    }

    impl SelfPlayObserver for Recorder {
        fn on_search(&mut self, ply: u32, stats: &SearchStats) {
            assert!(stats.simulations > 0);
            self.searches.push(ply);
            self.reused.push((ply, stats.reused_visits));
        }

        fn on_move(&mut self, ply: u32, action: usize, mover: Mover) {
            self.moves.push((ply, action, mover));
            if let Some((limit, flag)) = &self.abort_after {
                if self.moves.len() >= *limit {
                    flag.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    fn assert_consistent(record: &GameRecord<State>) {
        assert!(record.final_state.is_terminal());
        assert_eq!(record.winner, record.final_state.winner());
        assert_eq!(record.len() as u32, record.final_ply);

        for (i, sample) in record.samples.iter().enumerate() {
            assert_eq!(sample.ply, i as u32);
            assert!(!sample.state.is_terminal());
            assert_eq!(sample.policy.len(), 9);
            let sum: f32 = sample.policy.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);

            // Policy mass only on legal moves
            for (action, &p) in sample.policy.iter().enumerate() {
                if !sample.state.legal_actions().contains(&action) {
                    assert_eq!(p, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_tictactoe_self_play_completes() {
        let evaluator = UniformEvaluator::new();
        let mut driver = SelfPlay::new(&evaluator, MctsConfig::for_testing());

        let record = driver
            .play(State::new(), PlayMode::SelfPlay, &mut rng(42))
            .unwrap();

        assert_consistent(&record);
        assert!(record.final_ply >= 5 && record.final_ply <= 9);

        let targets = record.value_targets();
        assert_eq!(targets.len(), record.len());
        // The last mover either won or drew
        assert!(*targets.last().unwrap() >= 0.0);
    }

    #[test]
    fn test_self_play_is_deterministic_per_seed() {
        let evaluator = UniformEvaluator::new();
        let mut driver = SelfPlay::new(&evaluator, MctsConfig::for_testing());

        let a = driver
            .play(State::new(), PlayMode::SelfPlay, &mut rng(7))
            .unwrap();
        let b = driver
            .play(State::new(), PlayMode::SelfPlay, &mut rng(7))
            .unwrap();

        assert_eq!(a.final_state, b.final_state);
        assert_eq!(a.final_ply, b.final_ply);
    }

    #[test]
    fn test_observer_sees_every_move() {
        let evaluator = UniformEvaluator::new();
        let mut recorder = Recorder::default();
        let record = SelfPlay::new(&evaluator, MctsConfig::for_testing())
            .with_observer(&mut recorder)
            .play(State::new(), PlayMode::SelfPlay, &mut rng(3))
            .unwrap();

        assert_eq!(recorder.searches.len() as u32, record.final_ply);
        assert_eq!(recorder.moves.len() as u32, record.final_ply);
        assert!(recorder.moves.iter().all(|(_, _, m)| *m == Mover::Search));
    }

    #[test]
    fn test_against_opponent_alternates_movers() {
        let evaluator = UniformEvaluator::new();
        let mut recorder = Recorder::default();
        let mut first_legal = |_: &State| Some(0usize);

        let record = SelfPlay::new(&evaluator, MctsConfig::for_testing())
            .with_observer(&mut recorder)
            .play(
                State::new(),
                PlayMode::AgainstOpponent(&mut first_legal),
                &mut rng(5),
            )
            .unwrap();

        assert_consistent(&record);
        for (i, (ply, _, mover)) in recorder.moves.iter().enumerate() {
            assert_eq!(*ply, i as u32);
            let expected = if i % 2 == 0 {
                Mover::Search
            } else {
                Mover::Opponent
            };
            assert_eq!(*mover, expected);
        }
        // Search only runs on its own turns
        assert!(recorder.searches.iter().all(|ply| ply % 2 == 0));
    }

    #[test]
    fn test_illegal_opponent_move_is_rejected() {
        let evaluator = UniformEvaluator::new();
        let mut out_of_range = |_: &State| Some(99usize);

        let err = SelfPlay::new(&evaluator, MctsConfig::for_testing())
            .play(
                State::new(),
                PlayMode::AgainstOpponent(&mut out_of_range),
                &mut rng(5),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            SelfPlayError::IllegalOpponentMove {
                action: 99,
                num_actions: 8
            }
        ));
    }

    #[test]
    fn test_opponent_can_abandon_the_game() {
        let evaluator = UniformEvaluator::new();
        let mut recorder = Recorder::default();
        let mut walk_away = |_: &State| -> Option<usize> { None };

        let err = SelfPlay::new(&evaluator, MctsConfig::for_testing())
            .with_observer(&mut recorder)
            .play(
                State::new(),
                PlayMode::AgainstOpponent(&mut walk_away),
                &mut rng(5),
            )
            .unwrap_err();

        assert!(matches!(err, SelfPlayError::Aborted));
        assert_eq!(recorder.moves.len(), 1);
        assert_eq!(recorder.moves[0].2, Mover::Search);
    }

    #[test]
    fn test_opponent_move_into_searched_subtree_keeps_statistics() {
        let evaluator = UniformEvaluator::new();
        let mut recorder = Recorder::default();
        let mut first_legal = |_: &State| Some(0usize);

        // With a zero-valued oracle every action of the chosen reply gets
        // expanded and revisited, so the opponent lands on a searched node
        let config = MctsConfig::for_testing().with_simulations(200);
        SelfPlay::new(&evaluator, config)
            .with_observer(&mut recorder)
            .play(
                State::new(),
                PlayMode::AgainstOpponent(&mut first_legal),
                &mut rng(9),
            )
            .unwrap();

        assert_eq!(recorder.reused[0], (0, 0));
        let (ply, reused) = recorder.reused[1];
        assert_eq!(ply, 2);
        assert!(reused > 0);
    }

    #[test]
    fn test_opponent_move_off_the_tree_starts_fresh() {
        let evaluator = UniformEvaluator::new();
        let mut recorder = Recorder::default();
        let mut first_legal = |_: &State| Some(0usize);

        // One simulation expands only the reply the search then plays
        let config = MctsConfig::for_testing().with_simulations(1);
        SelfPlay::new(&evaluator, config)
            .with_observer(&mut recorder)
            .play(
                State::new(),
                PlayMode::AgainstOpponent(&mut first_legal),
                &mut rng(9),
            )
            .unwrap();

        assert_eq!(recorder.reused[1], (2, 0));
    }

    #[test]
    fn test_abort_before_start() {
        let evaluator = CountingEvaluator::new();
        let flag = Arc::new(AtomicBool::new(true));

        let err = SelfPlay::new(&evaluator, MctsConfig::for_testing())
            .with_abort_flag(flag)
            .play(State::new(), PlayMode::SelfPlay, &mut rng(1))
            .unwrap_err();

        assert!(matches!(err, SelfPlayError::Aborted));
        assert_eq!(evaluator.calls(), 0);
    }

    #[test]
    fn test_abort_mid_game() {
        let evaluator = UniformEvaluator::new();
        let flag = Arc::new(AtomicBool::new(false));
        let mut recorder = Recorder {
            abort_after: Some((2, flag.clone())),
            ..Recorder::default()
        };

        let err = SelfPlay::new(&evaluator, MctsConfig::for_testing())
            .with_abort_flag(flag)
            .with_observer(&mut recorder)
            .play(State::new(), PlayMode::SelfPlay, &mut rng(1))
            .unwrap_err();

        assert!(matches!(err, SelfPlayError::Aborted));
        assert_eq!(recorder.moves.len(), 2);
    }

    #[test]
    fn test_evaluator_errors_end_the_game() {
        let evaluator = FixedEvaluator {
            policy: vec![0.5; 2],
            value: 0.0,
        };

        let err = SelfPlay::new(&evaluator, MctsConfig::for_testing())
            .play(State::new(), PlayMode::SelfPlay, &mut rng(1))
            .unwrap_err();

        assert!(matches!(
            err,
            SelfPlayError::Search(SearchError::Evaluator(EvaluatorError::PolicyLength { .. }))
        ));
    }

    #[test]
    fn test_advance_reuses_searched_child_and_prunes() {
        let evaluator = UniformEvaluator::new();
        let config = MctsConfig::for_testing().with_simulations(100);
        let driver = SelfPlay::new(&evaluator, config.clone());
        let mut rng = rng(11);

        let mut tree = MctsTree::new(State::new(), 0, &mut rng);
        MctsSearch::new(&mut tree, &evaluator, &config)
            .run(&mut rng)
            .unwrap();

        let root = tree.root_node();
        let (action, child) = root.children[0];
        let kept_visits = tree.get(child).sum_n;
        let kept_state = tree.get(child).state;
        let kept_size = tree.subtree(child).len();
        assert!(kept_visits > 1);
        assert!(root.children.len() > 1);

        driver.advance(&mut tree, action, &mut rng).unwrap();

        let new_root = tree.root_node();
        assert_eq!(tree.root(), NodeId(0));
        assert!(new_root.parent.is_none());
        assert_eq!(new_root.state, kept_state);
        assert_eq!(new_root.sum_n, kept_visits);
        assert_eq!(tree.len(), kept_size);
        assert_eq!(tree.subtree(tree.root()).len(), tree.len());
    }

    #[test]
    fn test_advance_synthesizes_and_evaluates_missing_child() {
        let evaluator = CountingEvaluator::new();
        let config = MctsConfig::for_testing().with_simulations(0);
        let driver = SelfPlay::new(&evaluator, config.clone());
        let mut rng = rng(11);

        let mut tree = MctsTree::new(State::new(), 0, &mut rng);
        MctsSearch::new(&mut tree, &evaluator, &config)
            .run(&mut rng)
            .unwrap();
        assert_eq!(evaluator.calls(), 1);
        assert!(tree.root_node().children.is_empty());

        driver.advance(&mut tree, 3, &mut rng).unwrap();

        let root = tree.root_node();
        assert_eq!(tree.len(), 1);
        assert_eq!(root.ply, 1);
        assert!(root.evaluated);
        assert_eq!(root.state.board()[3], 1);
        assert_eq!(evaluator.calls(), 2);
    }

    #[test]
    fn test_value_targets_by_parity() {
        let samples = vec![TrainingSample {
            state: TwoMoveGame::Start,
            observation: vec![0.0],
            policy: vec![1.0, 0.0, 0.0],
            ply: 0,
        }];
        let record = GameRecord {
            samples,
            final_state: TwoMoveGame::Ended(1.0),
            winner: 1.0,
            final_ply: 1,
        };

        // The sample's mover is the one who did not win
        assert_eq!(record.value_targets(), vec![-1.0]);
    }

    #[test]
    fn test_value_targets_by_player() {
        // X wins on move 5; samples for X at plies 0, 2, 4 and O at 1, 3
        let mut state = State::new();
        let mut samples = Vec::new();
        for (ply, pos) in [0u8, 3, 1, 4, 2].into_iter().enumerate() {
            samples.push(TrainingSample {
                state,
                observation: state.observation(),
                policy: vec![0.0; 9],
                ply: ply as u32,
            });
            state = state.make_move(pos);
        }
        assert_eq!(state.to_play(), Some(Player::Second));

        let record = GameRecord {
            samples,
            final_state: state,
            winner: state.winner(),
            final_ply: 5,
        };

        assert_eq!(record.value_targets(), vec![1.0, -1.0, 1.0, -1.0, 1.0]);
    }
}
