//! Move policy: turning root visit counts into the move actually played.

use engine_core::GameState;
use rand::Rng;

use crate::config::MctsConfig;
use crate::node::SearchNode;

/// Pick the local action to play at `node` after search.
///
/// While the game ply is below `temp_threshold` and `explore` is set (plain
/// self-play), the move is sampled proportionally to visit counts. Otherwise
/// the most visited action is played, lowest index on ties. Returns `None`
/// when the node has no legal actions.
pub fn choose_move<G: GameState, R: Rng + ?Sized>(
    node: &SearchNode<G>,
    config: &MctsConfig,
    explore: bool,
    rng: &mut R,
) -> Option<usize> {
    if explore && node.ply < config.temp_threshold {
        sample_visits(&node.n, rng)
    } else {
        argmax_visits(node)
    }
}

/// Most visited local action, lowest index on ties.
pub fn argmax_visits<G>(node: &SearchNode<G>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (action, &visits) in node.n.iter().enumerate() {
        match best {
            Some((_, most)) if visits <= most => {}
            _ => best = Some((action, visits)),
        }
    }
    best.map(|(action, _)| action)
}

/// Sample an index with probability proportional to `visits`.
fn sample_visits<R: Rng + ?Sized>(visits: &[f32], rng: &mut R) -> Option<usize> {
    let total: f32 = visits.iter().sum();
    if visits.is_empty() || total <= 0.0 {
        return None;
    }

    let r = rng.gen::<f32>() * total;
    let mut cumsum = 0.0;

    for (i, &v) in visits.iter().enumerate() {
        cumsum += v;
        if r < cumsum {
            return Some(i);
        }
    }

    // Fallback to last non-zero action (handles floating point issues)
    visits.iter().rposition(|&v| v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TwoMoveGame;
    use games_tictactoe::State;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn node_with_visits(visits: &[f32], ply: u32) -> SearchNode<State> {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let mut node = SearchNode::new(State::new(), None, ply, &mut rng);
        node.n = visits.to_vec();
        node
    }

    #[test]
    fn test_sample_visits_distribution() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let visits = [1e-10, 50.0, 30.0, 20.0, 1e-10];

        let mut counts = [0u32; 5];
        for _ in 0..1000 {
            let action = sample_visits(&visits, &mut rng).unwrap();
            counts[action] += 1;
        }

        // Jitter-only actions are practically never drawn
        assert_eq!(counts[0], 0);
        assert_eq!(counts[4], 0);

        // Action 1 should be most common (~500), action 2 (~300), action 3 (~200)
        assert!(counts[1] > counts[2]);
        assert!(counts[2] > counts[3]);
    }

    #[test]
    fn test_sample_visits_empty() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        assert_eq!(sample_visits(&[], &mut rng), None);
    }

    #[test]
    fn test_argmax_ties_go_to_lowest_index() {
        let node = node_with_visits(&[1.0, 5.0, 2.0, 5.0, 0.5, 5.0, 1.0, 1.0, 1.0], 0);
        assert_eq!(argmax_visits(&node), Some(1));
    }

    #[test]
    fn test_greedy_after_threshold() {
        let config = MctsConfig::default().with_temp_threshold(4);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let node = node_with_visits(&[1.0, 2.0, 9.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0], 4);

        for _ in 0..50 {
            assert_eq!(choose_move(&node, &config, true, &mut rng), Some(2));
        }
    }

    #[test]
    fn test_greedy_without_exploration() {
        let config = MctsConfig::default();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let node = node_with_visits(&[3.0, 3.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0], 0);

        for _ in 0..50 {
            assert_eq!(choose_move(&node, &config, false, &mut rng), Some(0));
        }
    }

    #[test]
    fn test_sampling_reaches_several_moves_before_threshold() {
        let config = MctsConfig::default();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let node = node_with_visits(&[1.0; 9], 0);

        let mut seen = [false; 9];
        for _ in 0..500 {
            let action = choose_move(&node, &config, true, &mut rng).unwrap();
            seen[action] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_no_move_without_actions() {
        let config = MctsConfig::default();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let node = SearchNode::new(TwoMoveGame::Ended(0.0), None, 0, &mut rng);

        assert_eq!(choose_move(&node, &config, true, &mut rng), None);
        assert_eq!(choose_move(&node, &config, false, &mut rng), None);
    }
}
