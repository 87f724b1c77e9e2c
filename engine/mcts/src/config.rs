//! MCTS configuration parameters.

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsConfig {
    /// Number of simulations to run per real move.
    pub num_simulations: u32,

    /// Exploration constant of the PUCT formula.
    /// Higher values encourage exploration, lower values favor exploitation.
    pub c_puct: f32,

    /// Moves played before this game ply are sampled proportionally to
    /// visit counts in self-play; later moves (and every move against an
    /// opponent) take the most-visited action.
    pub temp_threshold: u32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 160,
            c_puct: 1.0,
            temp_threshold: 30,
        }
    }
}

impl MctsConfig {
    /// Create config for training (exploratory opening moves).
    pub fn for_training() -> Self {
        Self::default()
    }

    /// Create config for evaluation/inference (greedy from the first move).
    pub fn for_evaluation() -> Self {
        Self {
            temp_threshold: 0,
            ..Self::default()
        }
    }

    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            num_simulations: 50,
            ..Self::default()
        }
    }

    /// Builder pattern: set number of simulations.
    pub fn with_simulations(mut self, n: u32) -> Self {
        self.num_simulations = n;
        self
    }

    /// Builder pattern: set c_puct exploration constant.
    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    /// Builder pattern: set the sampling threshold ply.
    pub fn with_temp_threshold(mut self, ply: u32) -> Self {
        self.temp_threshold = ply;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.num_simulations, 160);
        assert!((config.c_puct - 1.0).abs() < 1e-6);
        assert_eq!(config.temp_threshold, 30);
        assert_eq!(MctsConfig::for_training(), config);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_simulations(100)
            .with_c_puct(2.5)
            .with_temp_threshold(4);

        assert_eq!(config.num_simulations, 100);
        assert!((config.c_puct - 2.5).abs() < 1e-6);
        assert_eq!(config.temp_threshold, 4);
    }

    #[test]
    fn test_evaluation_config() {
        let config = MctsConfig::for_evaluation();
        assert_eq!(config.temp_threshold, 0);
        assert_eq!(config.num_simulations, 160);
    }
}
