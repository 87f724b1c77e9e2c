//! Configuration for the actor binary
//!
//! Defaults come from config.toml (with `ZEROPLAY_*` environment overrides,
//! see engine-config). CLI arguments take highest priority.

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_config::{load_config, CentralConfig};
use mcts::MctsConfig;
use once_cell::sync::Lazy;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

// Default value functions that read from central config
fn default_games() -> u32 {
    CENTRAL_CONFIG.self_play.games
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.self_play.seed
}

fn default_opponent() -> String {
    CENTRAL_CONFIG.self_play.opponent.clone()
}

fn default_evaluator() -> String {
    CENTRAL_CONFIG.self_play.evaluator.clone()
}

fn default_rollout_depth() -> u32 {
    CENTRAL_CONFIG.self_play.rollout_depth
}

fn default_num_simulations() -> u32 {
    CENTRAL_CONFIG.mcts.num_simulations
}

fn default_c_puct() -> f32 {
    CENTRAL_CONFIG.mcts.c_puct as f32
}

fn default_temp_threshold() -> u32 {
    CENTRAL_CONFIG.mcts.temp_threshold
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

/// Who plays against the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentKind {
    /// Search plays both sides
    None,
    Random,
    Human,
}

impl FromStr for OpponentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "random" => Ok(Self::Random),
            "human" => Ok(Self::Human),
            other => Err(anyhow!(
                "unknown opponent '{}', expected one of none, random, human",
                other
            )),
        }
    }
}

/// Which policy/value oracle guides the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorKind {
    Uniform,
    Rollout,
}

impl FromStr for EvaluatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uniform" => Ok(Self::Uniform),
            "rollout" => Ok(Self::Rollout),
            other => Err(anyhow!(
                "unknown evaluator '{}', expected one of uniform, rollout",
                other
            )),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "actor")]
#[command(about = "Zeroplay actor - MCTS self-play game runner")]
#[command(
    long_about = "Actor that plays tic-tac-toe games with PUCT search, either against
itself or against a random or human opponent, and reports the recorded games.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Number of games to play (0 to play until interrupted)
    #[arg(long, default_value_t = default_games())]
    pub games: u32,

    /// Seed for all randomness in the run
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,

    /// Opponent for the search (none, random, human)
    #[arg(long, default_value_t = default_opponent())]
    pub opponent: String,

    /// Position evaluator (uniform, rollout)
    #[arg(long, default_value_t = default_evaluator())]
    pub evaluator: String,

    /// Maximum playout length for the rollout evaluator
    #[arg(long, default_value_t = default_rollout_depth())]
    pub rollout_depth: u32,

    /// Number of MCTS simulations per move
    #[arg(long, default_value_t = default_num_simulations())]
    pub num_simulations: u32,

    /// PUCT exploration constant
    #[arg(long, default_value_t = default_c_puct())]
    pub c_puct: f32,

    /// Moves before this ply are sampled from visit counts in self-play
    #[arg(long, default_value_t = default_temp_threshold())]
    pub temp_threshold: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.num_simulations == 0 {
            return Err(anyhow!("num_simulations must be greater than 0"));
        }

        if !self.c_puct.is_finite() || self.c_puct <= 0.0 {
            return Err(anyhow!("c_puct must be a positive number"));
        }

        self.opponent_kind()?;

        if self.evaluator_kind()? == EvaluatorKind::Rollout && self.rollout_depth == 0 {
            return Err(anyhow!("rollout_depth must be greater than 0"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    pub fn opponent_kind(&self) -> Result<OpponentKind> {
        self.opponent.parse()
    }

    pub fn evaluator_kind(&self) -> Result<EvaluatorKind> {
        self.evaluator.parse()
    }

    /// Search parameters for the driver.
    pub fn mcts_config(&self) -> MctsConfig {
        MctsConfig::for_training()
            .with_simulations(self.num_simulations)
            .with_c_puct(self.c_puct)
            .with_temp_threshold(self.temp_threshold)
    }
}
