//! Default configuration values loaded from config.defaults.toml.
//!
//! This module loads defaults from the shared TOML file at compile time, so
//! the shipped defaults file and the binary can never disagree.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    mcts: MctsDefaults,
    self_play: SelfPlayDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    num_simulations: u32,
    c_puct: f64,
    temp_threshold: u32,
}

#[derive(Debug, Deserialize)]
struct SelfPlayDefaults {
    games: u32,
    seed: u64,
    opponent: String,
    evaluator: String,
    rollout_depth: u32,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}

// MCTS
pub fn num_simulations() -> u32 {
    DEFAULTS.mcts.num_simulations
}
pub fn c_puct() -> f64 {
    DEFAULTS.mcts.c_puct
}
pub fn temp_threshold() -> u32 {
    DEFAULTS.mcts.temp_threshold
}

// Self-play
pub fn games() -> u32 {
    DEFAULTS.self_play.games
}
pub fn seed() -> u64 {
    DEFAULTS.self_play.seed
}
pub fn opponent() -> &'static str {
    &DEFAULTS.self_play.opponent
}
pub fn evaluator() -> &'static str {
    &DEFAULTS.self_play.evaluator
}
pub fn rollout_depth() -> u32 {
    DEFAULTS.self_play.rollout_depth
}
