//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_num_simulations() -> u32 {
    defaults::num_simulations()
}
fn d_c_puct() -> f64 {
    defaults::c_puct()
}
fn d_temp_threshold() -> u32 {
    defaults::temp_threshold()
}
fn d_games() -> u32 {
    defaults::games()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_opponent() -> String {
    defaults::opponent().into()
}
fn d_evaluator() -> String {
    defaults::evaluator().into()
}
fn d_rollout_depth() -> u32 {
    defaults::rollout_depth()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub mcts: MctsConfig,
    #[serde(default)]
    pub self_play: SelfPlayConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
        }
    }
}

/// Search parameters
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsConfig {
    #[serde(default = "d_num_simulations")]
    pub num_simulations: u32,
    #[serde(default = "d_c_puct")]
    pub c_puct: f64,
    #[serde(default = "d_temp_threshold")]
    pub temp_threshold: u32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: defaults::num_simulations(),
            c_puct: defaults::c_puct(),
            temp_threshold: defaults::temp_threshold(),
        }
    }
}

/// Game loop settings for the actor
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SelfPlayConfig {
    #[serde(default = "d_games")]
    pub games: u32,
    #[serde(default = "d_seed")]
    pub seed: u64,
    #[serde(default = "d_opponent")]
    pub opponent: String,
    #[serde(default = "d_evaluator")]
    pub evaluator: String,
    #[serde(default = "d_rollout_depth")]
    pub rollout_depth: u32,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            games: defaults::games(),
            seed: defaults::seed(),
            opponent: defaults::opponent().into(),
            evaluator: defaults::evaluator().into(),
            rollout_depth: defaults::rollout_depth(),
        }
    }
}
