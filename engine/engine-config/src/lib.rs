//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic used by
//! the actor binary.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`ZEROPLAY_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (config.defaults.toml, compiled in)
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! ZEROPLAY_<SECTION>_<KEY>=value
//!
//! Examples:
//!     ZEROPLAY_COMMON_LOG_LEVEL=debug
//!     ZEROPLAY_MCTS_NUM_SIMULATIONS=400
//!     ZEROPLAY_SELF_PLAY_OPPONENT=random
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{
    apply_env_overrides, load_config, load_from_path, CONFIG_PATH_VAR, CONFIG_SEARCH_PATHS,
};
pub use structs::*;
