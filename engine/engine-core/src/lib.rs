//! Core traits and types shared by the Zeroplay search engine and its games
//!
//! This crate provides the game-side abstractions the search consumes:
//! - `GameState`: rules contract (legal moves, pure action application,
//!   terminal detection, observation encoding)
//! - `Player`: side to move, for games that report it explicitly
//! - `TwoPlayerObs`: reusable observation layout for two-player boards
//! - `MoveInput`: result of parsing an externally supplied move

pub mod board_game;
pub mod game;
pub mod input;

// Re-export main types for convenience
pub use board_game::TwoPlayerObs;
pub use game::{GameState, Player};
pub use input::MoveInput;
