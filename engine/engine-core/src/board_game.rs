//! Shared observation layout for two-player board games.
//!
//! Board games on a fixed grid can reuse this encoding as their
//! `GameState::Observation` instead of defining their own planes.

use crate::game::Player;

/// Oracle observation for a two-player board game with `CELLS` cells.
///
/// Planes are relative to the player to move, so the oracle always sees the
/// position from the mover's side:
/// - `own`: cells held by the player to move
/// - `other`: cells held by the opponent
/// - `legal`: legal global actions (1.0 = legal)
#[derive(Debug, Clone, PartialEq)]
pub struct TwoPlayerObs<const CELLS: usize> {
    pub own: [f32; CELLS],
    pub other: [f32; CELLS],
    pub legal: [f32; CELLS],
}

impl<const CELLS: usize> TwoPlayerObs<CELLS> {
    /// Create an empty observation.
    pub fn new() -> Self {
        Self {
            own: [0.0; CELLS],
            other: [0.0; CELLS],
            legal: [0.0; CELLS],
        }
    }

    /// Create observation from board cells.
    ///
    /// - `cells`: owner of each cell, `None` when empty
    /// - `legal_actions`: global ids of legal moves (ids >= `CELLS` are ignored)
    /// - `to_play`: player whose perspective the planes take
    pub fn from_board(cells: &[Option<Player>], legal_actions: &[usize], to_play: Player) -> Self {
        let mut obs = Self::new();

        for (i, cell) in cells.iter().enumerate().take(CELLS) {
            match cell {
                Some(p) if *p == to_play => obs.own[i] = 1.0,
                Some(_) => obs.other[i] = 1.0,
                None => {}
            }
        }

        for &action in legal_actions {
            if let Some(slot) = obs.legal.get_mut(action) {
                *slot = 1.0;
            }
        }

        obs
    }

    /// Flatten to `[own, other, legal]` for a tensor backend.
    pub fn to_vec(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(Self::obs_size());
        out.extend_from_slice(&self.own);
        out.extend_from_slice(&self.other);
        out.extend_from_slice(&self.legal);
        out
    }

    /// Total observation size in floats.
    pub const fn obs_size() -> usize {
        CELLS * 3
    }
}

impl<const CELLS: usize> Default for TwoPlayerObs<CELLS> {
    fn default() -> Self {
        Self::new()
    }
}
