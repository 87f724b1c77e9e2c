//! Parsing of externally supplied moves.
//!
//! Move sources outside the engine (a human at a terminal, a protocol
//! adapter) hand the search a local action index. Parsing their raw input is
//! fallible, and the caller that owns the input loop decides whether to
//! re-prompt. The search itself never retries.

/// Outcome of parsing one externally supplied move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveInput {
    /// A legal move, as a local index into the state's `legal_actions()`.
    Parsed(usize),

    /// The input did not describe a legal move.
    InvalidInput(String),
}

impl MoveInput {
    /// Local action index if the input parsed.
    pub fn parsed(&self) -> Option<usize> {
        match self {
            MoveInput::Parsed(local) => Some(*local),
            MoveInput::InvalidInput(_) => None,
        }
    }

    /// Build an `InvalidInput` with a formatted reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        MoveInput::InvalidInput(reason.into())
    }
}
