//! TicTacToe rules engine for the Zeroplay search
//!
//! This crate provides a complete reference implementation of the
//! `GameState` contract. It is small enough to search exhaustively, which
//! makes it the game of choice for tests, benches and the actor's smoke runs.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::GameState;
//! use games_tictactoe::State;
//!
//! let state = State::new();
//! assert_eq!(state.legal_actions().len(), 9);
//!
//! // Local index 4 is the centre on an empty board
//! let next = state.apply_action(4);
//! assert_eq!(next.legal_actions().len(), 8);
//! ```

use engine_core::{GameState, MoveInput, Player, TwoPlayerObs};

/// Number of board cells, which is also the size of the action space.
pub const NUM_CELLS: usize = 9;

/// Side length of the board.
pub const BOARD_SIZE: usize = 3;

/// Oracle observation: own/other/legal planes of 9 cells each.
pub type Observation = TwoPlayerObs<NUM_CELLS>;

/// TicTacToe game state
///
/// Represents the complete state of a TicTacToe game including the board,
/// player to move, and winner information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct State {
    /// Board representation: 0=empty, 1=X, 2=O
    board: [u8; 9],
    /// Player to move: 1=X, 2=O. Keeps alternating after the final move, so
    /// in a finished game this is the side that did not make the last move.
    current_player: u8,
    /// Winner: 0=none/ongoing, 1=X, 2=O, 3=draw
    winner: u8,
}

impl State {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [0; 9],
            current_player: 1, // X goes first
            winner: 0,
        }
    }

    /// Build a state from a board of cells (0=empty, 1=X, 2=O).
    ///
    /// The player to move is derived from the piece count, X moving first.
    pub fn from_board(board: [u8; 9]) -> Self {
        let xs = board.iter().filter(|&&c| c == 1).count();
        let os = board.iter().filter(|&&c| c == 2).count();
        Self {
            board,
            current_player: if xs > os { 2 } else { 1 },
            winner: Self::check_winner(&board),
        }
    }

    /// Check if the game is over
    pub fn is_done(&self) -> bool {
        self.winner != 0
    }

    /// Raw board cells (0=empty, 1=X, 2=O).
    pub fn board(&self) -> &[u8; 9] {
        &self.board
    }

    /// Winner code: 0=ongoing, 1=X, 2=O, 3=draw.
    pub fn winner_code(&self) -> u8 {
        self.winner
    }

    /// Get legal moves (empty positions)
    pub fn legal_moves(&self) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }

        (0..9u8)
            .filter(|&pos| self.board[pos as usize] == 0)
            .collect()
    }

    /// Place a piece at `position` and return the new state
    pub fn make_move(&self, position: u8) -> State {
        if self.is_done() || position >= 9 || self.board[position as usize] != 0 {
            return *self; // Invalid move, return unchanged state
        }

        let mut new_state = *self;
        new_state.board[position as usize] = self.current_player;
        new_state.winner = Self::check_winner(&new_state.board);
        new_state.current_player = if self.current_player == 1 { 2 } else { 1 };

        new_state
    }

    /// Parse a human move of the form `"row col"` (0-based).
    ///
    /// Returns the local index of the move among `legal_actions()`.
    pub fn parse_move(&self, input: &str) -> MoveInput {
        let coords: Result<Vec<usize>, _> =
            input.split_whitespace().map(str::parse::<usize>).collect();

        let (row, col) = match coords.as_deref() {
            Ok([row, col]) => (*row, *col),
            Ok(_) => return MoveInput::invalid(format!("expected \"row col\", got {:?}", input)),
            Err(e) => return MoveInput::invalid(format!("bad coordinate in {:?}: {}", input, e)),
        };

        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return MoveInput::invalid(format!("({}, {}) is off the board", row, col));
        }

        let position = (row * BOARD_SIZE + col) as u8;
        match self.legal_moves().iter().position(|&m| m == position) {
            Some(local) => MoveInput::Parsed(local),
            None => MoveInput::invalid(format!("({}, {}) is not a legal move", row, col)),
        }
    }

    fn player(code: u8) -> Player {
        if code == 1 {
            Player::First
        } else {
            Player::Second
        }
    }

    /// Check for winner on the board
    fn check_winner(board: &[u8; 9]) -> u8 {
        // Winning positions (rows, columns, diagonals)
        const LINES: [[usize; 3]; 8] = [
            [0, 1, 2],
            [3, 4, 5],
            [6, 7, 8], // rows
            [0, 3, 6],
            [1, 4, 7],
            [2, 5, 8], // columns
            [0, 4, 8],
            [2, 4, 6], // diagonals
        ];

        for line in &LINES {
            let [a, b, c] = *line;
            if board[a] != 0 && board[a] == board[b] && board[b] == board[c] {
                return board[a]; // Return the winning player
            }
        }

        // Check for draw (board full but no winner)
        if board.iter().all(|&cell| cell != 0) {
            return 3; // Draw
        }

        0 // Game ongoing
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState for State {
    type Observation = Observation;

    fn action_space_size(&self) -> usize {
        NUM_CELLS
    }

    fn legal_actions(&self) -> Vec<usize> {
        self.legal_moves().into_iter().map(usize::from).collect()
    }

    fn apply_action(&self, local: usize) -> Self {
        match self.legal_moves().get(local) {
            Some(&position) => self.make_move(position),
            None => *self,
        }
    }

    fn is_terminal(&self) -> bool {
        self.is_done()
    }

    fn winner(&self) -> f32 {
        match self.winner {
            0 | 3 => 0.0,
            w if w == self.current_player => 1.0,
            _ => -1.0,
        }
    }

    fn observation(&self) -> Observation {
        let cells: Vec<Option<Player>> = self
            .board
            .iter()
            .map(|&c| if c == 0 { None } else { Some(Self::player(c)) })
            .collect();
        TwoPlayerObs::from_board(
            &cells,
            &self.legal_actions(),
            Self::player(self.current_player),
        )
    }

    fn to_play(&self) -> Option<Player> {
        Some(Self::player(self.current_player))
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.board.chunks(BOARD_SIZE) {
            let line: String = row
                .iter()
                .map(|&c| match c {
                    1 => 'X',
                    2 => 'O',
                    _ => '.',
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
