//! Game-level error types.

use crate::maze::Position;
use crate::tictactoe::{Mark, Square};

/// A request that cannot be served because it violates a precondition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Maze width or height was zero or negative.
    #[error("maze dimensions must be positive, got {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: i64,
        /// Requested height.
        height: i64,
    },

    /// Maze width or height exceeds the configured limit.
    #[error("maze dimensions {width}x{height} exceed the limit of {limit} cells per side")]
    TooLarge {
        /// Requested width.
        width: i64,
        /// Requested height.
        height: i64,
        /// Largest accepted width or height.
        limit: usize,
    },

    /// A maze position lies outside the grid.
    #[error("{role} position {position} lies outside the {width}x{height} maze")]
    OutOfBounds {
        /// Which position was rejected (`"exit"` or `"start"`).
        role: &'static str,
        /// The offending position.
        position: Position,
        /// Maze width.
        width: usize,
        /// Maze height.
        height: usize,
    },

    /// A tic-tac-toe move addressed a square outside the 3x3 board.
    #[error("move {square} is outside the 3x3 board")]
    MoveOutOfRange {
        /// The offending square.
        square: Square,
    },

    /// A tic-tac-toe move targeted a square that is already marked.
    #[error("square {square} is already taken by {mark}")]
    CellOccupied {
        /// The occupied square.
        square: Square,
        /// The mark already on it.
        mark: Mark,
    },

    /// A move was submitted for a board that already has a winner.
    #[error("the game is already won by {winner}")]
    GameOver {
        /// The player holding the winning line.
        winner: Mark,
    },
}
