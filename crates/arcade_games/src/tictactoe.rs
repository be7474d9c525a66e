//! Tic-tac-toe move arbitration.
//!
//! [`play`] applies the human move, checks for a win or a draw, and otherwise
//! answers with the automated opponent's move. The opponent is deliberately
//! simple: it takes the first empty square in row-major order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Player X.
    X,
    /// Player O.
    O,
}

impl Mark {
    /// The other player.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => f.write_str("X"),
            Mark::O => f.write_str("O"),
        }
    }
}

/// A board square as `(row, col)`. Serialised as `[row, col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square(pub usize, pub usize);

impl Square {
    /// Every square in row-major order.
    pub const ALL: [Square; 9] = [
        Square(0, 0),
        Square(0, 1),
        Square(0, 2),
        Square(1, 0),
        Square(1, 1),
        Square(1, 2),
        Square(2, 0),
        Square(2, 1),
        Square(2, 2),
    ];

    /// Create a square from its row and column.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self(row, col)
    }

    /// Row index.
    #[must_use]
    pub const fn row(self) -> usize {
        self.0
    }

    /// Column index.
    #[must_use]
    pub const fn col(self) -> usize {
        self.1
    }

    /// Returns `true` if the square lies on the 3x3 board.
    #[must_use]
    pub const fn is_on_board(self) -> bool {
        self.0 < 3 && self.1 < 3
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// The eight winning triples, in evaluation order: rows top to bottom,
/// columns left to right, then the main and anti diagonals.
pub const WINNING_LINES: [[Square; 3]; 8] = [
    [Square(0, 0), Square(0, 1), Square(0, 2)],
    [Square(1, 0), Square(1, 1), Square(1, 2)],
    [Square(2, 0), Square(2, 1), Square(2, 2)],
    [Square(0, 0), Square(1, 0), Square(2, 0)],
    [Square(0, 1), Square(1, 1), Square(2, 1)],
    [Square(0, 2), Square(1, 2), Square(2, 2)],
    [Square(0, 0), Square(1, 1), Square(2, 2)],
    [Square(0, 2), Square(1, 1), Square(2, 0)],
];

/// A 3x3 board. Empty squares serialise as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([[Option<Mark>; 3]; 3]);

impl Board {
    /// An empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from its rows.
    #[must_use]
    pub const fn from_rows(rows: [[Option<Mark>; 3]; 3]) -> Self {
        Self(rows)
    }

    /// The board rows, top to bottom.
    #[must_use]
    pub const fn rows(&self) -> &[[Option<Mark>; 3]; 3] {
        &self.0
    }

    /// The mark on `square`, if any. Off-board squares read as empty.
    #[must_use]
    pub fn get(&self, square: Square) -> Option<Mark> {
        self.0
            .get(square.row())
            .and_then(|row| row.get(square.col()))
            .copied()
            .flatten()
    }

    fn place(&mut self, square: Square, mark: Mark) {
        self.0[square.row()][square.col()] = Some(mark);
    }

    /// Returns `true` if no square is empty.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.0.iter().flatten().all(Option::is_some)
    }

    /// The first empty square in row-major order.
    #[must_use]
    pub fn first_empty(&self) -> Option<Square> {
        Square::ALL.into_iter().find(|&square| self.get(square).is_none())
    }

    /// The first completed line in [`WINNING_LINES`] order, with its owner.
    #[must_use]
    pub fn winner(&self) -> Option<(Mark, [Square; 3])> {
        WINNING_LINES.iter().find_map(|&line| {
            let [a, b, c] = line.map(|square| self.get(square));
            match a {
                Some(mark) if b == a && c == a => Some((mark, line)),
                _ => None,
            }
        })
    }
}

/// A human move submitted for arbitration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeRequest {
    /// The board before the move.
    pub grid: Board,
    /// The player making the move.
    pub current_player: Mark,
    /// The square being marked.
    #[serde(rename = "move")]
    pub player_move: Square,
}

/// Outcome of a turn, tagged on the wire by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TicTacToeResponse {
    /// The game goes on; the automated opponent played `next_move`.
    Move {
        /// The board after both moves.
        grid: Board,
        /// The opponent's square.
        next_move: Square,
    },
    /// Someone completed a line.
    Win {
        /// The final board.
        grid: Board,
        /// The player owning the line.
        winner: Mark,
        /// The completed line, in [`WINNING_LINES`] order.
        winning_line: [Square; 3],
    },
    /// The board is full with no line.
    Draw {
        /// The final board.
        grid: Board,
    },
}

impl TicTacToeResponse {
    /// The board carried by the response.
    #[must_use]
    pub const fn grid(&self) -> &Board {
        match self {
            Self::Move { grid, .. } | Self::Win { grid, .. } | Self::Draw { grid } => grid,
        }
    }
}

/// Play one turn: the human move, then the opponent's reply if the game is
/// still open.
///
/// # Errors
///
/// Returns [`GameError::MoveOutOfRange`] for an off-board square,
/// [`GameError::GameOver`] if the board already has a winner, and
/// [`GameError::CellOccupied`] if the square is taken.
pub fn play(request: &TicTacToeRequest) -> Result<TicTacToeResponse, GameError> {
    let square = request.player_move;
    if !square.is_on_board() {
        return Err(GameError::MoveOutOfRange { square });
    }
    let mut grid = request.grid;
    if let Some((winner, _)) = grid.winner() {
        return Err(GameError::GameOver { winner });
    }
    if let Some(mark) = grid.get(square) {
        return Err(GameError::CellOccupied { square, mark });
    }

    grid.place(square, request.current_player);
    if let Some((winner, winning_line)) = grid.winner() {
        return Ok(TicTacToeResponse::Win {
            grid,
            winner,
            winning_line,
        });
    }
    if grid.is_full() {
        return Ok(TicTacToeResponse::Draw { grid });
    }

    let Some(next_move) = grid.first_empty() else {
        unreachable!("a board that is not full has an empty square");
    };
    grid.place(next_move, request.current_player.opponent());
    if let Some((winner, winning_line)) = grid.winner() {
        return Ok(TicTacToeResponse::Win {
            grid,
            winner,
            winning_line,
        });
    }
    Ok(TicTacToeResponse::Move { grid, next_move })
}
