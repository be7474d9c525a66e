//! # arcade_games
//!
//! The game logic offloaded from the arcade clients. Everything here is pure
//! computation over values: no I/O, no broker, no clock.
//!
//! This crate provides:
//!
//! - [`maze`]: randomized perfect-maze carving with hazard placement.
//! - [`tictactoe`]: board evaluation and the automated opponent.
//! - [`error`]: precondition failures shared by both games.

pub mod error;
pub mod maze;
pub mod tictactoe;

pub use error::GameError;
pub use maze::{Cell, Maze, MazeConfig, MazeRequest, MazeResponse, Position};
pub use tictactoe::{Board, Mark, Square, TicTacToeRequest, TicTacToeResponse, WINNING_LINES};
