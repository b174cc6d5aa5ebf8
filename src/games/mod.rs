//! Example environments.

pub mod tictactoe;

pub use tictactoe::{Board, Cell, Mark, ParseCellError, TicTacToe};
