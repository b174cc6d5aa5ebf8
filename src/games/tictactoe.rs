//! Tic-tac-toe on a 3x3 board.
//!
//! Cells are indexed 0-8 row by row from the bottom-left, and written in
//! coordinate notation: `a1` is cell 0, `c3` is cell 8.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rules::Environment;

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

/// A mark on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    #[must_use]
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// Board position plus side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [Option<Mark>; 9],
    to_move: Mark,
}

impl Board {
    /// Empty board with X to move.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: [None; 9],
            to_move: Mark::X,
        }
    }

    /// Mark at a cell, if any.
    #[must_use]
    pub fn mark(&self, cell: Cell) -> Option<Mark> {
        self.cells.get(cell.index()).copied().flatten()
    }

    /// Side to move.
    #[must_use]
    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Three in a row, if any.
    #[must_use]
    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|&[a, b, c]| match self.cells[a] {
            Some(m) if self.cells[b] == Some(m) && self.cells[c] == Some(m) => Some(m),
            _ => None,
        })
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    fn empty_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_none())
            .map(|(i, _)| Cell(i as u8))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..3).rev() {
            for col in 0..3 {
                let c = match self.cells[row * 3 + col] {
                    Some(Mark::X) => 'X',
                    Some(Mark::O) => 'O',
                    None => '.',
                };
                write!(f, "{c}")?;
            }
            if row > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// A board cell, the action type of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell(u8);

impl Cell {
    /// Create a cell from its 0-8 index.
    ///
    /// Panics if `index >= 9`.
    #[must_use]
    pub fn new(index: u8) -> Self {
        assert!(index < 9, "cell index out of range: {index}");
        Self(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.0 % 3) as char;
        let rank = self.0 / 3 + 1;
        write!(f, "{file}{rank}")
    }
}

/// Error parsing a cell in coordinate notation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid cell {0:?}; expected a1..c3")]
pub struct ParseCellError(String);

impl FromStr for Cell {
    type Err = ParseCellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [file @ b'a'..=b'c', rank @ b'1'..=b'3'] => Ok(Cell((rank - b'1') * 3 + (file - b'a'))),
            _ => Err(ParseCellError(s.to_string())),
        }
    }
}

/// Tic-tac-toe environment.
///
/// A win pays +1 to the player who completed the line; a full board with
/// no line pays 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicTacToe;

impl TicTacToe {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Starting position.
    #[must_use]
    pub fn initial_state(&self) -> Board {
        Board::new()
    }
}

impl Environment for TicTacToe {
    type State = Board;
    type Action = Cell;

    fn transition(&self, state: &Board, action: &Cell) -> Board {
        if self.is_terminal(state) || state.mark(*action).is_some() {
            return *state;
        }
        let mut next = *state;
        next.cells[action.index()] = Some(state.to_move);
        next.to_move = state.to_move.opponent();
        next
    }

    fn actions(&self, state: &Board) -> Vec<Cell> {
        if self.is_terminal(state) {
            return Vec::new();
        }
        state.empty_cells().collect()
    }

    fn reward(&self, state: &Board) -> Option<f64> {
        if state.winner().is_some() {
            Some(1.0)
        } else if state.is_full() {
            Some(0.0)
        } else {
            None
        }
    }

    fn is_terminal(&self, state: &Board) -> bool {
        state.winner().is_some() || state.is_full()
    }

    fn action_space_size(&self) -> usize {
        9
    }

    fn action_index(&self, action: &Cell) -> Option<usize> {
        Some(action.index())
    }

    fn action_from_index(&self, index: usize) -> Option<Cell> {
        (index < 9).then(|| Cell(index as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(cells: &[u8]) -> Board {
        let env = TicTacToe::new();
        cells
            .iter()
            .fold(env.initial_state(), |s, &c| env.transition(&s, &Cell::new(c)))
    }

    #[test]
    fn test_initial_state() {
        let env = TicTacToe::new();
        let board = env.initial_state();

        assert_eq!(env.actions(&board).len(), 9);
        assert!(!env.is_terminal(&board));
        assert_eq!(env.reward(&board), None);
        assert_eq!(board.to_move(), Mark::X);
    }

    #[test]
    fn test_transition_alternates_players() {
        let board = play(&[4]);
        assert_eq!(board.mark(Cell::new(4)), Some(Mark::X));
        assert_eq!(board.to_move(), Mark::O);
    }

    #[test]
    fn test_occupied_cell_is_noop() {
        let env = TicTacToe::new();
        let board = play(&[4]);
        assert_eq!(env.transition(&board, &Cell::new(4)), board);
    }

    #[test]
    fn test_win_pays_mover() {
        let env = TicTacToe::new();
        let board = play(&[0, 3, 1, 4, 2]);

        assert_eq!(board.winner(), Some(Mark::X));
        assert!(env.is_terminal(&board));
        assert!(env.actions(&board).is_empty());
        assert_eq!(env.reward(&board), Some(1.0));
    }

    #[test]
    fn test_draw() {
        let env = TicTacToe::new();
        // X O X / X O O / O X X
        let board = play(&[0, 1, 2, 4, 3, 5, 7, 6, 8]);

        assert_eq!(board.winner(), None);
        assert!(board.is_full());
        assert_eq!(env.reward(&board), Some(0.0));
    }

    #[test]
    fn test_consistency() {
        let env = TicTacToe::new();
        assert!(env.check_consistent(&play(&[])).is_ok());
        assert!(env.check_consistent(&play(&[0, 3, 1, 4, 2])).is_ok());
    }

    #[test]
    fn test_cell_notation() {
        assert_eq!(Cell::new(0).to_string(), "a1");
        assert_eq!(Cell::new(5).to_string(), "c2");
        assert_eq!("b3".parse::<Cell>(), Ok(Cell::new(7)));
        assert!("d1".parse::<Cell>().is_err());
        assert!("a".parse::<Cell>().is_err());
    }

    #[test]
    fn test_action_index_space() {
        let env = TicTacToe::new();
        for i in 0..9 {
            let cell = env.action_from_index(i).unwrap();
            assert_eq!(env.action_index(&cell), Some(i));
        }
        assert_eq!(env.action_from_index(9), None);
    }

    #[test]
    fn test_display() {
        let board = play(&[0, 8]);
        assert_eq!(board.to_string(), "..O\n...\nX..");
    }
}
