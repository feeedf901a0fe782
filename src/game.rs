use std::ops::Not;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

mod outcome;
mod searcher;
mod session;
mod table;

pub use outcome::{GameOutcome, LINES, evaluate, winning_line};
pub use searcher::{Depth, Difficulty, Engine, Searcher, select_move};
pub use session::{GameSession, Opponent, Phase};
pub use table::{Delivery, REPLY_DELAY, ReplyTicket, Table};

/// Number of cells on the board.
pub const CELLS: usize = 9;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
pub enum Mark {
    #[default]
    X,
    O,
}

pub const HUMAN_MARK: Mark = Mark::X;
pub const COMPUTER_MARK: Mark = Mark::O;

impl Not for Mark {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl std::fmt::Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mark::X => f.pad("X"),
            Mark::O => f.pad("O"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum InvalidMoveReason {
    #[display("index is outside 0..9")]
    OutOfRange,
    #[display("cell is already occupied")]
    Occupied,
    #[display("the game is already over")]
    GameOver,
    #[display("it is not this side's turn")]
    OutOfTurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum Error {
    #[display("invalid move at {index}: {reason}")]
    InvalidMove {
        index: usize,
        reason: InvalidMoveReason,
    },
    /// The engine was asked to move on a full or finished board.
    #[display("no move available")]
    NoMoveAvailable,
}

/// A 3x3 board stored row-major:
///
/// ```text
/// 0 1 2
/// 3 4 5
/// 6 7 8
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
pub struct Board {
    cells: [Option<Mark>; CELLS],
}

impl Board {
    /// Builds a board from raw cells without checking turn alternation.
    pub const fn from_cells(cells: [Option<Mark>; CELLS]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<Mark>; CELLS] {
        &self.cells
    }

    /// Mark at `index`, `None` for empty or out-of-range cells.
    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.cells.iter().filter(|&&cell| cell == Some(mark)).count()
    }

    /// Side to move: whoever has fewer marks, X on a tie.
    pub fn next_mark(&self) -> Mark {
        if self.count(Mark::X) > self.count(Mark::O) {
            Mark::O
        } else {
            Mark::X
        }
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Indices of the empty cells, ascending.
    pub fn empty_cells(&self) -> ArrayVec<usize, CELLS> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether X has made as many marks as O, or exactly one more.
    pub fn is_consistent(&self) -> bool {
        let (x, o) = (self.count(Mark::X), self.count(Mark::O));
        x == o || x == o + 1
    }

    /// Returns a copy of the board with `mark` placed at `index`.
    pub fn apply_move(&self, index: usize, mark: Mark) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidMove { index, reason };

        if index >= CELLS {
            return Err(invalid(InvalidMoveReason::OutOfRange));
        }
        if self.cells[index].is_some() {
            return Err(invalid(InvalidMoveReason::Occupied));
        }
        if evaluate(self).is_terminal() {
            return Err(invalid(InvalidMoveReason::GameOver));
        }

        Ok(self.place(index, mark))
    }

    /// Unchecked placement for the search, which only visits empty cells of
    /// non-terminal boards.
    fn place(&self, index: usize, mark: Mark) -> Self {
        let mut new_self = *self;
        new_self.cells[index] = Some(mark);
        new_self
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(3) {
            let [a, b, c] = [row[0], row[1], row[2]].map(|cell| match cell {
                Some(Mark::X) => 'X',
                Some(Mark::O) => 'O',
                None => '.',
            });
            writeln!(f, "{a} {b} {c}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::IndexedRandom;

    use super::*;

    const X: Option<Mark> = Some(Mark::X);
    const O: Option<Mark> = Some(Mark::O);
    const E: Option<Mark> = None;

    #[test]
    fn apply_move_leaves_input_untouched() {
        let board = Board::from_cells([X, E, E, E, O, E, E, E, E]);
        let before = board;

        let after = board.apply_move(8, Mark::X).unwrap();

        assert_eq!(board, before);
        for index in 0..CELLS {
            if index == 8 {
                assert_eq!(after.cell(index), Some(Mark::X));
            } else {
                assert_eq!(after.cell(index), board.cell(index));
            }
        }
    }

    #[test]
    fn apply_move_rejects_out_of_range() {
        let err = Board::default().apply_move(9, Mark::X).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidMove {
                index: 9,
                reason: InvalidMoveReason::OutOfRange
            }
        );
    }

    #[test]
    fn apply_move_rejects_occupied_cell() {
        let board = Board::default().apply_move(4, Mark::X).unwrap();
        let err = board.apply_move(4, Mark::O).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidMove {
                index: 4,
                reason: InvalidMoveReason::Occupied
            }
        );
    }

    #[test]
    fn apply_move_rejects_finished_board() {
        let board = Board::from_cells([X, X, X, O, O, E, E, E, E]);
        let err = board.apply_move(5, Mark::O).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidMove {
                index: 5,
                reason: InvalidMoveReason::GameOver
            }
        );
    }

    #[test]
    fn next_mark_follows_counts() {
        let board = Board::default();
        assert_eq!(board.next_mark(), Mark::X);
        let board = board.apply_move(0, Mark::X).unwrap();
        assert_eq!(board.next_mark(), Mark::O);
        let board = board.apply_move(1, Mark::O).unwrap();
        assert_eq!(board.next_mark(), Mark::X);
    }

    #[test]
    fn alternating_moves_keep_counts_balanced() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut board = Board::default();
            while !evaluate(&board).is_terminal() {
                let empty = board.empty_cells();
                let &index = empty.choose(&mut rng).unwrap();
                board = board.apply_move(index, board.next_mark()).unwrap();
                assert!(board.is_consistent(), "unbalanced board:\n{board}");
            }
        }
    }

    #[test]
    fn empty_cells_are_ascending() {
        let board = Board::from_cells([X, E, O, E, E, X, E, O, E]);
        assert_eq!(board.empty_cells().as_slice(), &[1, 3, 4, 6, 8]);
    }

    #[test]
    fn display_draws_grid() {
        let board = Board::from_cells([X, E, E, E, O, E, E, E, X]);
        assert_eq!(board.to_string(), "X . .\n. O .\n. . X\n");
    }

    #[test]
    fn mark_negation() {
        assert_eq!(!Mark::X, Mark::O);
        assert_eq!(!COMPUTER_MARK, HUMAN_MARK);
    }
}
