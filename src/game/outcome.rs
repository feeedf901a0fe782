use serde::{Deserialize, Serialize};

use super::{Board, Mark};

/// Winning lines in evaluation order: rows, columns, then diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GameOutcome {
    Ongoing,
    Win(Mark),
    Draw,
}

impl GameOutcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameOutcome::Ongoing)
    }

    pub fn winner(self) -> Option<Mark> {
        match self {
            GameOutcome::Win(mark) => Some(mark),
            GameOutcome::Ongoing | GameOutcome::Draw => None,
        }
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOutcome::Ongoing => f.pad("ongoing"),
            GameOutcome::Win(mark) => write!(f, "winner: {mark}"),
            GameOutcome::Draw => f.pad("draw"),
        }
    }
}

/// First line in [`LINES`] order holding three equal marks.
pub fn winning_line(board: &Board) -> Option<[usize; 3]> {
    LINES.into_iter().find(|&[a, b, c]| {
        board.cells[a].is_some()
            && board.cells[a] == board.cells[b]
            && board.cells[a] == board.cells[c]
    })
}

pub fn evaluate(board: &Board) -> GameOutcome {
    if let Some([a, _, _]) = winning_line(board)
        && let Some(mark) = board.cells[a]
    {
        return GameOutcome::Win(mark);
    }

    if board.is_full() {
        GameOutcome::Draw
    } else {
        GameOutcome::Ongoing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Option<Mark> = Some(Mark::X);
    const O: Option<Mark> = Some(Mark::O);
    const E: Option<Mark> = None;

    #[test]
    fn empty_board_is_ongoing() {
        assert_eq!(evaluate(&Board::default()), GameOutcome::Ongoing);
    }

    #[test]
    fn top_row_wins_for_x() {
        let board = Board::from_cells([X, X, X, O, O, E, E, E, E]);
        assert_eq!(evaluate(&board), GameOutcome::Win(Mark::X));
        assert_eq!(winning_line(&board), Some([0, 1, 2]));
    }

    #[test]
    fn full_board_without_line_is_draw() {
        let board = Board::from_cells([X, O, X, O, X, O, O, X, O]);
        assert_eq!(evaluate(&board), GameOutcome::Draw);
        assert_eq!(winning_line(&board), None);
    }

    #[test]
    fn full_board_with_line_is_win() {
        let board = Board::from_cells([X, O, X, O, X, O, O, X, X]);
        assert_eq!(evaluate(&board), GameOutcome::Win(Mark::X));
        assert_eq!(winning_line(&board), Some([0, 4, 8]));
    }

    #[test]
    fn column_and_anti_diagonal() {
        let column = Board::from_cells([X, O, X, E, O, E, X, O, E]);
        assert_eq!(evaluate(&column), GameOutcome::Win(Mark::O));
        assert_eq!(winning_line(&column), Some([1, 4, 7]));

        let anti = Board::from_cells([X, X, O, E, O, E, O, X, E]);
        assert_eq!(winning_line(&anti), Some([2, 4, 6]));
    }

    #[test]
    fn evaluate_is_repeatable() {
        let boards = [
            Board::default(),
            Board::from_cells([X, X, X, O, O, E, E, E, E]),
            Board::from_cells([X, O, X, O, X, O, O, X, O]),
            Board::from_cells([X, E, E, E, O, E, E, E, E]),
        ];
        for board in boards {
            let copy = board;
            assert_eq!(evaluate(&board), evaluate(&board));
            assert_eq!(board, copy);
        }
    }

    #[test]
    fn outcome_helpers() {
        assert!(!GameOutcome::Ongoing.is_terminal());
        assert!(GameOutcome::Draw.is_terminal());
        assert_eq!(GameOutcome::Win(Mark::O).winner(), Some(Mark::O));
        assert_eq!(GameOutcome::Draw.winner(), None);
        assert_eq!(GameOutcome::Win(Mark::X).to_string(), "winner: X");
    }
}
