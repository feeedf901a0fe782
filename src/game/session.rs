use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace};

use super::{
    Board, COMPUTER_MARK, Difficulty, Error, GameOutcome, HUMAN_MARK, InvalidMoveReason, Mark,
    evaluate,
};

/// Anything that can choose the computer's cell.
pub trait Opponent {
    fn select_move(&mut self, board: &Board, difficulty: Difficulty) -> Result<usize, Error>;
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    HumanTurn,
    ComputerTurn,
    Finished(GameOutcome),
}

/// One game against the computer.
///
/// Only the board and the difficulty are stored; turn, outcome and phase are
/// read off the board, so they cannot drift apart. Every operation takes the
/// session by value and returns the next one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
pub struct GameSession {
    board: Board,
    difficulty: Difficulty,
}

impl GameSession {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            board: Board::default(),
            difficulty,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn outcome(&self) -> GameOutcome {
        evaluate(&self.board)
    }

    pub fn turn(&self) -> Mark {
        self.board.next_mark()
    }

    pub fn phase(&self) -> Phase {
        match self.outcome() {
            GameOutcome::Ongoing if self.turn() == HUMAN_MARK => Phase::HumanTurn,
            GameOutcome::Ongoing => Phase::ComputerTurn,
            outcome => Phase::Finished(outcome),
        }
    }

    /// Like [`GameSession::submit_human_move`], but reports why a move was refused.
    pub fn try_human_move(self, index: usize) -> Result<Self, Error> {
        match self.phase() {
            Phase::HumanTurn => {}
            Phase::ComputerTurn => {
                return Err(Error::InvalidMove {
                    index,
                    reason: InvalidMoveReason::OutOfTurn,
                });
            }
            Phase::Finished(_) => {
                return Err(Error::InvalidMove {
                    index,
                    reason: InvalidMoveReason::GameOver,
                });
            }
        }

        let board = self.board.apply_move(index, HUMAN_MARK)?;
        info!("index" = index, "player_move_done");
        Ok(Self { board, ..self })
    }

    /// Plays X at `index`. Invalid input leaves the session unchanged.
    pub fn submit_human_move(self, index: usize) -> Self {
        self.try_human_move(index).unwrap_or_else(|err| {
            debug!(%err, "player_move_ignored");
            self
        })
    }

    /// Plays O at `index` if the computer is to move.
    pub fn apply_computer_move(self, index: usize) -> Result<Self, Error> {
        if self.phase() != Phase::ComputerTurn {
            return Err(Error::InvalidMove {
                index,
                reason: InvalidMoveReason::OutOfTurn,
            });
        }

        let board = self.board.apply_move(index, COMPUTER_MARK)?;
        info!("index" = index, "computer_move_done");
        Ok(Self { board, ..self })
    }

    /// Runs the automatic computer turn. Outside of `ComputerTurn` the
    /// opponent is never consulted.
    pub fn play_computer_turn(self, opponent: &mut impl Opponent) -> Self {
        if self.phase() != Phase::ComputerTurn {
            trace!(phase = ?self.phase(), "computer_turn_skipped");
            return self;
        }

        let result = opponent
            .select_move(&self.board, self.difficulty)
            .and_then(|index| self.apply_computer_move(index));

        match result {
            Ok(next) => next,
            Err(err) => {
                error!(%err, board = ?self.board, "computer_move_invalid");
                debug_assert!(err != Error::NoMoveAvailable, "engine found no move on a live board");
                self
            }
        }
    }

    pub fn reset(self) -> Self {
        info!("game_reset");
        Self::new(self.difficulty)
    }

    /// Changes the difficulty used by later computer moves.
    pub fn with_difficulty(self, difficulty: Difficulty) -> Self {
        Self { difficulty, ..self }
    }
}
