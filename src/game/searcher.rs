use dashmap::DashMap;
use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{Board, COMPUTER_MARK, Error, GameOutcome, HUMAN_MARK, Opponent, evaluate};

/// Chance that Medium plays a uniformly random cell instead of searching.
pub const MEDIUM_RANDOM_CHANCE: f64 = 0.5;
/// Depth budget handed to the first minimizing level when Medium searches.
pub const MEDIUM_DEPTH: u8 = 1;

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Debug,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// Remaining lookahead for [`Searcher`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Depth {
    Unbounded,
    Plies(u8),
}

impl Depth {
    fn is_exhausted(self) -> bool {
        self == Depth::Plies(0)
    }

    fn next(self) -> Self {
        match self {
            Depth::Unbounded => Depth::Unbounded,
            Depth::Plies(plies) => Depth::Plies(plies.saturating_sub(1)),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct MemoKey {
    board: Board,
    maximizing: bool,
    depth: Depth,
}

/// Plain minimax from the computer's point of view: +1 when O wins, -1 when
/// X wins, 0 for draws and for positions where the depth budget runs out.
///
/// Subtree values are memoized per search. The values are exact, so the memo
/// only saves work and never changes which move is picked.
pub struct Searcher {
    memo: DashMap<MemoKey, i8>,
}

impl Searcher {
    fn new() -> Self {
        Self {
            memo: DashMap::new(),
        }
    }

    /// Score of every empty cell as a computer move, in index order.
    pub fn scores(board: &Board, depth: Depth) -> Vec<(usize, i8)> {
        let searcher = Self::new();

        board
            .empty_cells()
            .as_slice()
            .par_iter()
            .map(|&index| {
                let child = board.place(index, COMPUTER_MARK);
                let value = searcher.branch(&child, depth, false);
                debug!("index" = index, "value" = value, "computer_move_opportunity");
                (index, value)
            })
            .collect()
    }

    /// Best computer move and its score. Ties go to the lowest index.
    pub fn search(board: &Board, depth: Depth) -> Result<(usize, i8), Error> {
        if evaluate(board).is_terminal() {
            return Err(Error::NoMoveAvailable);
        }

        Self::scores(board, depth)
            .into_iter()
            .fold(None, |best, (index, value)| match best {
                Some((_, best_value)) if value <= best_value => best,
                _ => Some((index, value)),
            })
            .ok_or(Error::NoMoveAvailable)
    }

    fn branch(&self, node: &Board, depth: Depth, maximizing: bool) -> i8 {
        match evaluate(node) {
            GameOutcome::Win(mark) => return if mark == COMPUTER_MARK { 1 } else { -1 },
            GameOutcome::Draw => return 0,
            GameOutcome::Ongoing => {}
        }

        if depth.is_exhausted() {
            return 0;
        }

        let key = MemoKey {
            board: *node,
            maximizing,
            depth,
        };
        if let Some(value) = self.memo.get(&key).map(|entry| *entry) {
            return value;
        }

        let mark = if maximizing { COMPUTER_MARK } else { HUMAN_MARK };
        let values = node
            .empty_cells()
            .into_iter()
            .map(|index| self.branch(&node.place(index, mark), depth.next(), !maximizing));
        let value = if maximizing { values.max() } else { values.min() }.unwrap_or(0);

        self.memo.insert(key, value);
        value
    }
}

/// Picks the computer's cell for `board` at the given difficulty.
#[instrument(skip(rng))]
pub fn select_move<R: Rng>(
    board: &Board,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<usize, Error> {
    if evaluate(board).is_terminal() {
        return Err(Error::NoMoveAvailable);
    }

    let empty = board.empty_cells();
    let index = match difficulty {
        Difficulty::Easy => empty.choose(rng).copied().ok_or(Error::NoMoveAvailable)?,
        Difficulty::Medium if rng.random_bool(MEDIUM_RANDOM_CHANCE) => {
            debug!("medium_random_branch");
            empty.choose(rng).copied().ok_or(Error::NoMoveAvailable)?
        }
        Difficulty::Medium => Searcher::search(board, Depth::Plies(MEDIUM_DEPTH))?.0,
        Difficulty::Hard => Searcher::search(board, Depth::Unbounded)?.0,
    };

    debug!("index" = index, "computer_move_selected");
    Ok(index)
}

/// The production [`Opponent`]: [`select_move`] driven by its own RNG.
pub struct Engine<R = ThreadRng> {
    rng: R,
}

impl Engine {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Engine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Opponent for Engine<R> {
    fn select_move(&mut self, board: &Board, difficulty: Difficulty) -> Result<usize, Error> {
        select_move(board, difficulty, &mut self.rng)
    }
}
