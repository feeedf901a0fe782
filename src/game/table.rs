use std::time::{Duration, Instant};

use tracing::{debug, error};

use super::{Board, Difficulty, Error, GameSession, Opponent, Phase};

/// Pause before the computer's reply lands, so the player can see it happen.
pub const REPLY_DELAY: Duration = Duration::from_millis(500);

/// A computer reply owed to the session at the time the ticket was issued.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ReplyTicket {
    epoch: u64,
    attempt: u32,
    board: Board,
    difficulty: Difficulty,
    due: Instant,
}

impl ReplyTicket {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Earliest instant the reply should be shown.
    pub fn due(&self) -> Instant {
        self.due
    }

    pub fn compute(&self, opponent: &mut impl Opponent) -> Result<usize, Error> {
        opponent.select_move(&self.board, self.difficulty)
    }
}

/// What became of a reply handed to [`Table::deliver`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Delivery {
    Applied,
    /// The ticket was issued before a reset or has already been answered.
    Stale,
    /// The session refused the reply; the ticket must be computed again.
    Retry(ReplyTicket),
}

/// Drives a [`GameSession`] for an interactive front end where the computer's
/// reply is computed elsewhere and arrives later.
///
/// Each reset starts a new epoch; replies ticketed in an older epoch are
/// dropped on delivery.
#[derive(Debug, Default)]
pub struct Table {
    session: GameSession,
    epoch: u64,
    pending: Option<ReplyTicket>,
}

impl Table {
    pub fn new(session: GameSession) -> Self {
        Self {
            session,
            epoch: 0,
            pending: None,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn is_thinking(&self) -> bool {
        self.pending.is_some()
    }

    /// Plays the human's cell. Returns the ticket for the computer's reply
    /// when the game goes on.
    pub fn human_move(&mut self, index: usize, now: Instant) -> Option<ReplyTicket> {
        let next = self.session.submit_human_move(index);
        if next == self.session {
            return None;
        }
        self.session = next;

        if next.phase() != Phase::ComputerTurn {
            return None;
        }

        let ticket = ReplyTicket {
            epoch: self.epoch,
            attempt: 0,
            board: *next.board(),
            difficulty: next.difficulty(),
            due: now + REPLY_DELAY,
        };
        self.pending = Some(ticket);
        Some(ticket)
    }

    /// Applies a computed reply.
    ///
    /// A reply the session refuses does not strand the game in the computer's
    /// turn: a fresh ticket replaces the pending one and is handed back so the
    /// front end can ask again.
    pub fn deliver(&mut self, ticket: ReplyTicket, reply: Result<usize, Error>) -> Delivery {
        if self.pending != Some(ticket) {
            debug!("ticket_epoch" = ticket.epoch, "epoch" = self.epoch, "stale_reply_discarded");
            return Delivery::Stale;
        }
        self.pending = None;

        match reply.and_then(|index| self.session.apply_computer_move(index)) {
            Ok(next) => {
                self.session = next;
                Delivery::Applied
            }
            Err(err) => {
                error!(%err, "computer_reply_rejected");
                debug_assert!(err != Error::NoMoveAvailable, "engine found no move on a live board");
                let retry = ReplyTicket {
                    attempt: ticket.attempt + 1,
                    due: Instant::now() + REPLY_DELAY,
                    ..ticket
                };
                self.pending = Some(retry);
                Delivery::Retry(retry)
            }
        }
    }

    /// Computes and applies the pending reply right away.
    pub fn play_pending(&mut self, opponent: &mut impl Opponent) -> Option<Delivery> {
        let ticket = self.pending?;
        let reply = ticket.compute(opponent);
        Some(self.deliver(ticket, reply))
    }

    pub fn reset(&mut self) {
        self.epoch += 1;
        self.pending = None;
        self.session = self.session.reset();
    }

    /// Only replies ticketed after this call use the new difficulty.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.session = self.session.with_difficulty(difficulty);
    }
}
