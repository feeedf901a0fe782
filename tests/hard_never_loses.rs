use rand::SeedableRng;
use rand::rngs::StdRng;

use tris::game::{Difficulty, Engine, GameOutcome, GameSession, Mark, Phase};

/// Walks every line of human play against `engine`, returning (games, computer wins).
fn explore(session: GameSession, engine: &mut Engine<StdRng>) -> (usize, usize) {
    match session.phase() {
        Phase::HumanTurn => session
            .board()
            .empty_cells()
            .into_iter()
            .map(|index| explore(session.submit_human_move(index), engine))
            .fold((0, 0), |(games, wins), (g, w)| (games + g, wins + w)),
        Phase::ComputerTurn => {
            let next = session.play_computer_turn(engine);
            assert_ne!(next, session, "computer passed on\n{}", session.board());
            explore(next, engine)
        }
        Phase::Finished(outcome) => {
            assert_ne!(
                outcome,
                GameOutcome::Win(Mark::X),
                "human won against hard:\n{}",
                session.board()
            );
            (1, usize::from(outcome == GameOutcome::Win(Mark::O)))
        }
    }
}

#[test]
fn hard_never_loses_to_any_human_line() {
    let mut engine = Engine::with_rng(StdRng::seed_from_u64(0));
    let (games, wins) = explore(GameSession::new(Difficulty::Hard), &mut engine);
    assert!(games > 0);
    // Careless human lines must be punished.
    assert!(wins > 0);
}

#[test]
fn medium_never_passes_on_a_live_board() {
    let mut engine = Engine::with_rng(StdRng::seed_from_u64(11));
    for _ in 0..50 {
        let mut session = GameSession::new(Difficulty::Medium);
        while let Phase::HumanTurn | Phase::ComputerTurn = session.phase() {
            session = match session.phase() {
                Phase::HumanTurn => session.submit_human_move(session.board().empty_cells()[0]),
                _ => session.play_computer_turn(&mut engine),
            };
            assert!(session.board().is_consistent());
        }
    }
}
