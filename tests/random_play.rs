use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use duel_chess::board::{Color, Square};
use duel_chess::engine::{MoveStatus, RejectReason, RulesEngine};
use duel_chess::opponent::{MoveSource, RandomMover};

const MAX_PLIES: usize = 120;

fn assert_consistent(engine: &RulesEngine) {
    let board = engine.board();
    board.check_integrity().unwrap();
    for color in [Color::White, Color::Black] {
        board.king_square(color).unwrap();
        for &square in board.squares_of(color) {
            assert_eq!(board.piece_at(square).map(|p| p.color), Some(color));
        }
    }
    let occupied = Square::all().filter(|&sq| board.piece_at(sq).is_some()).count();
    assert_eq!(
        occupied,
        board.squares_of(Color::White).len() + board.squares_of(Color::Black).len()
    );
}

#[test]
fn invariants_hold_under_random_play() {
    for seed in 0..8 {
        let mut engine = RulesEngine::new();
        let mut mover = RandomMover::with_seed(seed);

        for _ in 0..MAX_PLIES {
            let Some(mv) = mover.choose_move(&mut engine).unwrap() else {
                break;
            };
            let turn = engine.turn_color();
            let outcome = engine.make_move(mv.from, mv.to).unwrap();
            assert!(outcome.is_applied());
            assert_eq!(engine.turn_color(), turn.opposite());
            assert!(!engine.is_in_check(turn).unwrap());
            assert_consistent(&engine);

            if engine.winner().unwrap().is_some() {
                break;
            }
        }
    }
}

#[test]
fn tentative_moves_roll_back_exactly() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut engine = RulesEngine::new();

    for _ in 0..60 {
        let moves = engine.all_legal_moves().unwrap();
        let Some(&chosen) = moves.choose(&mut rng) else {
            break;
        };

        for mv in &moves {
            let before = engine.clone();
            let outcome = engine.apply_tentative(mv.from, mv.to).unwrap();
            assert!(outcome.is_applied());
            assert_eq!(engine.turn_color(), before.turn_color());
            engine.rollback(mv.to, mv.from, outcome.captured).unwrap();
            assert_eq!(engine, before);
        }

        assert!(engine.make_move(chosen.from, chosen.to).unwrap().is_applied());
        if engine.winner().unwrap().is_some() {
            break;
        }
    }
}

#[test]
fn rejected_moves_never_change_state() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut engine = RulesEngine::new();
    let squares: Vec<Square> = Square::all().collect();

    for _ in 0..40 {
        for _ in 0..50 {
            let from = *squares.choose(&mut rng).unwrap();
            let to = *squares.choose(&mut rng).unwrap();
            let legal = engine.legal_moves(from).unwrap().contains(&to);
            if legal {
                continue;
            }
            let before = engine.clone();
            let outcome = engine.make_move(from, to).unwrap();
            assert!(matches!(outcome.status, MoveStatus::Rejected(_)));
            assert_eq!(outcome.captured, None);
            assert_eq!(engine, before);
        }

        let moves = engine.all_legal_moves().unwrap();
        let Some(mv) = moves.choose(&mut rng) else {
            break;
        };
        engine.make_move(mv.from, mv.to).unwrap();
        if engine.winner().unwrap().is_some() {
            break;
        }
    }
}

#[test]
fn self_check_rejection_restores_capture() {
    // the e2 bishop is pinned; taking the c4 knight would expose the king
    let mut engine = RulesEngine::from_placement("4k3/4r3/8/8/2n5/8/4B3/4K3", Color::White).unwrap();
    let before = engine.clone();

    let from = "e2".parse::<Square>().unwrap();
    let to = "c4".parse::<Square>().unwrap();
    let outcome = engine.make_move(from, to).unwrap();
    assert_eq!(outcome.status, MoveStatus::Rejected(RejectReason::SelfCheck));
    assert_eq!(engine, before);
    assert_consistent(&engine);
}
