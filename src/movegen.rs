//! Pseudo-legal move generation.
//!
//! Destinations follow each piece's movement shape and blocking rules only;
//! whether the move leaves the mover's own king attacked is decided by the
//! engine. Castling, en passant, double pawn pushes and promotion are not
//! generated.

use std::collections::BTreeSet;

use crate::board::{Board, Color, PieceKind, Square};

/// A `(from, to)` pair. Captures and checks are derived from the position,
/// never stored on the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }
}

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];
const KING_STEPS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Destinations of the piece on `from`, or an empty set for an empty square.
pub fn pseudo_legal_moves(board: &Board, from: Square) -> BTreeSet<Square> {
    let Some(piece) = board.piece_at(from) else {
        return BTreeSet::new();
    };
    let color = piece.color;

    match piece.kind {
        PieceKind::Pawn => pawn_moves(board, from, color),
        PieceKind::Knight => step_moves(board, from, color, &KNIGHT_JUMPS),
        PieceKind::Bishop => sliding_moves(board, from, color, &DIAGONAL),
        PieceKind::Rook => sliding_moves(board, from, color, &ORTHOGONAL),
        PieceKind::Queen => {
            let mut moves = sliding_moves(board, from, color, &ORTHOGONAL);
            moves.extend(sliding_moves(board, from, color, &DIAGONAL));
            moves
        }
        PieceKind::King => step_moves(board, from, color, &KING_STEPS),
    }
}

/// Walks each ray until the edge or the first occupied square; that square is
/// included only when it holds an enemy.
fn sliding_moves(
    board: &Board,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
) -> BTreeSet<Square> {
    let mut moves = BTreeSet::new();
    for &(dr, dc) in directions {
        let mut current = from;
        while let Some(next) = current.offset(dr, dc) {
            match board.piece_at(next) {
                None => {
                    moves.insert(next);
                    current = next;
                }
                Some(occupant) => {
                    if occupant.color != color {
                        moves.insert(next);
                    }
                    break;
                }
            }
        }
    }
    moves
}

/// Fixed offsets landing on an empty or enemy square.
fn step_moves(
    board: &Board,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
) -> BTreeSet<Square> {
    offsets
        .iter()
        .filter_map(|&(dr, dc)| from.offset(dr, dc))
        .filter(|&to| board.piece_at(to).map_or(true, |p| p.color != color))
        .collect()
}

/// One straight step onto an empty square, or one diagonal step onto an enemy.
fn pawn_moves(board: &Board, from: Square, color: Color) -> BTreeSet<Square> {
    let dr = color.forward();
    let mut moves = BTreeSet::new();

    if let Some(ahead) = from.offset(dr, 0) {
        if board.piece_at(ahead).is_none() {
            moves.insert(ahead);
        }
    }
    for dc in [-1, 1] {
        if let Some(target) = from.offset(dr, dc) {
            if board.is_enemy(target, color) {
                moves.insert(target);
            }
        }
    }
    moves
}
