//! The rules engine: board ownership, the make/unmake protocol, and check and
//! checkmate detection.
//!
//! Legality is decided by simulation. A candidate move is applied to the real
//! board, the mover's king is tested, and the move is either kept or undone
//! with [`RulesEngine::rollback`]. Every apply/rollback pair is followed by an
//! integrity check of the board's two views.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, trace};

use crate::board::{Board, Color, Piece, Square};
use crate::error::{IntegrityError, ParseError};
use crate::movegen::{pseudo_legal_moves, Move};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The source square is empty.
    NoPiece,
    /// The piece on the source square belongs to the side not on move.
    WrongTurn,
    /// Source and destination are the same square.
    NullMove,
    /// The destination is not in the piece's move set.
    Unreachable,
    /// The move would leave the mover's own king in check.
    SelfCheck,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            RejectReason::NoPiece => "no piece on the source square",
            RejectReason::WrongTurn => "that piece does not belong to the side to move",
            RejectReason::NullMove => "source and destination are the same square",
            RejectReason::Unreachable => "the piece cannot reach that square",
            RejectReason::SelfCheck => "the move would leave the king in check",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    Applied,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub status: MoveStatus,
    /// Piece removed from the destination. For a self-check rejection out of
    /// [`RulesEngine::apply_tentative`] this is the capture that would have
    /// happened; it has already been put back.
    pub captured: Option<Piece>,
}

impl MoveOutcome {
    fn applied(captured: Option<Piece>) -> Self {
        Self {
            status: MoveStatus::Applied,
            captured,
        }
    }

    fn rejected(reason: RejectReason) -> Self {
        Self {
            status: MoveStatus::Rejected(reason),
            captured: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.status == MoveStatus::Applied
    }
}

/// Owns the board and the side to move.
///
/// Not internally synchronized: even read-style queries such as
/// [`RulesEngine::legal_moves`] mutate the board while simulating, so callers
/// sharing an engine must serialize access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesEngine {
    board: Board,
    turn: Color,
}

impl RulesEngine {
    /// Standard starting position, white to move.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Color::White,
        }
    }

    /// Sets up a position with `turn` to move. The side not on move may not
    /// already be in check, since its king could then be captured.
    pub fn from_placement(placement: &str, turn: Color) -> Result<Self, ParseError> {
        let engine = Self {
            board: Board::from_placement(placement)?,
            turn,
        };
        let waiting = turn.opposite();
        let exposed = engine
            .is_in_check(waiting)
            .map_err(|e| ParseError::Placement(e.to_string()))?;
        if exposed {
            return Err(ParseError::Placement(format!(
                "{waiting} is in check but it is {turn} to move"
            )));
        }
        Ok(engine)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.piece_at(square)
    }

    pub fn turn_color(&self) -> Color {
        self.turn
    }

    /// Plays `from -> to` for the side to move and passes the turn if the move
    /// is legal. A rejected move leaves board and turn untouched and reports no
    /// capture.
    pub fn make_move(&mut self, from: Square, to: Square) -> Result<MoveOutcome, IntegrityError> {
        let outcome = self.apply_tentative(from, to)?;
        match outcome.status {
            MoveStatus::Applied => {
                debug!(
                    "{} played {} -> {}{}",
                    self.turn,
                    from,
                    to,
                    outcome
                        .captured
                        .map(|p| format!(" capturing {}", p))
                        .unwrap_or_default()
                );
                self.turn = self.turn.opposite();
                Ok(outcome)
            }
            MoveStatus::Rejected(reason) => {
                debug!("rejected {} -> {}: {}", from, to, reason);
                Ok(MoveOutcome::rejected(reason))
            }
        }
    }

    /// Applies `from -> to` without passing the turn.
    ///
    /// On [`MoveStatus::Applied`] the move stays on the board and must be undone
    /// with [`RulesEngine::rollback`] using the returned capture. Any rejection
    /// leaves the board as it was.
    pub fn apply_tentative(
        &mut self,
        from: Square,
        to: Square,
    ) -> Result<MoveOutcome, IntegrityError> {
        let Some(piece) = self.board.piece_at(from) else {
            return Ok(MoveOutcome::rejected(RejectReason::NoPiece));
        };
        if piece.color != self.turn {
            return Ok(MoveOutcome::rejected(RejectReason::WrongTurn));
        }
        self.simulate(from, to)
    }

    /// Undoes a move that moved a piece from `moved_from` to `moved_to`,
    /// restoring `captured` on `moved_to`.
    pub fn rollback(
        &mut self,
        moved_to: Square,
        moved_from: Square,
        captured: Option<Piece>,
    ) -> Result<(), IntegrityError> {
        let piece = self
            .board
            .take(moved_to)
            .ok_or(IntegrityError::EmptyRollbackSquare(moved_to))?;
        if let Some(captured) = captured {
            self.board.put(moved_to, captured);
        }
        self.board.put(moved_from, piece);
        trace!("rolled back {} -> {}", moved_from, moved_to);
        self.board.check_integrity()
    }

    /// Move application shared by every caller. The turn is not consulted, so
    /// checkmate detection can test either color.
    fn simulate(&mut self, from: Square, to: Square) -> Result<MoveOutcome, IntegrityError> {
        if from == to {
            return Ok(MoveOutcome::rejected(RejectReason::NullMove));
        }
        let Some(piece) = self.board.piece_at(from) else {
            return Ok(MoveOutcome::rejected(RejectReason::NoPiece));
        };
        if !pseudo_legal_moves(&self.board, from).contains(&to) {
            return Ok(MoveOutcome::rejected(RejectReason::Unreachable));
        }

        let captured = if self.board.is_enemy(to, piece.color) {
            self.board.take(to)
        } else {
            None
        };
        self.board.take(from);
        self.board.put(to, piece);
        self.board.check_integrity()?;
        trace!("simulated {} -> {}", from, to);

        if self.is_in_check(piece.color)? {
            self.rollback(to, from, captured)?;
            return Ok(MoveOutcome {
                status: MoveStatus::Rejected(RejectReason::SelfCheck),
                captured,
            });
        }
        Ok(MoveOutcome::applied(captured))
    }

    /// Whether any opposing piece has `color`'s king square among its
    /// pseudo-legal destinations.
    pub fn is_in_check(&self, color: Color) -> Result<bool, IntegrityError> {
        let king = self.board.king_square(color)?;
        let attacked = self
            .board
            .squares_of(color.opposite())
            .iter()
            .any(|&sq| pseudo_legal_moves(&self.board, sq).contains(&king));
        Ok(attacked)
    }

    /// Legal destinations of the piece on `square`. Empty when the square is
    /// empty or holds a piece of the side not on move.
    pub fn legal_moves(&mut self, square: Square) -> Result<BTreeSet<Square>, IntegrityError> {
        match self.board.piece_at(square) {
            Some(piece) if piece.color == self.turn => self.trial_moves(square),
            _ => Ok(BTreeSet::new()),
        }
    }

    /// Every legal move of the side to move.
    pub fn all_legal_moves(&mut self) -> Result<Vec<Move>, IntegrityError> {
        let owned: Vec<Square> = self.board.squares_of(self.turn).iter().copied().collect();
        let mut moves = Vec::new();
        for from in owned {
            for to in self.trial_moves(from)? {
                moves.push(Move::new(from, to));
            }
        }
        Ok(moves)
    }

    /// Pseudo-legal destinations from `from` that survive a simulate/rollback
    /// trial.
    fn trial_moves(&mut self, from: Square) -> Result<BTreeSet<Square>, IntegrityError> {
        let mut legal = BTreeSet::new();
        for to in pseudo_legal_moves(&self.board, from) {
            let outcome = self.simulate(from, to)?;
            if outcome.is_applied() {
                self.rollback(to, from, outcome.captured)?;
                legal.insert(to);
            }
        }
        Ok(legal)
    }

    /// In check with no move of any `color` piece escaping it.
    pub fn is_checkmate(&mut self, color: Color) -> Result<bool, IntegrityError> {
        if !self.is_in_check(color)? {
            return Ok(false);
        }

        let owned: Vec<Square> = self.board.squares_of(color).iter().copied().collect();
        for from in owned {
            for to in pseudo_legal_moves(&self.board, from) {
                let outcome = self.simulate(from, to)?;
                if outcome.is_applied() {
                    self.rollback(to, from, outcome.captured)?;
                    trace!("{} escapes check with {} -> {}", color, from, to);
                    return Ok(false);
                }
            }
        }
        debug!("{} is checkmated", color);
        Ok(true)
    }

    /// The color whose opponent is checkmated, if any. Stalemate is not a result.
    pub fn winner(&mut self) -> Result<Option<Color>, IntegrityError> {
        if self.is_checkmate(Color::Black)? {
            Ok(Some(Color::White))
        } else if self.is_checkmate(Color::White)? {
            Ok(Some(Color::Black))
        } else {
            Ok(None)
        }
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RulesEngine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{} to move", self.board, self.turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PieceKind;

    fn sq(row: u8, col: u8) -> Square {
        Square::at(row, col)
    }

    #[test]
    fn test_rejections_leave_turn_and_board_alone() {
        let mut engine = RulesEngine::new();
        let before = engine.clone();

        let cases = [
            (sq(3, 3), sq(4, 3), RejectReason::NoPiece),
            (sq(6, 4), sq(5, 4), RejectReason::WrongTurn),
            (sq(1, 4), sq(1, 4), RejectReason::NullMove),
            (sq(1, 4), sq(3, 4), RejectReason::Unreachable),
            (sq(0, 0), sq(1, 0), RejectReason::Unreachable),
        ];
        for (from, to, reason) in cases {
            let outcome = engine.make_move(from, to).unwrap();
            assert_eq!(outcome.status, MoveStatus::Rejected(reason));
            assert_eq!(outcome.captured, None);
            assert_eq!(engine, before);
        }
    }

    #[test]
    fn test_capture_is_reported() {
        // white rook a1 takes the black rook on a8
        let mut engine = RulesEngine::from_placement("r3k3/8/8/8/8/8/8/R3K3", Color::White).unwrap();
        let outcome = engine.make_move(sq(0, 0), sq(7, 0)).unwrap();
        assert!(outcome.is_applied());
        assert_eq!(
            outcome.captured,
            Some(Piece::new(PieceKind::Rook, Color::Black))
        );
        assert_eq!(engine.board().squares_of(Color::Black).len(), 1);
        assert_eq!(engine.turn_color(), Color::Black);
        assert!(engine.is_in_check(Color::Black).unwrap());
    }

    #[test]
    fn test_tentative_then_rollback_restores_position() {
        let mut engine = RulesEngine::from_placement("r3k3/8/8/8/8/8/8/R3K3", Color::White).unwrap();
        let before = engine.clone();

        let outcome = engine.apply_tentative(sq(0, 0), sq(7, 0)).unwrap();
        assert!(outcome.is_applied());
        assert_ne!(engine, before);
        assert_eq!(engine.turn_color(), Color::White);

        engine.rollback(sq(7, 0), sq(0, 0), outcome.captured).unwrap();
        assert_eq!(engine, before);
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        // white bishop e2 pinned against the king by the rook on e7
        let mut engine =
            RulesEngine::from_placement("4k3/4r3/8/8/2n5/8/4B3/4K3", Color::White).unwrap();
        let before = engine.clone();

        let outcome = engine.apply_tentative(sq(1, 4), sq(3, 2)).unwrap();
        assert_eq!(outcome.status, MoveStatus::Rejected(RejectReason::SelfCheck));
        assert_eq!(
            outcome.captured,
            Some(Piece::new(PieceKind::Knight, Color::Black))
        );
        assert_eq!(engine, before);

        let outcome = engine.make_move(sq(1, 4), sq(3, 2)).unwrap();
        assert_eq!(outcome.status, MoveStatus::Rejected(RejectReason::SelfCheck));
        assert_eq!(outcome.captured, None);
        assert_eq!(engine, before);
        assert!(engine.legal_moves(sq(1, 4)).unwrap().is_empty());
    }

    #[test]
    fn test_king_cannot_step_into_attack() {
        let mut engine = RulesEngine::from_placement("4k3/8/8/8/8/8/8/3rK3", Color::White).unwrap();
        assert!(engine.is_in_check(Color::White).unwrap());
        // d1 rook covers row 0 and column 3; e2 and f2 are the only flights
        // besides capturing the rook itself
        let moves = engine.legal_moves(sq(0, 4)).unwrap();
        let expected: BTreeSet<Square> = [sq(0, 3), sq(1, 4), sq(1, 5)].into_iter().collect();
        assert_eq!(moves, expected);
    }

    #[test]
    fn test_legal_moves_empty_for_side_not_on_move() {
        let mut engine = RulesEngine::new();
        assert!(engine.legal_moves(sq(6, 4)).unwrap().is_empty());
        assert!(engine.legal_moves(sq(4, 4)).unwrap().is_empty());
        assert_eq!(engine.legal_moves(sq(1, 4)).unwrap().len(), 1);
    }

    #[test]
    fn test_initial_move_count() {
        let mut engine = RulesEngine::new();
        // eight single pawn steps plus four knight moves
        assert_eq!(engine.all_legal_moves().unwrap().len(), 12);
        assert_eq!(engine, RulesEngine::new());
    }

    #[test]
    fn test_check_requires_a_king() {
        let engine = RulesEngine::new();
        let mut board = engine.board().clone();
        board.take(sq(0, 4));
        let broken = RulesEngine {
            board,
            turn: Color::White,
        };
        assert_eq!(
            broken.is_in_check(Color::White),
            Err(IntegrityError::MissingKing(Color::White))
        );
    }

    #[test]
    fn test_placement_with_capturable_king_is_rejected() {
        // black king on e8 is attacked by the h8 rook with white to move
        assert!(matches!(
            RulesEngine::from_placement("4k2R/8/8/8/8/8/8/4K3", Color::White),
            Err(ParseError::Placement(_))
        ));
        // same position is fine when black is the side to answer the check
        let mut engine =
            RulesEngine::from_placement("4k2R/8/8/8/8/8/8/4K3", Color::Black).unwrap();
        assert!(engine.is_in_check(Color::Black).unwrap());
        assert_eq!(engine.winner().unwrap(), None);
    }

    #[test]
    fn test_rollback_on_empty_square_fails() {
        let mut engine = RulesEngine::new();
        assert_eq!(
            engine.rollback(sq(4, 4), sq(1, 4), None),
            Err(IntegrityError::EmptyRollbackSquare(sq(4, 4)))
        );
    }

    #[test]
    fn test_checkmate_in_corner() {
        // queen g7 guarded by the king on f6
        let mut engine = RulesEngine::from_placement("7k/6Q1/5K2/8/8/8/8/8", Color::Black).unwrap();
        assert!(engine.is_in_check(Color::Black).unwrap());
        assert!(engine.is_checkmate(Color::Black).unwrap());
        assert!(!engine.is_checkmate(Color::White).unwrap());
        assert_eq!(engine.winner().unwrap(), Some(Color::White));
        assert!(engine.all_legal_moves().unwrap().is_empty());
    }

    #[test]
    fn test_check_with_escape_is_not_mate() {
        // same attack but the queen is unguarded, so the king takes it
        let mut engine = RulesEngine::from_placement("7k/6Q1/8/8/8/8/8/K7", Color::Black).unwrap();
        assert!(engine.is_in_check(Color::Black).unwrap());
        assert!(!engine.is_checkmate(Color::Black).unwrap());
        assert_eq!(engine.winner().unwrap(), None);
        assert_eq!(
            engine.legal_moves(sq(7, 7)).unwrap(),
            [sq(6, 6)].into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn test_stalemate_is_not_a_win() {
        // black king h8 has no move and is not in check
        let mut engine = RulesEngine::from_placement("7k/5Q2/6K1/8/8/8/8/8", Color::Black).unwrap();
        assert!(!engine.is_in_check(Color::Black).unwrap());
        assert!(engine.all_legal_moves().unwrap().is_empty());
        assert_eq!(engine.winner().unwrap(), None);
    }
}
