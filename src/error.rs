use thiserror::Error;

use crate::board::{Color, Square};

/// Broken board bookkeeping. Once one of these surfaces the position can no
/// longer be trusted and the caller has to stop using the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("no {0} king on the board")]
    MissingKing(Color),
    #[error("rollback found no piece on {0}")]
    EmptyRollbackSquare(Square),
    #[error("indexed square {0} is empty on the board")]
    IndexNotOnBoard(Square),
    #[error("square {square} is indexed as {expected} but holds the other color")]
    IndexColorMismatch { square: Square, expected: Color },
    #[error("piece index covers {indexed} squares but the board holds {occupied} pieces")]
    IndexCountMismatch { indexed: usize, occupied: usize },
    #[error("square {0} is indexed for both colors")]
    SquareInBothSets(Square),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid square: {0:?}")]
    Square(String),
    #[error("invalid move: {0:?}")]
    Move(String),
    #[error("invalid placement: {0}")]
    Placement(String),
    #[error("invalid color: {0:?}")]
    Color(String),
}
