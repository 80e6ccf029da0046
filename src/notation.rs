//! Text forms of moves.
//!
//! Peers exchange moves as `((r, c), (u, v))`, the raw row/column pairs of the
//! source and destination. The console also accepts the compact algebraic
//! form `e2e3`.

use std::fmt;
use std::str::FromStr;

use crate::board::Square;
use crate::error::ParseError;
use crate::movegen::Move;

impl Move {
    /// Algebraic form, e.g. `e2e3`.
    pub fn to_compact(&self) -> String {
        format!("{}{}", self.from, self.to)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "(({}, {}), ({}, {}))",
            self.from.row(),
            self.from.col(),
            self.to.row(),
            self.to.col()
        )
    }
}

impl FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::Move(s.to_string());
        let text = s.trim();

        if text.contains(',') {
            let numbers = text
                .split(|c: char| c == ',' || c == '(' || c == ')' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(|token| token.parse::<u8>().map_err(|_| err()))
                .collect::<Result<Vec<u8>, ParseError>>()?;
            let &[fr, fc, tr, tc] = numbers.as_slice() else {
                return Err(err());
            };
            let from = Square::new(fr, fc).ok_or_else(err)?;
            let to = Square::new(tr, tc).ok_or_else(err)?;
            return Ok(Move::new(from, to));
        }

        let compact: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if compact.len() != 4 || !compact.is_ascii() {
            return Err(err());
        }
        let from = compact[..2].parse::<Square>().map_err(|_| err())?;
        let to = compact[2..].parse::<Square>().map_err(|_| err())?;
        Ok(Move::new(from, to))
    }
}
