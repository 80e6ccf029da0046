use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{IntegrityError, ParseError};

pub const BOARD_SIZE: u8 = 8;

/// Placement string of the standard opening position.
pub const START_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Lowercase letter used in placement strings.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Row step of this color's pawns.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

impl FromStr for Color {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            _ => Err(ParseError::Color(s.to_string())),
        }
    }
}

/// A piece is a plain value: capturing replaces one value with another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// Uppercase for white, lowercase for black.
    pub fn symbol(&self) -> char {
        match self.color {
            Color::White => self.kind.letter().to_ascii_uppercase(),
            Color::Black => self.kind.letter(),
        }
    }

    fn from_symbol(symbol: char) -> Option<Self> {
        let kind = PieceKind::from_letter(symbol)?;
        let color = if symbol.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self.kind {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        };
        write!(f, "{} {}", self.color, name)
    }
}

/// Board coordinate. Row 0 is white's back rank, column 0 is the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Returns `None` when either axis is off the board.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        (row < BOARD_SIZE && col < BOARD_SIZE).then_some(Self { row, col })
    }

    /// Constructor for coordinates known to be on the board.
    ///
    /// # Panics
    /// Panics if `row` or `col` is not in `0..8`.
    pub const fn at(row: u8, col: u8) -> Self {
        assert!(row < BOARD_SIZE && col < BOARD_SIZE, "square off the board");
        Self { row, col }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// The square `(row + dr, col + dc)`, if it is still on the board.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Square> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..BOARD_SIZE as i8).contains(&row) && (0..BOARD_SIZE as i8).contains(&col) {
            Some(Square {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Square { row, col }))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, self.row + 1)
    }
}

impl FromStr for Square {
    type Err = ParseError;

    /// Accepts algebraic `e2` or a raw `row,col` pair such as `1,4` or `(1, 4)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseError::Square(s.to_string());
        let text = s.trim();

        if text.contains(',') {
            let inner = text.trim_start_matches('(').trim_end_matches(')');
            let (row, col) = inner.split_once(',').ok_or_else(err)?;
            let row: u8 = row.trim().parse().map_err(|_| err())?;
            let col: u8 = col.trim().parse().map_err(|_| err())?;
            return Square::new(row, col).ok_or_else(err);
        }

        let bytes = text.as_bytes();
        if bytes.len() != 2 {
            return Err(err());
        }
        let col = bytes[0].to_ascii_lowercase().checked_sub(b'a').ok_or_else(err)?;
        let row = bytes[1].checked_sub(b'1').ok_or_else(err)?;
        Square::new(row, col).ok_or_else(err)
    }
}

/// Square-indexed board plus a per-color index of occupied squares.
///
/// Both views describe the same position and are only ever changed together
/// through [`Board::put`] and [`Board::take`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
    index: [BTreeSet<Square>; 2],
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
            index: [BTreeSet::new(), BTreeSet::new()],
        }
    }

    /// White on rows 0-1, black on rows 6-7.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            let col = col as u8;
            board.put(Square::at(0, col), Piece::new(kind, Color::White));
            board.put(Square::at(1, col), Piece::new(PieceKind::Pawn, Color::White));
            board.put(Square::at(6, col), Piece::new(PieceKind::Pawn, Color::Black));
            board.put(Square::at(7, col), Piece::new(kind, Color::Black));
        }
        board
    }

    /// Parses a FEN-style placement: row 7 first, `/` between rows, digits
    /// for runs of empty squares. Each color must have exactly one king.
    pub fn from_placement(placement: &str) -> Result<Self, ParseError> {
        let rows: Vec<&str> = placement.trim().split('/').collect();
        if rows.len() != BOARD_SIZE as usize {
            return Err(ParseError::Placement(format!(
                "expected 8 rows, found {}",
                rows.len()
            )));
        }

        let mut board = Self::empty();
        for (i, text) in rows.iter().enumerate() {
            let row = BOARD_SIZE - 1 - i as u8;
            let mut col: u8 = 0;
            for c in text.chars() {
                if let Some(run) = c.to_digit(10) {
                    if !(1..=BOARD_SIZE as u32).contains(&run) {
                        return Err(ParseError::Placement(format!(
                            "empty run {run} outside 1..=8"
                        )));
                    }
                    col = col
                        .checked_add(run as u8)
                        .filter(|&end| end <= BOARD_SIZE)
                        .ok_or_else(|| {
                            ParseError::Placement(format!("row {row} is longer than 8 squares"))
                        })?;
                    continue;
                }
                let piece = Piece::from_symbol(c).ok_or_else(|| {
                    ParseError::Placement(format!("unknown piece letter {c:?}"))
                })?;
                let square = Square::new(row, col).ok_or_else(|| {
                    ParseError::Placement(format!("row {row} is longer than 8 squares"))
                })?;
                board.put(square, piece);
                col += 1;
            }
            if col != BOARD_SIZE {
                return Err(ParseError::Placement(format!(
                    "row {row} covers {col} squares"
                )));
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = board
                .squares_of(color)
                .iter()
                .filter(|&&sq| {
                    board
                        .piece_at(sq)
                        .map_or(false, |p| p.kind == PieceKind::King)
                })
                .count();
            if kings != 1 {
                return Err(ParseError::Placement(format!(
                    "{color} has {kings} kings"
                )));
            }
        }
        Ok(board)
    }

    /// Inverse of [`Board::from_placement`].
    pub fn placement(&self) -> String {
        let mut out = String::new();
        for row in (0..BOARD_SIZE).rev() {
            let mut empty = 0;
            for col in 0..BOARD_SIZE {
                match self.piece_at(Square::at(row, col)) {
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.symbol());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if row > 0 {
                out.push('/');
            }
        }
        out
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.row as usize][square.col as usize]
    }

    /// Squares currently held by `color`.
    pub fn squares_of(&self, color: Color) -> &BTreeSet<Square> {
        &self.index[color.index()]
    }

    pub fn piece_count(&self) -> usize {
        self.squares.iter().flatten().filter(|p| p.is_some()).count()
    }

    pub fn is_enemy(&self, square: Square, color: Color) -> bool {
        self.piece_at(square).map_or(false, |p| p.color != color)
    }

    pub fn king_square(&self, color: Color) -> Result<Square, IntegrityError> {
        self.squares_of(color)
            .iter()
            .copied()
            .find(|&sq| self.piece_at(sq) == Some(Piece::new(PieceKind::King, color)))
            .ok_or(IntegrityError::MissingKing(color))
    }

    /// Places `piece` on `square`, evicting whatever stood there from both views.
    pub(crate) fn put(&mut self, square: Square, piece: Piece) {
        self.take(square);
        self.squares[square.row as usize][square.col as usize] = Some(piece);
        self.index[piece.color.index()].insert(square);
    }

    /// Empties `square` in both views, returning what stood there.
    pub(crate) fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.squares[square.row as usize][square.col as usize].take()?;
        self.index[piece.color.index()].remove(&square);
        Some(piece)
    }

    /// Verifies that the piece index and the square array describe the same
    /// position.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        let white = self.squares_of(Color::White);
        let black = self.squares_of(Color::Black);

        if let Some(&square) = white.intersection(black).next() {
            return Err(IntegrityError::SquareInBothSets(square));
        }

        for color in [Color::White, Color::Black] {
            for &square in self.squares_of(color) {
                match self.piece_at(square) {
                    None => return Err(IntegrityError::IndexNotOnBoard(square)),
                    Some(piece) if piece.color != color => {
                        return Err(IntegrityError::IndexColorMismatch {
                            square,
                            expected: color,
                        })
                    }
                    Some(_) => {}
                }
            }
        }

        let indexed = white.len() + black.len();
        let occupied = self.piece_count();
        if indexed != occupied {
            return Err(IntegrityError::IndexCountMismatch { indexed, occupied });
        }
        Ok(())
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for row in (0..BOARD_SIZE).rev() {
            result.push((b'1' + row) as char);
            result.push(' ');
            for col in 0..BOARD_SIZE {
                let symbol = self
                    .piece_at(Square::at(row, col))
                    .map_or('.', |p| p.symbol());
                result.push(symbol);
                if col < BOARD_SIZE - 1 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        result.push_str("  a b c d e f g h\n");
        write!(f, "{}", result)
    }
}
