use crate::error::{GeometryError, MoveParseError};
use std::fmt;
use std::str::FromStr;

/// Represents one of the two players.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    /// Returns the opposite color.
    pub const fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Returns the rank direction pawns of this color move in.
    pub const fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Returns the single-character token used in the position encoding.
    pub const fn to_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// The piece types the reduced-board variants use.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// Pieces a pawn may promote to, strongest first.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    /// Returns the material value of this piece type in centipawns.
    pub const fn value(self) -> u16 {
        match self {
            PieceType::Pawn => 100,
            PieceType::Knight => 320,
            PieceType::Bishop => 330,
            PieceType::Rook => 500,
            PieceType::Queen => 900,
            PieceType::King => 0, // King has no material value
        }
    }

    /// Returns true if this piece type can slide (bishop, rook, queen).
    pub const fn is_slider(self) -> bool {
        matches!(self, PieceType::Bishop | PieceType::Rook | PieceType::Queen)
    }

    pub const fn to_char(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceType::Pawn => "pawn",
            PieceType::Knight => "knight",
            PieceType::Bishop => "bishop",
            PieceType::Rook => "rook",
            PieceType::Queen => "queen",
            PieceType::King => "king",
        };
        f.write_str(name)
    }
}

/// A piece with both type and color.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
}

impl Piece {
    /// Creates a new piece with the given type and color.
    pub const fn new(piece_type: PieceType, color: Color) -> Self {
        Self { piece_type, color }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.piece_type)
    }
}

/// Which reduced board is being played.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Variant {
    /// A 1×N board: one file, N cells.
    SingleFile,
    /// An N×2 board: N ranks of two files.
    TwoFile,
}

impl Variant {
    /// Returns true if pieces of this type may appear on the variant's board.
    pub const fn allows(self, piece_type: PieceType) -> bool {
        match self {
            Variant::SingleFile => matches!(
                piece_type,
                PieceType::King | PieceType::Knight | PieceType::Rook
            ),
            Variant::TwoFile => true,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::SingleFile => f.write_str("single-file"),
            Variant::TwoFile => f.write_str("two-file"),
        }
    }
}

/// Board geometry: variant tag plus dimensions.
///
/// Squares are numbered `rank * files + file`, rank 0 being White's home rank.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Geometry {
    variant: Variant,
    files: u8,
    ranks: u8,
}

impl Geometry {
    pub const DEFAULT_LENGTH: u8 = 8;

    /// Creates a 1×`length` board.
    pub fn single_file(length: usize) -> Result<Self, GeometryError> {
        if !(3..=64).contains(&length) {
            return Err(GeometryError::SingleFileLength(length));
        }
        Ok(Self {
            variant: Variant::SingleFile,
            files: 1,
            ranks: length as u8,
        })
    }

    /// Creates a `ranks`×2 board.
    pub fn two_file(ranks: usize) -> Result<Self, GeometryError> {
        if !(3..=32).contains(&ranks) {
            return Err(GeometryError::TwoFileRanks(ranks));
        }
        Ok(Self {
            variant: Variant::TwoFile,
            files: 2,
            ranks: ranks as u8,
        })
    }

    /// Returns the variant's default board.
    pub const fn standard(variant: Variant) -> Self {
        match variant {
            Variant::SingleFile => Self {
                variant,
                files: 1,
                ranks: Self::DEFAULT_LENGTH,
            },
            Variant::TwoFile => Self {
                variant,
                files: 2,
                ranks: Self::DEFAULT_LENGTH,
            },
        }
    }

    pub const fn variant(self) -> Variant {
        self.variant
    }

    pub const fn files(self) -> u8 {
        self.files
    }

    pub const fn ranks(self) -> u8 {
        self.ranks
    }

    /// Total number of cells.
    pub const fn cells(self) -> usize {
        self.files as usize * self.ranks as usize
    }

    /// Returns the square at the given coordinates, if on the board.
    pub fn square(self, file: u8, rank: u8) -> Option<Square> {
        if file < self.files && rank < self.ranks {
            Some(Square(rank * self.files + file))
        } else {
            None
        }
    }

    /// Returns the square for a raw index, if on the board.
    pub fn square_at(self, index: usize) -> Option<Square> {
        if index < self.cells() {
            Some(Square(index as u8))
        } else {
            None
        }
    }

    pub const fn file_of(self, square: Square) -> u8 {
        square.0 % self.files
    }

    pub const fn rank_of(self, square: Square) -> u8 {
        square.0 / self.files
    }

    /// Returns the square reached by stepping `(df, dr)` from `square`.
    pub fn offset(self, square: Square, df: i8, dr: i8) -> Option<Square> {
        let file = self.file_of(square) as i8 + df;
        let rank = self.rank_of(square) as i8 + dr;
        if file < 0 || rank < 0 {
            return None;
        }
        self.square(file as u8, rank as u8)
    }

    /// Iterates over every square of the board in index order.
    pub fn squares(self) -> impl Iterator<Item = Square> {
        (0..self.cells() as u8).map(Square)
    }

    /// The rank a color starts on.
    pub const fn home_rank(self, color: Color) -> u8 {
        match color {
            Color::White => 0,
            Color::Black => self.ranks - 1,
        }
    }

    /// The far rank for a color: promotion rank and race goal.
    pub const fn goal_rank(self, color: Color) -> u8 {
        self.home_rank(color.opponent())
    }

    /// The rank a pawn may double-step from.
    pub const fn pawn_start_rank(self, color: Color) -> u8 {
        match color {
            Color::White => 1,
            Color::Black => self.ranks - 2,
        }
    }

    /// Chebyshev distance between two squares.
    pub fn distance(self, a: Square, b: Square) -> u8 {
        let df = self.file_of(a).abs_diff(self.file_of(b));
        let dr = self.rank_of(a).abs_diff(self.rank_of(b));
        df.max(dr)
    }
}

/// A square, identified by its index on the board.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Square(u8);

impl Square {
    /// Creates a square from a raw index. The index is not checked
    /// against any geometry; use [`Geometry::square_at`] for that.
    pub const fn from_index(index: u8) -> Self {
        Square(index)
    }

    /// Returns the square index.
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Squares whose king or rook has never moved.
/// A set bit means the piece there may still take part in castling.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct CastlingRights(u64);

impl CastlingRights {
    /// No piece is castling-eligible.
    pub const fn none() -> Self {
        CastlingRights(0)
    }

    pub const fn contains(self, square: Square) -> bool {
        (self.0 & (1u64 << square.0)) != 0
    }

    pub const fn with(self, square: Square) -> Self {
        CastlingRights(self.0 | (1u64 << square.0))
    }

    pub const fn without(self, square: Square) -> Self {
        CastlingRights(self.0 & !(1u64 << square.0))
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Updates the rights when a piece moves from one square to another.
    pub const fn update_after_move(self, from: Square, to: Square) -> Self {
        self.without(from).without(to)
    }

    /// Iterates over eligible squares in ascending order.
    pub fn iter(self) -> impl Iterator<Item = Square> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                None
            } else {
                let index = bits.trailing_zeros() as u8;
                bits &= bits - 1; // Clear lowest set bit
                Some(Square(index))
            }
        })
    }
}

/// A move: from-square, to-square and an optional promotion piece.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
}

impl Move {
    /// Creates a normal move.
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates a promotion move.
    pub const fn new_promotion(from: Square, to: Square, promotion: PieceType) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "={}", piece.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (squares, promotion) = match s.split_once('=') {
            Some((squares, piece)) => {
                let mut chars = piece.chars();
                let promotion = match (chars.next(), chars.next()) {
                    (Some(c), None) => PieceType::from_char(c.to_ascii_lowercase())
                        .filter(|p| PieceType::PROMOTIONS.contains(p))
                        .ok_or_else(|| MoveParseError::Promotion(piece.to_string()))?,
                    _ => return Err(MoveParseError::Promotion(piece.to_string())),
                };
                (squares, Some(promotion))
            }
            None => (s, None),
        };

        let (from, to) = squares
            .split_once('-')
            .ok_or_else(|| MoveParseError::Format(s.to_string()))?;
        let from = from
            .trim()
            .parse::<u8>()
            .map_err(|_| MoveParseError::Format(s.to_string()))?;
        let to = to
            .trim()
            .parse::<u8>()
            .map_err(|_| MoveParseError::Format(s.to_string()))?;

        Ok(Move {
            from: Square(from),
            to: Square(to),
            promotion,
        })
    }
}
