use crate::types::{Color, Piece, Square, Variant};
use thiserror::Error;

/// Rejected board dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("single-file board length must be within 3..=64, got {0}")]
    SingleFileLength(usize),
    #[error("two-file board must have 3..=32 ranks, got {0}")]
    TwoFileRanks(usize),
}

/// A position that breaks the board invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("board has {found} cells, expected {expected}")]
    CellCount { expected: usize, found: usize },
    #[error("{color} has {count} kings, expected exactly one")]
    KingCount { color: Color, count: usize },
    #[error("{piece} on square {square} is not allowed on the {variant} board")]
    PieceNotAllowed {
        piece: Piece,
        square: Square,
        variant: Variant,
    },
    #[error("pawn on square {0} stands on a back rank")]
    PawnOnBackRank(Square),
    #[error("{0} is in check although it is not their move")]
    OpponentInCheck(Color),
    #[error("square {0} is marked castling-eligible but holds no king or rook")]
    InvalidCastling(Square),
    #[error("square {0} is not a valid en passant target")]
    InvalidEnPassant(Square),
}

/// Failure to decode the canonical text form of a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("missing side-to-move field after ':'")]
    MissingSide,
    #[error("invalid side to move {0:?}, expected 'w' or 'b'")]
    InvalidSide(String),
    #[error("expected {expected} ranks separated by '/', got {found}")]
    RankCount { expected: usize, found: usize },
    #[error("rank {rank} has {found} cells, expected {expected}")]
    CellCount {
        rank: usize,
        expected: usize,
        found: usize,
    },
    #[error("invalid cell token {token:?} at cell {index}")]
    InvalidToken { index: usize, token: String },
    #[error("cell token {token:?} at cell {index} is not allowed on the {variant} board")]
    PieceNotAllowed {
        index: usize,
        token: String,
        variant: Variant,
    },
    #[error("unknown or misplaced field {0:?}")]
    InvalidField(String),
    #[error("invalid square index {0:?}")]
    InvalidSquare(String),
    #[error(transparent)]
    Position(#[from] PositionError),
}

/// Failure to parse a move written as `<from>-<to>[=<piece>]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("expected <from>-<to>[=<piece>], got {0:?}")]
    Format(String),
    #[error("invalid promotion piece {0:?}")]
    Promotion(String),
}
