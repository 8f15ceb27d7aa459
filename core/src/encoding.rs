//! Canonical text form of a position.
//!
//! `<cells>:<side>[:c<idx>,<idx>...][:e<idx>]`
//!
//! The single file lists its cells from rank 0 upward separated by `,`.
//! The two-file board lists ranks from the top down, each rank as
//! `file0,file1`, ranks separated by `/`. A cell is `.` or a side letter
//! followed by a piece letter (`wk`, `bn`, ...).
use crate::board::Board;
use crate::error::EncodingError;
use crate::position::Position;
use crate::types::*;
use std::fmt;

impl Position {
    /// Parses a position in canonical form for the declared geometry.
    pub fn decode(text: &str, geometry: Geometry) -> Result<Self, EncodingError> {
        decode(text, geometry)
    }

    /// Converts the position to its canonical form.
    pub fn encode(&self) -> String {
        encode(self)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

/// Parses a position in canonical form. The result is validated.
pub fn decode(text: &str, geometry: Geometry) -> Result<Position, EncodingError> {
    let mut fields = text.trim().split(':');

    // `split` always yields at least one item
    let cells_field = fields.next().unwrap_or_default();
    let board = parse_cells(cells_field, geometry)?;

    let turn = match fields.next() {
        None => return Err(EncodingError::MissingSide),
        Some(side) => parse_side(side)?,
    };

    let mut position = Position::new(board, turn);

    // Optional fields, castling before en passant, each at most once
    let mut seen_castling = false;
    let mut seen_en_passant = false;
    for field in fields {
        if let Some(list) = field.strip_prefix('c') {
            if seen_castling || seen_en_passant {
                return Err(EncodingError::InvalidField(field.to_string()));
            }
            seen_castling = true;
            position.castling = parse_castling(list, field, geometry)?;
        } else if let Some(index) = field.strip_prefix('e') {
            if seen_en_passant {
                return Err(EncodingError::InvalidField(field.to_string()));
            }
            seen_en_passant = true;
            position.en_passant = Some(parse_square(index, geometry)?);
        } else {
            return Err(EncodingError::InvalidField(field.to_string()));
        }
    }

    position.validate()?;
    Ok(position)
}

/// Converts a position to its canonical form.
pub fn encode(position: &Position) -> String {
    let mut text = cells_to_string(&position.board);
    text.push(':');
    text.push(position.turn.to_char());

    if !position.castling.is_empty() {
        let squares: Vec<String> = position.castling.iter().map(|sq| sq.to_string()).collect();
        text.push_str(":c");
        text.push_str(&squares.join(","));
    }

    if let Some(square) = position.en_passant {
        text.push_str(&format!(":e{square}"));
    }

    text
}

/// Parses the board portion of the encoding.
fn parse_cells(text: &str, geometry: Geometry) -> Result<Board, EncodingError> {
    let files = geometry.files() as usize;
    let ranks = geometry.ranks() as usize;
    let mut cells = vec![None; geometry.cells()];

    // Rank strings in the order they appear in the text, paired with their rank
    let rank_strs: Vec<(usize, &str)> = match geometry.variant() {
        Variant::SingleFile => text.split(',').enumerate().collect(),
        Variant::TwoFile => {
            let parts: Vec<&str> = text.split('/').collect();
            if parts.len() != ranks {
                return Err(EncodingError::RankCount {
                    expected: ranks,
                    found: parts.len(),
                });
            }
            // The top rank comes first
            parts
                .into_iter()
                .enumerate()
                .map(|(i, part)| (ranks - 1 - i, part))
                .collect()
        }
    };

    match geometry.variant() {
        Variant::SingleFile => {
            if rank_strs.len() != ranks {
                return Err(EncodingError::CellCount {
                    rank: 0,
                    expected: ranks,
                    found: rank_strs.len(),
                });
            }
            for (rank, token) in rank_strs {
                cells[rank] = parse_token(token, rank, geometry)?;
            }
        }
        Variant::TwoFile => {
            for (rank, rank_str) in rank_strs {
                let tokens: Vec<&str> = rank_str.split(',').collect();
                if tokens.len() != files {
                    return Err(EncodingError::CellCount {
                        rank,
                        expected: files,
                        found: tokens.len(),
                    });
                }
                for (file, token) in tokens.into_iter().enumerate() {
                    let index = rank * files + file;
                    cells[index] = parse_token(token, index, geometry)?;
                }
            }
        }
    }

    Ok(Board::from_cells(geometry, cells))
}

/// Parses one cell token: `.` or side letter plus piece letter.
fn parse_token(token: &str, index: usize, geometry: Geometry) -> Result<Option<Piece>, EncodingError> {
    let token = token.trim();
    if token == "." {
        return Ok(None);
    }

    let invalid = || EncodingError::InvalidToken {
        index,
        token: token.to_string(),
    };

    let mut chars = token.chars();
    let (Some(side), Some(kind), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(invalid());
    };
    let color = Color::from_char(side).ok_or_else(invalid)?;
    let piece_type = PieceType::from_char(kind).ok_or_else(invalid)?;

    if !geometry.variant().allows(piece_type) {
        return Err(EncodingError::PieceNotAllowed {
            index,
            token: token.to_string(),
            variant: geometry.variant(),
        });
    }

    Ok(Some(Piece::new(piece_type, color)))
}

fn parse_side(text: &str) -> Result<Color, EncodingError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Color::from_char(c).ok_or_else(|| EncodingError::InvalidSide(text.to_string())),
        _ => Err(EncodingError::InvalidSide(text.to_string())),
    }
}

fn parse_square(text: &str, geometry: Geometry) -> Result<Square, EncodingError> {
    text.parse::<usize>()
        .ok()
        .and_then(|index| geometry.square_at(index))
        .ok_or_else(|| EncodingError::InvalidSquare(text.to_string()))
}

/// Parses the castling field: strictly ascending square indices.
fn parse_castling(
    list: &str,
    field: &str,
    geometry: Geometry,
) -> Result<CastlingRights, EncodingError> {
    if list.is_empty() {
        return Err(EncodingError::InvalidField(field.to_string()));
    }

    let mut rights = CastlingRights::none();
    let mut previous: Option<Square> = None;
    for part in list.split(',') {
        let square = parse_square(part, geometry)?;
        if previous.map_or(false, |prev| prev >= square) {
            return Err(EncodingError::InvalidField(field.to_string()));
        }
        previous = Some(square);
        rights = rights.with(square);
    }

    Ok(rights)
}

/// Converts a cell to its token.
fn cell_token(cell: Option<Piece>) -> String {
    match cell {
        None => ".".to_string(),
        Some(piece) => format!("{}{}", piece.color.to_char(), piece.piece_type.to_char()),
    }
}

/// Converts the board portion to text.
fn cells_to_string(board: &Board) -> String {
    let geometry = board.geometry();
    match geometry.variant() {
        Variant::SingleFile => board
            .cells()
            .iter()
            .map(|&cell| cell_token(cell))
            .collect::<Vec<_>>()
            .join(","),
        Variant::TwoFile => {
            let files = geometry.files() as usize;
            board
                .cells()
                .chunks(files)
                .rev()
                .map(|rank| {
                    rank.iter()
                        .map(|&cell| cell_token(cell))
                        .collect::<Vec<_>>()
                        .join(",")
                })
                .collect::<Vec<_>>()
                .join("/")
        }
    }
}
