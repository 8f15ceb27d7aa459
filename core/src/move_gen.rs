use crate::position::Position;
use crate::rules::RuleSet;
use crate::types::{Color, Move, PieceType, Square, Variant};

pub(crate) const STRAIGHT_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
pub(crate) const DIAGONAL_DIRS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
pub(crate) const ALL_DIRS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];
pub(crate) const KING_DELTAS: [(i8, i8); 8] = ALL_DIRS;

const SINGLE_FILE_KNIGHT_DELTAS: [(i8, i8); 2] = [(0, -2), (0, 2)];
const L_KNIGHT_DELTAS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// Knight jumps for a variant: two cells along the file on the single
/// file, the usual L-shape otherwise.
pub(crate) fn knight_deltas(variant: Variant) -> &'static [(i8, i8)] {
    match variant {
        Variant::SingleFile => &SINGLE_FILE_KNIGHT_DELTAS,
        Variant::TwoFile => &L_KNIGHT_DELTAS,
    }
}

/// A list of moves for one position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveList {
    moves: Vec<Move>,
}

impl MoveList {
    /// Creates an empty move list.
    pub fn new() -> Self {
        Self {
            moves: Vec::with_capacity(32),
        }
    }

    /// Adds a move to the list.
    pub fn push(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    /// Returns the number of moves.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Returns true if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Returns an iterator over the moves.
    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter()
    }

    pub fn contains(&self, mv: &Move) -> bool {
        self.moves.contains(mv)
    }

    pub fn as_slice(&self) -> &[Move] {
        &self.moves
    }

    pub fn into_vec(self) -> Vec<Move> {
        self.moves
    }
}

impl IntoIterator for MoveList {
    type Item = Move;
    type IntoIter = std::vec::IntoIter<Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.into_iter()
    }
}

/// Generates all legal moves for the current position under the given rules.
pub fn generate_legal_moves(position: &Position, rules: &RuleSet) -> MoveList {
    let mut moves = generate_pseudo_legal_moves(position, rules);
    filter_legal_moves(position, rules, &mut moves);
    moves
}

/// Returns true if `mv` is one of the legal moves in the position.
pub fn is_legal(position: &Position, rules: &RuleSet, mv: Move) -> bool {
    generate_legal_moves(position, rules).contains(&mv)
}

/// Generates all pseudo-legal moves (not checking for king safety).
fn generate_pseudo_legal_moves(position: &Position, rules: &RuleSet) -> MoveList {
    let mut moves = MoveList::new();
    let color = position.turn;

    for (from, piece) in position.board.pieces_of(color) {
        match piece.piece_type {
            PieceType::Pawn => generate_pawn_moves(position, rules, from, color, &mut moves),
            PieceType::Knight => generate_knight_moves(position, from, color, &mut moves),
            PieceType::Bishop => {
                generate_sliding_moves(position, from, color, &DIAGONAL_DIRS, &mut moves)
            }
            PieceType::Rook => {
                generate_sliding_moves(position, from, color, &STRAIGHT_DIRS, &mut moves)
            }
            PieceType::Queen => {
                generate_sliding_moves(position, from, color, &ALL_DIRS, &mut moves)
            }
            PieceType::King => generate_king_moves(position, from, color, &mut moves),
        }
    }

    if rules.castling {
        generate_castling_moves(position, color, &mut moves);
    }

    moves
}

/// Filters out moves that would leave the king in check.
fn filter_legal_moves(position: &Position, rules: &RuleSet, moves: &mut MoveList) {
    let mut legal_moves = MoveList::new();

    for &mv in moves.iter() {
        let new_position = position.apply_move(mv, rules);
        if !new_position.is_side_in_check(position.turn) {
            legal_moves.push(mv);
        }
    }

    *moves = legal_moves;
}

/// Pushes a pawn move, expanding it into one move per promotion piece
/// when it lands on the far rank with promotion enabled.
fn push_pawn_move(
    position: &Position,
    rules: &RuleSet,
    from: Square,
    to: Square,
    color: Color,
    moves: &mut MoveList,
) {
    let geometry = position.geometry();
    if rules.promotion && geometry.rank_of(to) == geometry.goal_rank(color) {
        for promotion in PieceType::PROMOTIONS {
            moves.push(Move::new_promotion(from, to, promotion));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}

/// Generates pawn moves for one pawn.
fn generate_pawn_moves(
    position: &Position,
    rules: &RuleSet,
    from: Square,
    color: Color,
    moves: &mut MoveList,
) {
    let geometry = position.geometry();
    let board = &position.board;
    let direction = color.pawn_direction();

    // Single push
    if let Some(to) = geometry.offset(from, 0, direction) {
        if board.is_empty(to) {
            push_pawn_move(position, rules, from, to, color, moves);

            // Double push from the start rank
            if rules.pawn_double_step && geometry.rank_of(from) == geometry.pawn_start_rank(color)
            {
                if let Some(double) = geometry.offset(to, 0, direction) {
                    if board.is_empty(double) {
                        push_pawn_move(position, rules, from, double, color, moves);
                    }
                }
            }
        }
    }

    // Captures
    for df in [-1, 1] {
        if let Some(to) = geometry.offset(from, df, direction) {
            if board.is_enemy(to, color) {
                push_pawn_move(position, rules, from, to, color, moves);
            } else if rules.en_passant && position.en_passant == Some(to) {
                moves.push(Move::new(from, to));
            }
        }
    }
}

/// Generates knight moves for one knight.
fn generate_knight_moves(position: &Position, from: Square, color: Color, moves: &mut MoveList) {
    let geometry = position.geometry();

    for &(df, dr) in knight_deltas(geometry.variant()) {
        if let Some(to) = geometry.offset(from, df, dr) {
            if !position.board.is_color(to, color) {
                moves.push(Move::new(from, to));
            }
        }
    }
}

/// Generates sliding piece moves along a set of directions.
fn generate_sliding_moves(
    position: &Position,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
    moves: &mut MoveList,
) {
    let geometry = position.geometry();

    for &(df, dr) in directions {
        let mut current = from;

        while let Some(to) = geometry.offset(current, df, dr) {
            current = to;
            if position.board.is_empty(to) {
                moves.push(Move::new(from, to));
            } else {
                if position.board.is_enemy(to, color) {
                    moves.push(Move::new(from, to));
                }
                break; // Can't move past any piece
            }
        }
    }
}

/// Generates king moves (excluding castling).
fn generate_king_moves(position: &Position, from: Square, color: Color, moves: &mut MoveList) {
    let geometry = position.geometry();

    for &(df, dr) in &KING_DELTAS {
        if let Some(to) = geometry.offset(from, df, dr) {
            if !position.board.is_color(to, color) {
                moves.push(Move::new(from, to));
            }
        }
    }
}

/// Generates castling moves for the given color on the single file.
///
/// King and rook must both be unmoved with at least two empty cells
/// between them. The king may not be in check, cross an attacked cell or
/// land on one.
fn generate_castling_moves(position: &Position, color: Color, moves: &mut MoveList) {
    let geometry = position.geometry();
    if geometry.variant() != Variant::SingleFile || position.castling.is_empty() {
        return;
    }

    let king_square = position.board.king_square(color);
    if !position.castling.contains(king_square) {
        return;
    }

    // Check if king is in check
    if position.is_attacked_by(king_square, color.opponent()) {
        return;
    }

    for rook_square in position.castling.iter() {
        let is_own_rook = position
            .board
            .piece_at(rook_square)
            .map_or(false, |p| p.color == color && p.piece_type == PieceType::Rook);
        if !is_own_rook {
            continue;
        }

        let king_rank = geometry.rank_of(king_square) as i16;
        let rook_rank = geometry.rank_of(rook_square) as i16;
        let step: i8 = if rook_rank > king_rank { 1 } else { -1 };
        let gap = (rook_rank - king_rank).abs() - 1;
        if gap < 2 {
            continue;
        }

        let all_empty = (1..=gap).all(|i| {
            geometry
                .offset(king_square, 0, step * i as i8)
                .map_or(false, |sq| position.board.is_empty(sq))
        });
        if !all_empty {
            continue;
        }

        let (Some(crossed), Some(landing)) = (
            geometry.offset(king_square, 0, step),
            geometry.offset(king_square, 0, 2 * step),
        ) else {
            continue;
        };

        // Check if squares king passes through are not attacked
        if !position.is_attacked_by(crossed, color.opponent())
            && !position.is_attacked_by(landing, color.opponent())
        {
            moves.push(Move::new(king_square, landing));
        }
    }
}

/// Checks if the current position is checkmate.
pub fn is_checkmate(position: &Position, rules: &RuleSet) -> bool {
    position.is_in_check() && generate_legal_moves(position, rules).is_empty()
}

/// Checks if the current position is stalemate.
pub fn is_stalemate(position: &Position, rules: &RuleSet) -> bool {
    !position.is_in_check() && generate_legal_moves(position, rules).is_empty()
}
