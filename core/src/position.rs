//! Complete position: board, side to move and the move state legality depends on.
use crate::board::Board;
use crate::error::PositionError;
use crate::move_gen::{knight_deltas, DIAGONAL_DIRS, KING_DELTAS, STRAIGHT_DIRS};
use crate::rules::RuleSet;
use crate::types::*;

/// A position on one of the reduced boards.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Position {
    /// The current board
    pub board: Board,
    /// Which side is to move
    pub turn: Color,
    /// Never-moved kings and rooks
    pub castling: CastlingRights,
    /// Square a pawn skipped over on the previous double step
    pub en_passant: Option<Square>,
}

impl Position {
    /// Creates a position with no castling or en passant state.
    /// The result is not validated.
    pub fn new(board: Board, turn: Color) -> Self {
        Self {
            board,
            turn,
            castling: CastlingRights::none(),
            en_passant: None,
        }
    }

    /// Creates the default start position for a geometry.
    ///
    /// Single file: `K N R . . n r k` (kings and rooks only below six cells).
    /// Two files: king and rook on the home rank with two pawns in front.
    pub fn start(geometry: Geometry) -> Self {
        let mut board = Board::empty(geometry);
        let mut place = |file: u8, rank: u8, piece_type: PieceType, color: Color| {
            if let Some(square) = geometry.square(file, rank) {
                board.set_piece(square, Some(Piece::new(piece_type, color)));
            }
        };
        let last = geometry.ranks() - 1;

        match geometry.variant() {
            Variant::SingleFile => {
                place(0, 0, PieceType::King, Color::White);
                place(0, last, PieceType::King, Color::Black);
                if geometry.ranks() >= 6 {
                    place(0, 1, PieceType::Knight, Color::White);
                    place(0, 2, PieceType::Rook, Color::White);
                    place(0, last - 2, PieceType::Knight, Color::Black);
                    place(0, last - 1, PieceType::Rook, Color::Black);
                } else if geometry.ranks() >= 4 {
                    place(0, 1, PieceType::Rook, Color::White);
                    place(0, last - 1, PieceType::Rook, Color::Black);
                }
            }
            Variant::TwoFile => {
                for color in Color::ALL {
                    let home = geometry.home_rank(color);
                    place(0, home, PieceType::King, color);
                    place(1, home, PieceType::Rook, color);
                    if geometry.ranks() >= 4 {
                        let pawn_rank = geometry.pawn_start_rank(color);
                        place(0, pawn_rank, PieceType::Pawn, color);
                        place(1, pawn_rank, PieceType::Pawn, color);
                    }
                }
            }
        }

        Self::new(board, Color::White)
    }

    /// Marks every king and rook on the board as never moved.
    pub fn mark_unmoved(&mut self) {
        let mut rights = CastlingRights::none();
        for (square, piece) in self.board.pieces() {
            if matches!(piece.piece_type, PieceType::King | PieceType::Rook) {
                rights = rights.with(square);
            }
        }
        self.castling = rights;
    }

    pub fn geometry(&self) -> Geometry {
        self.board.geometry()
    }

    /// Returns the side to move.
    pub fn side_to_move(&self) -> Color {
        self.turn
    }

    /// Checks the board invariants: one king per side, pieces within the
    /// variant's alphabet, pawns off their own back rank, consistent
    /// castling/en passant state and the side not to move out of check.
    pub fn validate(&self) -> Result<(), PositionError> {
        let geometry = self.geometry();
        if self.board.cells().len() != geometry.cells() {
            return Err(PositionError::CellCount {
                expected: geometry.cells(),
                found: self.board.cells().len(),
            });
        }

        let mut kings = [0usize; 2];
        for (square, piece) in self.board.pieces() {
            if !geometry.variant().allows(piece.piece_type) {
                return Err(PositionError::PieceNotAllowed {
                    piece,
                    square,
                    variant: geometry.variant(),
                });
            }
            match piece.piece_type {
                PieceType::King => kings[piece.color.index()] += 1,
                PieceType::Pawn => {
                    if geometry.rank_of(square) == geometry.home_rank(piece.color) {
                        return Err(PositionError::PawnOnBackRank(square));
                    }
                }
                _ => {}
            }
        }
        for color in Color::ALL {
            let count = kings[color.index()];
            if count != 1 {
                return Err(PositionError::KingCount { color, count });
            }
        }

        for square in self.castling.iter() {
            let holds_castler = geometry.square_at(square.index() as usize).is_some()
                && self.board.piece_at(square).map_or(false, |p| {
                    matches!(p.piece_type, PieceType::King | PieceType::Rook)
                });
            if !holds_castler {
                return Err(PositionError::InvalidCastling(square));
            }
        }

        if let Some(target) = self.en_passant {
            // The pawn that just double-stepped belongs to the side not to move
            let mover = self.turn.opponent();
            let valid = geometry
                .square_at(target.index() as usize)
                .filter(|&t| self.board.is_empty(t))
                .and_then(|t| geometry.offset(t, 0, mover.pawn_direction()))
                .map_or(false, |sq| {
                    self.board.piece_at(sq) == Some(Piece::new(PieceType::Pawn, mover))
                });
            if !valid {
                return Err(PositionError::InvalidEnPassant(target));
            }
        }

        if self.is_side_in_check(self.turn.opponent()) {
            return Err(PositionError::OpponentInCheck(self.turn.opponent()));
        }

        Ok(())
    }

    /// Applies a move to the position, returning a new position.
    /// This does NOT check if the move is legal.
    pub fn apply_move(&self, mv: Move, rules: &RuleSet) -> Self {
        let geometry = self.geometry();
        let mut new_position = self.clone();

        // Get the moving piece
        let piece = self
            .board
            .piece_at(mv.from)
            .expect("No piece at source square");

        if self.is_castle(mv, piece) {
            new_position.apply_castle(mv);
        } else {
            new_position.board.move_piece(mv.from, mv.to);

            // Handle en passant capture
            if piece.piece_type == PieceType::Pawn && Some(mv.to) == self.en_passant {
                if let Some(captured) = geometry.square(geometry.file_of(mv.to), geometry.rank_of(mv.from)) {
                    new_position.board.set_piece(captured, None);
                }
            }

            // Handle promotion
            if let Some(promotion) = mv.promotion {
                new_position
                    .board
                    .set_piece(mv.to, Some(Piece::new(promotion, piece.color)));
            }
        }

        // Update en passant square
        new_position.en_passant = None;
        if rules.en_passant
            && piece.piece_type == PieceType::Pawn
            && mv.promotion.is_none()
            && geometry.rank_of(mv.from).abs_diff(geometry.rank_of(mv.to)) == 2
        {
            new_position.en_passant =
                geometry.offset(mv.from, 0, piece.color.pawn_direction());
        }

        new_position.castling = new_position.castling.update_after_move(mv.from, mv.to);
        new_position.turn = self.turn.opponent();

        new_position
    }

    /// Returns true if the move resets the fifty-move clock:
    /// a capture (en passant included) or any pawn move.
    pub fn is_progress(&self, mv: Move) -> bool {
        let pawn_move = self
            .board
            .piece_at(mv.from)
            .map_or(false, |p| p.piece_type == PieceType::Pawn);
        let capture = self.board.is_enemy(mv.to, self.turn);
        pawn_move || capture
    }

    /// Returns true if the move captures a piece.
    pub fn is_capture(&self, mv: Move) -> bool {
        self.board.is_enemy(mv.to, self.turn)
            || (Some(mv.to) == self.en_passant
                && self
                    .board
                    .piece_at(mv.from)
                    .map_or(false, |p| p.piece_type == PieceType::Pawn))
    }

    /// A king moving two cells can only be castling.
    fn is_castle(&self, mv: Move, piece: Piece) -> bool {
        piece.piece_type == PieceType::King && self.geometry().distance(mv.from, mv.to) == 2
    }

    /// Moves the king two cells and puts the rook on the cell it crossed.
    fn apply_castle(&mut self, mv: Move) {
        let geometry = self.geometry();
        let step: i8 = if mv.to.index() > mv.from.index() { 1 } else { -1 };
        let crossed = geometry
            .offset(mv.from, 0, step)
            .expect("castling king crosses a square on the board");

        // The rook is the first piece beyond the king's destination
        let mut rook_from = mv.to;
        loop {
            rook_from = geometry
                .offset(rook_from, 0, step)
                .expect("castling rook must stand beyond the king");
            if !self.board.is_empty(rook_from) {
                break;
            }
        }

        self.board.move_piece(mv.from, mv.to);
        self.board.move_piece(rook_from, crossed);
        self.castling = self.castling.without(rook_from);
    }

    /// Returns true if the given square is attacked by the given color.
    pub fn is_attacked_by(&self, square: Square, attacker: Color) -> bool {
        self.is_pawn_attacked(square, attacker)
            || self.is_knight_attacked(square, attacker)
            || self.is_slider_attacked(square, attacker)
            || self.is_king_attacked(square, attacker)
    }

    fn has_piece(&self, square: Option<Square>, piece_type: PieceType, color: Color) -> bool {
        square.map_or(false, |sq| {
            self.board.piece_at(sq) == Some(Piece::new(piece_type, color))
        })
    }

    /// Returns true if the given square is attacked by enemy pawns.
    fn is_pawn_attacked(&self, square: Square, attacker: Color) -> bool {
        let geometry = self.geometry();
        // A pawn attacks diagonally forward, so look one rank behind the square
        let dr = -attacker.pawn_direction();
        [-1, 1].iter().any(|&df| {
            self.has_piece(geometry.offset(square, df, dr), PieceType::Pawn, attacker)
        })
    }

    /// Returns true if the given square is attacked by enemy knights.
    fn is_knight_attacked(&self, square: Square, attacker: Color) -> bool {
        let geometry = self.geometry();
        knight_deltas(geometry.variant()).iter().any(|&(df, dr)| {
            self.has_piece(geometry.offset(square, df, dr), PieceType::Knight, attacker)
        })
    }

    /// Returns true if the given square is attacked by enemy sliding pieces.
    fn is_slider_attacked(&self, square: Square, attacker: Color) -> bool {
        DIAGONAL_DIRS
            .iter()
            .any(|&(df, dr)| self.is_attacked_along_ray(square, df, dr, attacker, true))
            || STRAIGHT_DIRS
                .iter()
                .any(|&(df, dr)| self.is_attacked_along_ray(square, df, dr, attacker, false))
    }

    /// Checks if a square is attacked along a ray.
    fn is_attacked_along_ray(
        &self,
        square: Square,
        df: i8,
        dr: i8,
        attacker: Color,
        diagonal: bool,
    ) -> bool {
        let geometry = self.geometry();
        let mut current = square;

        while let Some(next) = geometry.offset(current, df, dr) {
            current = next;
            if let Some(piece) = self.board.piece_at(current) {
                if piece.color != attacker {
                    return false;
                }
                return match piece.piece_type {
                    PieceType::Queen => true,
                    PieceType::Bishop => diagonal,
                    PieceType::Rook => !diagonal,
                    _ => false,
                };
            }
        }

        false
    }

    /// Returns true if the given square is attacked by the enemy king.
    fn is_king_attacked(&self, square: Square, attacker: Color) -> bool {
        let geometry = self.geometry();
        KING_DELTAS.iter().any(|&(df, dr)| {
            self.has_piece(geometry.offset(square, df, dr), PieceType::King, attacker)
        })
    }

    /// Returns true if the current side to move is in check.
    pub fn is_in_check(&self) -> bool {
        self.is_side_in_check(self.turn)
    }

    /// Returns true if the given side is in check.
    pub fn is_side_in_check(&self, color: Color) -> bool {
        let king_square = self.board.king_square(color);
        self.is_attacked_by(king_square, color.opponent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_file(cells: &[Option<Piece>]) -> Position {
        let geometry = Geometry::single_file(cells.len()).unwrap();
        Position::new(Board::from_cells(geometry, cells.to_vec()), Color::White)
    }

    const WK: Option<Piece> = Some(Piece::new(PieceType::King, Color::White));
    const WR: Option<Piece> = Some(Piece::new(PieceType::Rook, Color::White));
    const WN: Option<Piece> = Some(Piece::new(PieceType::Knight, Color::White));
    const BK: Option<Piece> = Some(Piece::new(PieceType::King, Color::Black));
    const BN: Option<Piece> = Some(Piece::new(PieceType::Knight, Color::Black));

    #[test]
    fn test_start_positions_are_valid() {
        for geometry in [
            Geometry::standard(Variant::SingleFile),
            Geometry::standard(Variant::TwoFile),
            Geometry::single_file(3).unwrap(),
            Geometry::single_file(5).unwrap(),
            Geometry::two_file(3).unwrap(),
            Geometry::two_file(12).unwrap(),
        ] {
            let position = Position::start(geometry);
            assert_eq!(position.validate(), Ok(()), "{:?}", geometry);
        }
    }

    #[test]
    fn test_rook_attack_blocked_by_knight() {
        let position = single_file(&[WK, None, WR, WN, None, None, None, BK]);
        assert!(position.is_attacked_by(Square::from_index(3), Color::White));
        assert!(!position.is_attacked_by(Square::from_index(6), Color::White));
        // Knight on 3 covers 1 and 5
        assert!(position.is_attacked_by(Square::from_index(5), Color::White));
        assert!(position.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_king_counts() {
        let position = single_file(&[WK, None, WR, None, WK, None, None, BK]);
        assert_eq!(
            position.validate(),
            Err(PositionError::KingCount {
                color: Color::White,
                count: 2
            })
        );

        let position = single_file(&[WK, None, WR, None, None, None, None, None]);
        assert_eq!(
            position.validate(),
            Err(PositionError::KingCount {
                color: Color::Black,
                count: 0
            })
        );
    }

    #[test]
    fn test_validate_rejects_opponent_in_check() {
        // Rook sees the black king with White to move
        let position = single_file(&[WK, None, WR, None, None, None, None, BK]);
        assert_eq!(
            position.validate(),
            Err(PositionError::OpponentInCheck(Color::Black))
        );
    }

    #[test]
    fn test_apply_move_flips_turn_and_captures() {
        let rules = RuleSet::default();
        let position = single_file(&[WK, None, WR, None, None, BN, None, BK]);
        let mv = Move::new(Square::from_index(2), Square::from_index(5));
        assert!(position.is_capture(mv));
        assert!(position.is_progress(mv));

        let next = position.apply_move(mv, &rules);
        assert_eq!(next.turn, Color::Black);
        assert_eq!(next.board.piece_count(Color::Black), 1);
        assert_eq!(next.board.piece_at(Square::from_index(5)), WR);
        assert!(next.is_in_check());
    }
}
