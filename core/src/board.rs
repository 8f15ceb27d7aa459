//! Cell-array board representation sized by its geometry.
use crate::types::*;

/// The cells of a reduced board, indexed by `Square::index()`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Board {
    geometry: Geometry,
    cells: Vec<Option<Piece>>,
}

impl Board {
    /// Creates an empty board.
    pub fn empty(geometry: Geometry) -> Self {
        Self {
            geometry,
            cells: vec![None; geometry.cells()],
        }
    }

    /// Creates a board from a full cell list. The caller guarantees the
    /// length matches the geometry.
    pub(crate) fn from_cells(geometry: Geometry, cells: Vec<Option<Piece>>) -> Self {
        debug_assert_eq!(cells.len(), geometry.cells());
        Self { geometry, cells }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Gets the piece at the given square.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.cells[square.index() as usize]
    }

    /// Sets the piece at the given square.
    pub fn set_piece(&mut self, square: Square, piece: Option<Piece>) {
        self.cells[square.index() as usize] = piece;
    }

    /// Moves a piece from one square to another.
    /// Returns the captured piece, if any.
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let piece = self.cells[from.index() as usize].take();
        std::mem::replace(&mut self.cells[to.index() as usize], piece)
    }

    /// Returns true if the given square is empty.
    pub fn is_empty(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    /// Returns true if the given square contains a piece of the given color.
    pub fn is_color(&self, square: Square, color: Color) -> bool {
        self.piece_at(square).map_or(false, |p| p.color == color)
    }

    /// Returns true if the given square contains an enemy piece.
    pub fn is_enemy(&self, square: Square, color: Color) -> bool {
        self.is_color(square, color.opponent())
    }

    /// Iterates over occupied squares with their pieces.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.map(|piece| (Square::from_index(i as u8), piece)))
    }

    /// Iterates over the squares holding pieces of the given color.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.pieces().filter(move |(_, p)| p.color == color)
    }

    /// Returns the raw cells in index order.
    pub fn cells(&self) -> &[Option<Piece>] {
        &self.cells
    }

    /// Counts the pieces of a color, king included.
    pub fn piece_count(&self, color: Color) -> usize {
        self.pieces_of(color).count()
    }

    /// Counts all pieces on the board.
    pub fn total_pieces(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Finds the king square for the given color.
    /// Panics if no king is found (invalid board state).
    pub fn king_square(&self, color: Color) -> Square {
        self.find_king(color)
            .unwrap_or_else(|| panic!("No king found for color {:?}", color))
    }

    /// Finds the king square, if there is one.
    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces_of(color)
            .find(|(_, p)| p.piece_type == PieceType::King)
            .map(|(sq, _)| sq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_piece_returns_capture() {
        let geometry = Geometry::single_file(5).unwrap();
        let mut board = Board::empty(geometry);
        let a = Square::from_index(0);
        let b = Square::from_index(4);
        board.set_piece(a, Some(Piece::new(PieceType::Rook, Color::White)));
        board.set_piece(b, Some(Piece::new(PieceType::Knight, Color::Black)));

        let captured = board.move_piece(a, b);
        assert_eq!(captured, Some(Piece::new(PieceType::Knight, Color::Black)));
        assert!(board.is_empty(a));
        assert!(board.is_color(b, Color::White));
        assert!(board.is_enemy(b, Color::Black));
        assert_eq!(board.total_pieces(), 1);
    }

    #[test]
    #[should_panic(expected = "No king found")]
    fn test_missing_king_panics() {
        let board = Board::empty(Geometry::standard(Variant::TwoFile));
        board.king_square(Color::White);
    }
}
