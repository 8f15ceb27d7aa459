use minichess_core::{Color, Geometry, PieceType, Position, Square};

/// Score of a side that is mated on the spot. Mate found `n` plies from
/// the root scores `CHECKMATE_SCORE - n`.
pub const CHECKMATE_SCORE: i32 = 100_000;
pub const INFINITY: i32 = 1_000_000;
/// Any score beyond this magnitude is a forced mate or game win.
pub const MATE_THRESHOLD: i32 = CHECKMATE_SCORE - 1_000;

/// Below this much non-king material on the board the endgame terms apply.
const ENDGAME_MATERIAL: i32 = 1_300;

/// Returns true if the score is a forced win or loss.
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_THRESHOLD
}

/// Evaluates a position from the perspective of the side to move.
/// Returns a score in centipawns where positive values favor the side to move.
pub fn evaluate(position: &Position) -> i32 {
    let raw_eval = evaluate_absolute(position);

    // Return from perspective of side to move
    match position.turn {
        Color::White => raw_eval,
        Color::Black => -raw_eval,
    }
}

/// Evaluates a position from White's perspective.
/// Positive scores favor White, negative favor Black.
pub fn evaluate_absolute(position: &Position) -> i32 {
    let white_material = evaluate_material(position, Color::White);
    let black_material = evaluate_material(position, Color::Black);
    let endgame = white_material + black_material < ENDGAME_MATERIAL;

    let mut score = white_material - black_material;
    score += evaluate_piece_positions(position, Color::White, endgame);
    score -= evaluate_piece_positions(position, Color::Black, endgame);

    if endgame {
        if white_material > black_material {
            score += mop_up(position, Color::White);
        } else if black_material > white_material {
            score -= mop_up(position, Color::Black);
        }
    }

    score
}

/// Counts material value for a color.
fn evaluate_material(position: &Position, color: Color) -> i32 {
    position
        .board
        .pieces_of(color)
        .map(|(_, piece)| i32::from(piece.piece_type.value()))
        .sum()
}

/// Sums the piece-square bonuses for a color.
fn evaluate_piece_positions(position: &Position, color: Color, endgame: bool) -> i32 {
    let geometry = position.geometry();
    position
        .board
        .pieces_of(color)
        .map(|(square, piece)| piece_square_value(geometry, piece.piece_type, square, color, endgame))
        .sum()
}

/// Returns positional value for a piece on a given square.
///
/// The tables describe an 8×8 board. Narrower boards use the middle
/// columns; boards longer than eight ranks get no positional terms.
fn piece_square_value(
    geometry: Geometry,
    piece_type: PieceType,
    square: Square,
    color: Color,
    endgame: bool,
) -> i32 {
    if geometry.files() > 8 || geometry.ranks() > 8 {
        return 0;
    }

    let rank = geometry.rank_of(square);
    let column = (geometry.file_of(square) + (8 - geometry.files()) / 2) as usize;

    // Mirror the rank for black pieces within the actual board
    let rank_idx = match color {
        Color::White => rank,
        Color::Black => geometry.ranks() - 1 - rank,
    } as usize;

    match piece_type {
        PieceType::Pawn => PAWN_TABLE[rank_idx][column],
        PieceType::Knight => KNIGHT_TABLE[rank_idx][column],
        PieceType::Bishop => BISHOP_TABLE[rank_idx][column],
        PieceType::Rook => ROOK_TABLE[rank_idx][column],
        PieceType::Queen => QUEEN_TABLE[rank_idx][column],
        PieceType::King if endgame => KING_ENDGAME_TABLE[rank_idx][column],
        PieceType::King => KING_TABLE[rank_idx][column],
    }
}

/// Rewards the side ahead for driving the enemy king away from the centre
/// and bringing its own king closer.
fn mop_up(position: &Position, color: Color) -> i32 {
    let geometry = position.geometry();
    let (Some(own_king), Some(enemy_king)) = (
        position.board.find_king(color),
        position.board.find_king(color.opponent()),
    ) else {
        return 0;
    };

    let kings_distance = i32::from(geometry.distance(own_king, enemy_king));
    10 * center_distance(geometry, enemy_king) + 4 * (i32::from(geometry.ranks()) - kings_distance)
}

/// Distance from the centre of the board in whole cells.
fn center_distance(geometry: Geometry, square: Square) -> i32 {
    let rank = i32::from(geometry.rank_of(square));
    let file = i32::from(geometry.file_of(square));
    let rank_offset = (2 * rank - (i32::from(geometry.ranks()) - 1)).abs() / 2;
    let file_offset = (2 * file - (i32::from(geometry.files()) - 1)).abs() / 2;
    rank_offset + file_offset
}

// Piece-square tables (from the owner's perspective, rank 0 = home rank)
// Values are in centipawns

const PAWN_TABLE: [[i32; 8]; 8] = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [5, 10, 10, -20, -20, 10, 10, 5],
    [5, -5, -10, 0, 0, -10, -5, 5],
    [0, 0, 0, 20, 20, 0, 0, 0],
    [5, 5, 10, 25, 25, 10, 5, 5],
    [10, 10, 20, 30, 30, 20, 10, 10],
    [50, 50, 50, 50, 50, 50, 50, 50],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

const KNIGHT_TABLE: [[i32; 8]; 8] = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20, 0, 5, 5, 0, -20, -40],
    [-30, 5, 10, 15, 15, 10, 5, -30],
    [-30, 0, 15, 20, 20, 15, 0, -30],
    [-30, 5, 15, 20, 20, 15, 5, -30],
    [-30, 0, 10, 15, 15, 10, 0, -30],
    [-40, -20, 0, 0, 0, 0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

const BISHOP_TABLE: [[i32; 8]; 8] = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10, 5, 0, 0, 0, 0, 5, -10],
    [-10, 10, 10, 10, 10, 10, 10, -10],
    [-10, 0, 10, 10, 10, 10, 0, -10],
    [-10, 5, 5, 10, 10, 5, 5, -10],
    [-10, 0, 5, 10, 10, 5, 0, -10],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

const ROOK_TABLE: [[i32; 8]; 8] = [
    [0, 0, 0, 5, 5, 0, 0, 0],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [5, 10, 10, 10, 10, 10, 10, 5],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

const QUEEN_TABLE: [[i32; 8]; 8] = [
    [-20, -10, -10, -5, -5, -10, -10, -20],
    [-10, 0, 5, 0, 0, 0, 0, -10],
    [-10, 5, 5, 5, 5, 5, 0, -10],
    [0, 0, 5, 5, 5, 5, 0, -5],
    [-5, 0, 5, 5, 5, 5, 0, -5],
    [-10, 0, 5, 5, 5, 5, 0, -10],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-20, -10, -10, -5, -5, -10, -10, -20],
];

const KING_TABLE: [[i32; 8]; 8] = [
    [20, 30, 10, 0, 0, 10, 30, 20],
    [20, 20, 0, 0, 0, 0, 20, 20],
    [-10, -20, -20, -20, -20, -20, -20, -10],
    [-20, -30, -30, -40, -40, -30, -30, -20],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
];

const KING_ENDGAME_TABLE: [[i32; 8]; 8] = [
    [-50, -30, -30, -30, -30, -30, -30, -50],
    [-30, -30, 0, 0, 0, 0, -30, -30],
    [-30, -10, 20, 30, 30, 20, -10, -30],
    [-30, -10, 30, 40, 40, 30, -10, -30],
    [-30, -10, 30, 40, 40, 30, -10, -30],
    [-30, -10, 20, 30, 30, 20, -10, -30],
    [-30, -20, -10, 0, 0, -10, -20, -30],
    [-50, -40, -30, -20, -20, -30, -40, -50],
];

#[cfg(test)]
mod tests {
    use super::*;
    use minichess_core::Variant;

    fn two_file(text: &str) -> Position {
        Position::decode(text, Geometry::standard(Variant::TwoFile)).unwrap()
    }

    #[test]
    fn test_material_count() {
        let position = Position::start(Geometry::standard(Variant::TwoFile));

        // Each side starts with a rook and two pawns
        let white_material = evaluate_material(&position, Color::White);
        let black_material = evaluate_material(&position, Color::Black);
        assert_eq!(white_material, black_material);
        assert_eq!(white_material, 700);
    }

    #[test]
    fn test_symmetric_start_is_even() {
        let position = Position::start(Geometry::standard(Variant::TwoFile));
        assert_eq!(evaluate_absolute(&position), 0);
    }

    #[test]
    fn test_perspective_evaluation() {
        let position = Position::start(Geometry::standard(Variant::SingleFile));
        let white_eval = evaluate(&position);

        let mut black_to_move = position.clone();
        black_to_move.turn = Color::Black;
        assert_eq!(white_eval, -evaluate(&black_to_move));
    }

    #[test]
    fn test_material_advantage() {
        let position = two_file("bk,./.,./.,./.,./.,./.,wq/.,./wk,.:w");
        let eval = evaluate_absolute(&position);
        assert!(eval > 800, "K+Q vs K eval: {}", eval);
    }

    #[test]
    fn test_mop_up_prefers_cornered_king() {
        let cornered = two_file("bk,./.,./.,./.,./.,./.,./.,./wk,wr:w");
        let central = two_file(".,./.,./.,./bk,./.,./.,./.,./wk,wr:w");
        assert!(evaluate(&cornered) > evaluate(&central));
    }

    #[test]
    fn test_long_boards_skip_tables() {
        let geometry = Geometry::single_file(12).unwrap();
        let square = geometry.square_at(5).unwrap();
        assert_eq!(
            piece_square_value(geometry, PieceType::Knight, square, Color::White, false),
            0
        );

        let short = Geometry::standard(Variant::SingleFile);
        let square = short.square_at(0).unwrap();
        assert_eq!(
            piece_square_value(short, PieceType::Knight, square, Color::White, false),
            KNIGHT_TABLE[0][3]
        );
    }

    #[test]
    fn test_mate_scores() {
        assert!(is_mate_score(CHECKMATE_SCORE - 40));
        assert!(is_mate_score(-(CHECKMATE_SCORE - 40)));
        assert!(!is_mate_score(1_800));
    }
}
