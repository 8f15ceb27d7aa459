use crate::move_gen::{generate_legal_moves, is_checkmate};
use crate::position::Position;
use crate::rules::RuleSet;
use crate::types::{Move, PieceType};

/// Perft (performance test) results at each depth.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PerftResults {
    pub nodes: u64,
    pub captures: u64,
    pub en_passants: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftResults {
    /// Combines results from child nodes.
    pub fn add(&mut self, other: &Self) {
        self.nodes += other.nodes;
        self.captures += other.captures;
        self.en_passants += other.en_passants;
        self.castles += other.castles;
        self.promotions += other.promotions;
        self.checks += other.checks;
        self.checkmates += other.checkmates;
    }
}

/// Performs perft test to given depth and returns node count.
pub fn perft(position: &Position, rules: &RuleSet, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generate_legal_moves(position, rules);

    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves.iter() {
        let new_position = position.apply_move(*mv, rules);
        nodes += perft(&new_position, rules, depth - 1);
    }

    nodes
}

/// Performs perft with a per-move breakdown at the root.
pub fn perft_divide(position: &Position, rules: &RuleSet, depth: u8) -> Vec<(Move, u64)> {
    let moves = generate_legal_moves(position, rules);
    let mut results = Vec::new();

    for mv in moves.iter() {
        let new_position = position.apply_move(*mv, rules);
        let nodes = if depth <= 1 {
            1
        } else {
            perft(&new_position, rules, depth - 1)
        };
        results.push((*mv, nodes));
    }

    results
}

/// Performs perft test with detailed statistics.
pub fn perft_detailed(position: &Position, rules: &RuleSet, depth: u8) -> PerftResults {
    let mut results = PerftResults::default();

    if depth == 0 {
        results.nodes = 1;
        return results;
    }

    let geometry = position.geometry();
    let moves = generate_legal_moves(position, rules);

    for mv in moves.iter() {
        let new_position = position.apply_move(*mv, rules);

        if depth == 1 {
            results.nodes += 1;

            if position.is_capture(*mv) {
                results.captures += 1;
            }

            if let Some(piece) = position.board.piece_at(mv.from) {
                // A pawn moving diagonally onto an empty square
                if piece.piece_type == PieceType::Pawn
                    && geometry.file_of(mv.from) != geometry.file_of(mv.to)
                    && position.board.is_empty(mv.to)
                {
                    results.en_passants += 1;
                }

                if piece.piece_type == PieceType::King && geometry.distance(mv.from, mv.to) == 2 {
                    results.castles += 1;
                }
            }

            if mv.promotion.is_some() {
                results.promotions += 1;
            }
            if new_position.is_in_check() {
                results.checks += 1;
                if is_checkmate(&new_position, rules) {
                    results.checkmates += 1;
                }
            }
        } else {
            let child_results = perft_detailed(&new_position, rules, depth - 1);
            results.add(&child_results);
        }
    }

    results
}

/// Start position perft values under the default rules.
pub mod positions {
    /// Single file, eight cells.
    pub const SINGLE_FILE_START: &[(u8, u64)] =
        &[(1, 4), (2, 4), (3, 8), (4, 23), (5, 51), (6, 159)];

    /// Two files, eight ranks.
    pub const TWO_FILE_START: &[(u8, u64)] = &[(1, 4), (2, 16), (3, 76), (4, 356), (5, 2033)];
}
