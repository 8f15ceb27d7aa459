//! Game-end detection under a rule set.
use crate::history::History;
use crate::move_gen::{generate_legal_moves, MoveList};
use crate::position::Position;
use crate::rules::RuleSet;
use crate::types::{Color, PieceType};
use log::trace;
use std::fmt;

/// Halfmove clock value at which the fifty-move rule ends the game.
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// Why a game ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Termination {
    BackRankRace,
    Checkmate,
    MaterialCount,
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Termination::BackRankRace => "back rank reached",
            Termination::Checkmate => "checkmate",
            Termination::MaterialCount => "stalemate, won on material count",
            Termination::Stalemate => "stalemate",
            Termination::InsufficientMaterial => "insufficient material",
            Termination::FiftyMoveRule => "fifty-move rule",
            Termination::ThreefoldRepetition => "threefold repetition",
        };
        f.write_str(text)
    }
}

/// The result of a finished game. `winner` is `None` for a draw.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct GameOutcome {
    pub termination: Termination,
    pub winner: Option<Color>,
}

impl GameOutcome {
    pub const fn win(termination: Termination, winner: Color) -> Self {
        Self {
            termination,
            winner: Some(winner),
        }
    }

    pub const fn draw(termination: Termination) -> Self {
        Self {
            termination,
            winner: None,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.winner {
            Some(color) => write!(f, "{} wins by {}", color, self.termination),
            None => write!(f, "draw by {}", self.termination),
        }
    }
}

/// Classifies the position using the game record for the fifty-move and
/// repetition rules. Returns `None` while the game goes on.
pub fn terminal(position: &Position, rules: &RuleSet, history: &History) -> Option<GameOutcome> {
    let moves = generate_legal_moves(position, rules);
    let repetitions = if rules.threefold {
        history.repetitions(position)
    } else {
        1
    };
    let outcome = classify(position, rules, &moves, history.halfmove_clock(), repetitions);
    if let Some(outcome) = &outcome {
        trace!("{} is final: {}", position, outcome);
    }
    outcome
}

/// Classifies a position whose legal moves are already known.
///
/// Conditions are checked in a fixed order and the first one that holds
/// decides: back-rank race, checkmate, stalemate (or material-count win),
/// bare kings, fifty-move rule, threefold repetition.
pub fn classify(
    position: &Position,
    rules: &RuleSet,
    moves: &MoveList,
    halfmove_clock: u32,
    repetitions: usize,
) -> Option<GameOutcome> {
    if rules.race_to_back_rank {
        // The side that just moved gets there first
        let just_moved = position.turn.opponent();
        for color in [just_moved, position.turn] {
            if reached_goal_rank(position, color) {
                return Some(GameOutcome::win(Termination::BackRankRace, color));
            }
        }
    }

    if moves.is_empty() {
        if position.is_in_check() {
            return Some(GameOutcome::win(
                Termination::Checkmate,
                position.turn.opponent(),
            ));
        }

        if rules.material_count_win {
            let mover = position.board.piece_count(position.turn);
            let other = position.board.piece_count(position.turn.opponent());
            if mover != other {
                let winner = if mover > other {
                    position.turn
                } else {
                    position.turn.opponent()
                };
                return Some(GameOutcome::win(Termination::MaterialCount, winner));
            }
        }

        return Some(GameOutcome::draw(Termination::Stalemate));
    }

    if is_bare_kings(position) {
        return Some(GameOutcome::draw(Termination::InsufficientMaterial));
    }

    if rules.fifty_move && halfmove_clock >= FIFTY_MOVE_PLIES {
        return Some(GameOutcome::draw(Termination::FiftyMoveRule));
    }

    if rules.threefold && repetitions >= 3 {
        return Some(GameOutcome::draw(Termination::ThreefoldRepetition));
    }

    None
}

fn reached_goal_rank(position: &Position, color: Color) -> bool {
    let geometry = position.geometry();
    let goal = geometry.goal_rank(color);
    position
        .board
        .pieces_of(color)
        .any(|(square, _)| geometry.rank_of(square) == goal)
}

/// Only the two kings remain.
pub fn is_bare_kings(position: &Position) -> bool {
    position
        .board
        .pieces()
        .all(|(_, piece)| piece.piece_type == PieceType::King)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Geometry, Move, Square, Variant};

    fn single_file(text: &str) -> Position {
        Position::decode(text, Geometry::standard(Variant::SingleFile)).unwrap()
    }

    fn two_file(text: &str) -> Position {
        Position::decode(text, Geometry::standard(Variant::TwoFile)).unwrap()
    }

    fn outcome(position: &Position, rules: &RuleSet) -> Option<GameOutcome> {
        let mut history = History::new();
        history.push_initial(position);
        terminal(position, rules, &history)
    }

    #[test]
    fn test_start_is_not_terminal() {
        let rules = RuleSet::default();
        let single = Position::start(Geometry::standard(Variant::SingleFile));
        let double = Position::start(Geometry::standard(Variant::TwoFile));
        assert_eq!(outcome(&single, &rules), None);
        assert_eq!(outcome(&double, &rules), None);
    }

    #[test]
    fn test_checkmate() {
        let position = single_file("wk,wn,wr,.,.,.,.,bk:b");
        assert_eq!(
            outcome(&position, &RuleSet::default()),
            Some(GameOutcome::win(Termination::Checkmate, Color::White))
        );
    }

    #[test]
    fn test_stalemate_and_material_count() {
        // The knight is pinned and the king has nowhere to go
        let even = single_file("wk,wn,br,.,.,.,.,bk:w");
        let uneven = single_file("wk,wn,br,.,.,bn,.,bk:w");
        let rules = RuleSet::default();
        let material = RuleSet {
            material_count_win: true,
            ..RuleSet::default()
        };

        assert_eq!(
            outcome(&even, &rules),
            Some(GameOutcome::draw(Termination::Stalemate))
        );
        assert_eq!(
            outcome(&even, &material),
            Some(GameOutcome::draw(Termination::Stalemate))
        );
        assert_eq!(
            outcome(&uneven, &rules),
            Some(GameOutcome::draw(Termination::Stalemate))
        );
        assert_eq!(
            outcome(&uneven, &material),
            Some(GameOutcome::win(Termination::MaterialCount, Color::Black))
        );
    }

    #[test]
    fn test_bare_kings() {
        let position = single_file("wk,.,.,.,.,.,.,bk:w");
        assert_eq!(
            outcome(&position, &RuleSet::default()),
            Some(GameOutcome::draw(Termination::InsufficientMaterial))
        );
    }

    #[test]
    fn test_race_outranks_checkmate() {
        let position = two_file("bk,wq/.,./wk,./.,./.,./.,./.,./.,wr:b");
        assert_eq!(
            outcome(&position, &RuleSet::default()),
            Some(GameOutcome::win(Termination::Checkmate, Color::White))
        );

        let race = RuleSet {
            race_to_back_rank: true,
            ..RuleSet::default()
        };
        assert_eq!(
            outcome(&position, &race),
            Some(GameOutcome::win(Termination::BackRankRace, Color::White))
        );
    }

    #[test]
    fn test_checkmate_outranks_fifty_move() {
        let rules = RuleSet::default();
        let mate = single_file("wk,wn,wr,.,.,.,.,bk:b");
        let moves = generate_legal_moves(&mate, &rules);
        assert_eq!(
            classify(&mate, &rules, &moves, 120, 3),
            Some(GameOutcome::win(Termination::Checkmate, Color::White))
        );

        let open = single_file("wk,.,wr,.,.,bn,.,bk:w");
        let moves = generate_legal_moves(&open, &rules);
        assert_eq!(
            classify(&open, &rules, &moves, 100, 3),
            Some(GameOutcome::draw(Termination::FiftyMoveRule))
        );
        assert_eq!(
            classify(&open, &rules, &moves, 99, 3),
            Some(GameOutcome::draw(Termination::ThreefoldRepetition))
        );

        let relaxed = RuleSet {
            fifty_move: false,
            threefold: false,
            ..RuleSet::default()
        };
        assert_eq!(classify(&open, &relaxed, &moves, 120, 3), None);
    }

    #[test]
    fn test_threefold_repetition() {
        let rules = RuleSet::default();
        let start = two_file("bk,./.,./.,./.,./.,./.,./.,wr/wk,.:w");
        let shuffle = [(0, 1), (14, 12), (1, 0), (12, 14)];

        let mut history = History::new();
        history.push_initial(&start);
        let mut position = start.clone();
        for round in 0..2 {
            for &(from, to) in &shuffle {
                let mv = Move::new(Square::from_index(from), Square::from_index(to));
                let next = position.apply_move(mv, &rules);
                history.push_move(&position, mv, &next);
                position = next;
            }
            assert_eq!(position, start);
            if round == 0 {
                assert_eq!(terminal(&position, &rules, &history), None);
            }
        }

        assert_eq!(history.repetitions(&position), 3);
        assert_eq!(
            terminal(&position, &rules, &history),
            Some(GameOutcome::draw(Termination::ThreefoldRepetition))
        );

        let no_threefold = RuleSet {
            threefold: false,
            ..RuleSet::default()
        };
        assert_eq!(terminal(&position, &no_threefold, &history), None);
    }
}
