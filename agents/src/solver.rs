use crate::disposition::{select, COOPERATIVE_MARGIN};
use crate::evaluation::evaluate;
use crate::exhaustive::{solve_exhaustive, ExhaustiveLimits};
use crate::search::{
    best_candidate, iterative_deepening, outcome_score, Candidate, SearchLimits, Verdict,
};
use crate::transposition::TranspositionCache;
use crate::Agent;
use log::{debug, warn};
use minichess_core::{
    classify, generate_legal_moves, terminal, Disposition, GameOutcome, Geometry, History,
    HistoryEntry, Move, Position, PositionError, RuleSet,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Budgets and thresholds of the tiered solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Highest complexity solved exhaustively
    pub exhaustive_max_complexity: f64,
    /// Highest complexity searched with bounded deepening
    pub bounded_max_complexity: f64,
    /// Most legal moves at the root for bounded deepening
    pub bounded_max_moves: usize,
    pub exhaustive_node_budget: u64,
    pub exhaustive_max_ply: u16,
    pub exhaustive_cache_capacity: usize,
    pub bounded_max_depth: u8,
    /// Node budget of each bounded iteration
    pub bounded_iteration_nodes: u64,
    /// Soft deadline of a bounded search
    pub bounded_time: Duration,
    /// Shared by the bounded and heuristic tiers
    pub bounded_cache_capacity: usize,
    /// Safety cap per heuristic iteration
    pub heuristic_node_cap: u64,
    pub heuristic_max_ply: u16,
    pub cooperative_margin: i32,
    /// Overrides the disposition of the rule set
    pub disposition: Option<Disposition>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            exhaustive_max_complexity: 6.0,
            bounded_max_complexity: 12.0,
            bounded_max_moves: 30,
            exhaustive_node_budget: 10_000,
            exhaustive_max_ply: 128,
            exhaustive_cache_capacity: 50_000,
            bounded_max_depth: 20,
            bounded_iteration_nodes: 50_000,
            bounded_time: Duration::from_millis(2_000),
            bounded_cache_capacity: 100_000,
            heuristic_node_cap: 1_000_000,
            heuristic_max_ply: 30,
            cooperative_margin: COOPERATIVE_MARGIN,
            disposition: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Exhaustive,
    Bounded,
    Heuristic,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Exhaustive => f.write_str("exhaustive"),
            Tier::Bounded => f.write_str("bounded"),
            Tier::Heuristic => f.write_str("heuristic"),
        }
    }
}

/// The chosen move and how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub mv: Move,
    pub tier: Tier,
    /// Outcome of the chosen move for the side playing it
    pub verdict: Verdict,
    /// True when the verdict is a proof rather than an estimate
    pub proven: bool,
    pub score: i32,
    pub nodes: u64,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Move(Decision),
    /// The position is already decided; there is nothing to play
    GameOver(GameOutcome),
}

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] PositionError),
}

/// Estimated search difficulty: piece count scaled by board size.
pub fn complexity(position: &Position) -> f64 {
    let pieces = position.board.total_pieces() as f64;
    let cells = position.geometry().cells() as f64;
    pieces * (cells / 12.0).sqrt()
}

/// Depth of the heuristic tier for the number of pieces on the board.
pub fn heuristic_depth(pieces: usize) -> u8 {
    match pieces {
        0..=8 => 6,
        9..=12 => 5,
        _ => 4,
    }
}

/// Tiered move chooser owning its transposition caches.
///
/// Caches persist between calls and are cleared when the rules or the
/// board geometry change, or when the game record is rewound or replaced.
pub struct Solver {
    config: SolverConfig,
    exact_cache: TranspositionCache,
    bounded_cache: TranspositionCache,
    context: Option<(RuleSet, Geometry)>,
    /// Game record of the previous call
    game: Vec<HistoryEntry>,
    rng: StdRng,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Solver whose random choices are reproducible.
    pub fn with_seed(config: SolverConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SolverConfig, rng: StdRng) -> Self {
        Self {
            exact_cache: TranspositionCache::new(config.exhaustive_cache_capacity),
            bounded_cache: TranspositionCache::new(config.bounded_cache_capacity),
            config,
            context: None,
            game: Vec::new(),
            rng,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Entries held in the exhaustive and the bounded cache.
    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.exact_cache.len(), self.bounded_cache.len())
    }

    /// Forgets everything learned so far.
    pub fn clear(&mut self) {
        self.exact_cache.clear();
        self.bounded_cache.clear();
        self.context = None;
        self.game.clear();
    }

    /// Chooses a move for the side to move.
    ///
    /// `history` is the game record up to and including `position`; it
    /// supplies the halfmove clock and the positions that may repeat.
    pub fn choose_move(
        &mut self,
        position: &Position,
        rules: &RuleSet,
        history: &History,
    ) -> Result<SolveOutcome, SolveError> {
        position.validate()?;
        self.enter_context(rules, position.geometry());
        self.enter_game(history);

        if let Some(outcome) = terminal(position, rules, history) {
            debug!("no move to choose: {}", outcome);
            return Ok(SolveOutcome::GameOver(outcome));
        }

        let halfmove_clock = history.halfmove_clock();
        let game_line = if rules.threefold {
            game_line(position, history)
        } else {
            Vec::new()
        };

        let complexity = complexity(position);
        let move_count = generate_legal_moves(position, rules).len();
        let config = &self.config;

        let mut decision = if complexity <= config.exhaustive_max_complexity {
            debug!("complexity {:.2}: exhaustive tier", complexity);
            let limits = ExhaustiveLimits {
                node_budget: config.exhaustive_node_budget,
                max_ply: config.exhaustive_max_ply,
            };
            match solve_exhaustive(
                position,
                rules,
                &game_line,
                halfmove_clock,
                limits,
                &mut self.exact_cache,
            ) {
                Ok(result) => Decision {
                    mv: result.best_move.unwrap_or_else(|| {
                        panic!("exhaustive search found no move in {}", position)
                    }),
                    tier: Tier::Exhaustive,
                    verdict: result.verdict,
                    proven: true,
                    score: result.score,
                    nodes: result.nodes,
                    candidates: result.candidates,
                },
                Err(aborted) => {
                    debug!(
                        "exhaustive tier gave up ({}) after {} nodes, falling back to bounded",
                        aborted.reason, aborted.nodes
                    );
                    let mut decision = self.bounded(position, rules, &game_line, halfmove_clock);
                    decision.nodes += aborted.nodes;
                    decision
                }
            }
        } else if complexity <= config.bounded_max_complexity && move_count <= config.bounded_max_moves {
            debug!(
                "complexity {:.2} with {} moves: bounded tier",
                complexity, move_count
            );
            self.bounded(position, rules, &game_line, halfmove_clock)
        } else {
            debug!("complexity {:.2}: heuristic tier", complexity);
            self.heuristic(position, rules, &game_line, halfmove_clock)
        };

        let disposition = self.config.disposition.unwrap_or_else(|| rules.disposition());
        if let Some(chosen) = select(
            disposition,
            &decision.candidates,
            self.config.cooperative_margin,
            &mut self.rng,
        ) {
            decision.mv = chosen.mv;
            decision.score = chosen.score;
            decision.verdict = chosen.verdict;
            if decision.tier != Tier::Exhaustive {
                decision.proven = chosen.verdict != Verdict::Unknown;
            }
        }

        debug!(
            "{} tier chose {} ({} {}, {} nodes)",
            decision.tier, decision.mv, decision.verdict, decision.score, decision.nodes
        );
        Ok(SolveOutcome::Move(decision))
    }

    /// Clears the caches when the rules or the board differ from the
    /// previous call. The disposition does not affect stored results.
    fn enter_context(&mut self, rules: &RuleSet, geometry: Geometry) {
        let context = (
            RuleSet {
                disposition: None,
                ..*rules
            },
            geometry,
        );
        if self.context != Some(context) {
            if self.context.is_some() {
                debug!("rules or board changed, clearing caches");
            }
            self.exact_cache.clear();
            self.bounded_cache.clear();
            self.context = Some(context);
        }
    }

    /// Clears the caches unless `history` continues the game record of the
    /// previous call. Searched lines depend on the positions already played.
    fn enter_game(&mut self, history: &History) {
        let entries = history.entries();
        if !entries.starts_with(&self.game) {
            debug!("game record rewound or replaced, clearing caches");
            self.exact_cache.clear();
            self.bounded_cache.clear();
        }
        self.game = entries.to_vec();
    }

    fn bounded(
        &mut self,
        position: &Position,
        rules: &RuleSet,
        game_line: &[Position],
        halfmove_clock: u32,
    ) -> Decision {
        let limits = SearchLimits::bounded(
            self.config.bounded_max_depth,
            self.config.bounded_iteration_nodes,
            self.config.bounded_time,
        );
        self.deepen(Tier::Bounded, position, rules, game_line, halfmove_clock, limits)
    }

    fn heuristic(
        &mut self,
        position: &Position,
        rules: &RuleSet,
        game_line: &[Position],
        halfmove_clock: u32,
    ) -> Decision {
        let limits = SearchLimits {
            max_depth: heuristic_depth(position.board.total_pieces()),
            iteration_nodes: Some(self.config.heuristic_node_cap),
            move_time: None,
            max_ply: self.config.heuristic_max_ply,
        };
        self.deepen(Tier::Heuristic, position, rules, game_line, halfmove_clock, limits)
    }

    fn deepen(
        &mut self,
        tier: Tier,
        position: &Position,
        rules: &RuleSet,
        game_line: &[Position],
        halfmove_clock: u32,
        limits: SearchLimits,
    ) -> Decision {
        let result = iterative_deepening(
            position,
            rules,
            game_line,
            halfmove_clock,
            limits,
            &mut self.bounded_cache,
        );

        let candidates = if result.candidates.is_empty() {
            debug!("{} tier completed no iteration, scoring moves statically", tier);
            static_candidates(position, rules, halfmove_clock)
        } else {
            result.candidates
        };

        let best = best_candidate(&candidates);
        Decision {
            mv: best.mv,
            tier,
            verdict: best.verdict,
            proven: best.verdict != Verdict::Unknown,
            score: best.score,
            nodes: result.nodes,
            candidates,
        }
    }
}

/// Plays the tiered solver's choice under a fixed rule set.
pub struct SolverAgent {
    name: String,
    solver: Solver,
    rules: RuleSet,
}

impl SolverAgent {
    pub fn new(rules: RuleSet, config: SolverConfig) -> Self {
        SolverAgent {
            name: format!("Solver({})", config.disposition.unwrap_or_else(|| rules.disposition())),
            solver: Solver::new(config),
            rules,
        }
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }
}

impl Agent for SolverAgent {
    fn best_move(&mut self, position: &Position, history: &History) -> Option<Move> {
        match self.solver.choose_move(position, &self.rules, history) {
            Ok(SolveOutcome::Move(decision)) => Some(decision.mv),
            Ok(SolveOutcome::GameOver(_)) => None,
            Err(e) => {
                warn!("{} cannot move: {}", self.name, e);
                None
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Positions of the game that the search must treat as already seen:
/// those since the last capture or pawn move, decoded from the history.
fn game_line(position: &Position, history: &History) -> Vec<Position> {
    let entries = history.entries();
    let current = position.encode();
    let end = match entries.last() {
        Some(last) if last.key == current => entries.len() - 1,
        _ => entries.len(),
    };
    let start = end.saturating_sub(history.halfmove_clock() as usize);

    entries[start..end]
        .iter()
        .filter_map(|entry| Position::decode(&entry.key, position.geometry()).ok())
        .collect()
}

/// One-ply scores used when no search iteration finished.
fn static_candidates(position: &Position, rules: &RuleSet, halfmove_clock: u32) -> Vec<Candidate> {
    generate_legal_moves(position, rules)
        .into_iter()
        .map(|mv| {
            let child = position.apply_move(mv, rules);
            let clock = if position.is_progress(mv) { 0 } else { halfmove_clock + 1 };
            let moves = generate_legal_moves(&child, rules);
            let score = match classify(&child, rules, &moves, clock, 1) {
                Some(outcome) => -outcome_score(&outcome, child.turn, 1),
                None => -evaluate(&child),
            };
            Candidate {
                mv,
                score,
                verdict: Verdict::from_score(score),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::CHECKMATE_SCORE;
    use minichess_core::{Color, Square, Variant};

    fn single_file(text: &str) -> Position {
        Position::decode(text, Geometry::standard(Variant::SingleFile)).unwrap()
    }

    fn history_of(position: &Position) -> History {
        let mut history = History::new();
        history.push_initial(position);
        history
    }

    #[test]
    fn test_complexity() {
        let single = Position::start(Geometry::standard(Variant::SingleFile));
        let double = Position::start(Geometry::standard(Variant::TwoFile));
        assert!((complexity(&single) - 6.0 * (8.0f64 / 12.0).sqrt()).abs() < 1e-9);
        assert!(complexity(&single) <= 6.0);
        assert!(complexity(&double) > 6.0 && complexity(&double) <= 12.0);
    }

    #[test]
    fn test_heuristic_depth() {
        assert_eq!(heuristic_depth(4), 6);
        assert_eq!(heuristic_depth(8), 6);
        assert_eq!(heuristic_depth(9), 5);
        assert_eq!(heuristic_depth(12), 5);
        assert_eq!(heuristic_depth(13), 4);
    }

    #[test]
    fn test_mate_in_one_is_proven() {
        let position = single_file("wk,.,wr,wn,.,.,.,bk:w");
        let mut solver = Solver::with_seed(SolverConfig::default(), 1);
        let outcome = solver
            .choose_move(&position, &RuleSet::default(), &history_of(&position))
            .unwrap();

        let SolveOutcome::Move(decision) = outcome else {
            panic!("expected a move, got {:?}", outcome);
        };
        assert_eq!(decision.tier, Tier::Exhaustive);
        assert_eq!(decision.mv, Move::new(Square::from_index(3), Square::from_index(1)));
        assert_eq!(decision.verdict, Verdict::Win);
        assert!(decision.proven);
        assert_eq!(decision.score, CHECKMATE_SCORE - 1);
    }

    #[test]
    fn test_terminal_position_reports_game_over() {
        let position = single_file("wk,.,.,.,wn,wr,.,bk:b");
        let mut solver = Solver::with_seed(SolverConfig::default(), 1);
        let outcome = solver
            .choose_move(&position, &RuleSet::default(), &history_of(&position))
            .unwrap();
        assert!(matches!(outcome, SolveOutcome::GameOver(o) if o.winner.is_some()));
    }

    #[test]
    fn test_invalid_position_rejected() {
        // Black is in check with White to move
        let mut position = single_file("wk,.,.,.,wn,wr,.,bk:b");
        position.turn = Color::White;
        let mut solver = Solver::with_seed(SolverConfig::default(), 1);
        let error = solver
            .choose_move(&position, &RuleSet::default(), &History::new())
            .unwrap_err();
        assert!(matches!(
            error,
            SolveError::InvalidPosition(PositionError::OpponentInCheck(Color::Black))
        ));
        assert_eq!(solver.cache_sizes(), (0, 0));
    }

    #[test]
    fn test_rewound_game_clears_caches() {
        let rules = RuleSet::default();
        let start = Position::start(Geometry::standard(Variant::SingleFile));
        let mut history = history_of(&start);
        let mut solver = Solver::with_seed(SolverConfig::default(), 1);

        let Ok(SolveOutcome::Move(decision)) = solver.choose_move(&start, &rules, &history) else {
            panic!("expected a move from the start position");
        };
        let (exact, _) = solver.cache_sizes();
        assert!(exact > 0);

        // Playing on keeps what was learned
        let next = start.apply_move(decision.mv, &rules);
        history.push_move(&start, decision.mv, &next);
        solver.choose_move(&next, &rules, &history).unwrap();
        assert!(solver.cache_sizes().0 >= exact);

        // Taking the move back starts over
        history.undo();
        solver.choose_move(&start, &rules, &history).unwrap();
        assert_eq!(solver.cache_sizes().0, exact);

        // So does loading an unrelated game
        let mated = single_file("wk,.,.,.,wn,wr,.,bk:b");
        let outcome = solver.choose_move(&mated, &rules, &history_of(&mated)).unwrap();
        assert!(matches!(outcome, SolveOutcome::GameOver(_)));
        assert_eq!(solver.cache_sizes(), (0, 0));
    }

    #[test]
    fn test_exhaustive_abort_falls_back_to_bounded() {
        let config = SolverConfig {
            exhaustive_node_budget: 5,
            bounded_time: Duration::from_secs(60),
            ..SolverConfig::default()
        };
        let position = single_file("wk,.,wr,wn,.,.,.,bk:w");
        let mut solver = Solver::with_seed(config, 1);
        let outcome = solver
            .choose_move(&position, &RuleSet::default(), &history_of(&position))
            .unwrap();

        let SolveOutcome::Move(decision) = outcome else {
            panic!("expected a move, got {:?}", outcome);
        };
        assert_eq!(decision.tier, Tier::Bounded);
        assert_eq!(decision.mv, Move::new(Square::from_index(3), Square::from_index(1)));
        assert!(decision.proven);
    }

    #[test]
    fn test_static_candidates_see_mate() {
        let position = single_file("wk,.,wr,wn,.,.,.,bk:w");
        let candidates = static_candidates(&position, &RuleSet::default(), 0);
        let best = best_candidate(&candidates);
        assert_eq!(best.mv, Move::new(Square::from_index(3), Square::from_index(1)));
        assert_eq!(best.verdict, Verdict::Win);
    }

    #[test]
    fn test_game_line_holds_reversible_positions() {
        let rules = RuleSet::default();
        let start = single_file("wk,.,wn,.,.,.,br,bk:w");
        let mut history = history_of(&start);
        let mut position = start.clone();
        let mut seen = vec![start.clone()];
        for text in ["0-1", "6-5"] {
            let mv: Move = text.parse().unwrap();
            let next = position.apply_move(mv, &rules);
            history.push_move(&position, mv, &next);
            position = next;
            seen.push(position.clone());
        }
        seen.pop();

        assert_eq!(history.halfmove_clock(), 2);
        assert_eq!(game_line(&position, &history), seen);

        // A fresh record has nothing to repeat
        assert!(game_line(&position, &history_of(&position)).is_empty());
    }
}
