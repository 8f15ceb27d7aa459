use crate::evaluation::INFINITY;
use crate::search::{best_candidate, next_clock, order_moves, outcome_score, Candidate, Verdict};
use crate::transposition::{score_from_cache, score_to_cache, CacheEntry, NodeType, TranspositionCache};
use log::debug;
use minichess_core::{classify, generate_legal_moves, Move, Position, RuleSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExhaustiveLimits {
    /// Nodes visited before the search gives up
    pub node_budget: u64,
    /// Deepest ply a line may reach
    pub max_ply: u16,
}

impl Default for ExhaustiveLimits {
    fn default() -> Self {
        Self {
            node_budget: 10_000,
            max_ply: 128,
        }
    }
}

/// Why an exhaustive search gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    NodeBudget,
    PlyCeiling,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::NodeBudget => f.write_str("node budget"),
            AbortReason::PlyCeiling => f.write_str("ply ceiling"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted {
    pub reason: AbortReason,
    pub nodes: u64,
}

/// Proven result of a search played out to the end of the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExhaustiveResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub verdict: Verdict,
    pub nodes: u64,
    pub candidates: Vec<Candidate>,
}

/// Verdict of an exact score: wins score above zero, losses below.
pub fn exact_verdict(score: i32) -> Verdict {
    match score {
        s if s > 0 => Verdict::Win,
        0 => Verdict::Draw,
        _ => Verdict::Loss,
    }
}

/// Score plus whether it depends on a repetition along the current line.
#[derive(Debug, Clone, Copy)]
struct Scored {
    score: i32,
    tainted: bool,
}

impl Scored {
    const fn exact(score: i32) -> Self {
        Self {
            score,
            tainted: false,
        }
    }
}

struct Exhaustive<'a> {
    rules: &'a RuleSet,
    limits: ExhaustiveLimits,
    nodes: u64,
    abort: Option<AbortReason>,
    cache: &'a mut TranspositionCache,
    /// Game positions before the root, then the current search line
    line: Vec<Position>,
}

/// Solves the position by searching every line to the end of the game.
///
/// Each root move is scored with a full window, so every candidate carries
/// its own exact verdict. A repeated position scores as a draw; results that
/// depend on such a repetition are kept out of the cache. Running out of
/// nodes or plies aborts the whole search and nothing partial is returned.
pub fn solve_exhaustive(
    position: &Position,
    rules: &RuleSet,
    game_line: &[Position],
    halfmove_clock: u32,
    limits: ExhaustiveLimits,
    cache: &mut TranspositionCache,
) -> Result<ExhaustiveResult, Aborted> {
    let mut moves = generate_legal_moves(position, rules).into_vec();
    let tt_move = cache.probe(position).and_then(|e| e.best_move);
    order_moves(position, &mut moves, tt_move);

    let mut search = Exhaustive {
        rules,
        limits,
        nodes: 0,
        abort: None,
        cache,
        line: game_line.to_vec(),
    };
    search.line.push(position.clone());

    let mut candidates = Vec::with_capacity(moves.len());
    for mv in moves {
        let new_position = position.apply_move(mv, rules);
        let clock = next_clock(position, mv, halfmove_clock);
        let scored = search.negamax(&new_position, 1, -INFINITY, INFINITY, clock);

        if let Some(reason) = search.abort {
            debug!("exhaustive search aborted by {} after {} nodes", reason, search.nodes);
            return Err(Aborted {
                reason,
                nodes: search.nodes,
            });
        }

        let score = -scored.score;
        candidates.push(Candidate {
            mv,
            score,
            verdict: exact_verdict(score),
        });
    }

    let mut result = ExhaustiveResult {
        best_move: None,
        score: 0,
        verdict: Verdict::Draw,
        nodes: search.nodes,
        candidates,
    };
    if !result.candidates.is_empty() {
        let best = best_candidate(&result.candidates);
        result.best_move = Some(best.mv);
        result.score = best.score;
        result.verdict = best.verdict;
    }

    debug!(
        "exhaustive search: {} {} in {} nodes",
        result.verdict, result.score, result.nodes
    );
    Ok(result)
}

impl Exhaustive<'_> {
    fn negamax(
        &mut self,
        position: &Position,
        ply: u16,
        mut alpha: i32,
        beta: i32,
        halfmove_clock: u32,
    ) -> Scored {
        if self.abort.is_some() {
            return Scored::exact(0);
        }
        if self.nodes >= self.limits.node_budget {
            self.abort = Some(AbortReason::NodeBudget);
            return Scored::exact(0);
        }
        self.nodes += 1;

        if ply > self.limits.max_ply {
            self.abort = Some(AbortReason::PlyCeiling);
            return Scored::exact(0);
        }

        // The value of a repeated position depends on how it was reached
        if self.line.contains(position) {
            return Scored {
                score: 0,
                tainted: true,
            };
        }

        let moves = generate_legal_moves(position, self.rules);
        if let Some(outcome) = classify(position, self.rules, &moves, halfmove_clock, 1) {
            return Scored::exact(outcome_score(&outcome, position.turn, ply));
        }

        let original_alpha = alpha;
        let mut tt_move = None;

        if let Some(entry) = self.cache.probe(position).copied() {
            if entry.usable_at(halfmove_clock, self.rules.fifty_move) {
                let score = score_from_cache(entry.score, ply);
                match entry.node_type {
                    NodeType::Exact => return Scored::exact(score),
                    NodeType::LowerBound => alpha = alpha.max(score),
                    NodeType::UpperBound => {
                        if score <= alpha {
                            return Scored::exact(score);
                        }
                    }
                }

                if alpha >= beta {
                    return Scored::exact(score);
                }
            }
            tt_move = entry.best_move;
        }

        let mut moves = moves.into_vec();
        order_moves(position, &mut moves, tt_move);

        let mut best_score = -INFINITY;
        let mut best_move = None;
        let mut tainted = false;
        self.line.push(position.clone());

        for mv in moves {
            let new_position = position.apply_move(mv, self.rules);
            let clock = next_clock(position, mv, halfmove_clock);
            let child = self.negamax(&new_position, ply + 1, -beta, -alpha, clock);

            if self.abort.is_some() {
                self.line.pop();
                return Scored::exact(0);
            }

            tainted |= child.tainted;
            let score = -child.score;
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        self.line.pop();

        if !tainted {
            let node_type = if best_score <= original_alpha {
                NodeType::UpperBound
            } else if best_score >= beta {
                NodeType::LowerBound
            } else {
                NodeType::Exact
            };
            self.cache.store(
                position,
                CacheEntry {
                    score: score_to_cache(best_score, ply),
                    node_type,
                    depth: u8::MAX,
                    best_move,
                    halfmove_clock,
                },
            );
        }

        Scored {
            score: best_score,
            tainted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::CHECKMATE_SCORE;
    use minichess_core::{Geometry, Square, Variant};

    fn single_file(text: &str) -> Position {
        Position::decode(text, Geometry::standard(Variant::SingleFile)).unwrap()
    }

    fn solve(
        position: &Position,
        rules: &RuleSet,
        limits: ExhaustiveLimits,
    ) -> Result<ExhaustiveResult, Aborted> {
        let mut cache = TranspositionCache::new(50_000);
        solve_exhaustive(position, rules, &[], 0, limits, &mut cache)
    }

    #[test]
    fn test_mate_in_one() {
        let position = single_file("wk,.,wr,wn,.,.,.,bk:w");
        let result = solve(&position, &RuleSet::default(), ExhaustiveLimits::default()).unwrap();

        assert_eq!(
            result.best_move,
            Some(Move::new(Square::from_index(3), Square::from_index(1)))
        );
        assert_eq!(result.score, CHECKMATE_SCORE - 1);
        assert_eq!(result.verdict, Verdict::Win);
        assert_eq!(result.candidates.len(), 4);
        // Shuffling the king or rook gets nowhere
        let draws = result
            .candidates
            .iter()
            .filter(|c| c.verdict == Verdict::Draw)
            .count();
        assert_eq!(draws, 2);
    }

    #[test]
    fn test_start_position_won_on_material() {
        let rules = RuleSet {
            material_count_win: true,
            ..RuleSet::default()
        };
        let position = Position::start(Geometry::standard(Variant::SingleFile));
        let result = solve(&position, &rules, ExhaustiveLimits::default()).unwrap();

        assert_eq!(result.verdict, Verdict::Win);
        assert_eq!(
            result.best_move,
            Some(Move::new(Square::from_index(2), Square::from_index(4)))
        );
        assert!(result.nodes <= 10_000);
    }

    #[test]
    fn test_start_position_drawn_without_material_rule() {
        let position = Position::start(Geometry::standard(Variant::SingleFile));
        let result = solve(&position, &RuleSet::default(), ExhaustiveLimits::default()).unwrap();

        assert_eq!(result.verdict, Verdict::Draw);
        assert_eq!(result.score, 0);
        // The rook lift to 5 loses a piece and the game
        let lift = result
            .candidates
            .iter()
            .find(|c| c.mv == Move::new(Square::from_index(2), Square::from_index(5)))
            .unwrap();
        assert_eq!(lift.verdict, Verdict::Loss);
    }

    #[test]
    fn test_shared_cache_respects_halfmove_clock() {
        let position = single_file("wk,wr,.,wn,.,.,.,bk:w");
        let rules = RuleSet::default();
        let limits = ExhaustiveLimits::default();
        let mut cache = TranspositionCache::new(50_000);

        let fresh = solve_exhaustive(&position, &rules, &[], 0, limits, &mut cache).unwrap();
        assert_eq!(fresh.verdict, Verdict::Win);
        assert_eq!(fresh.score, CHECKMATE_SCORE - 3);

        // Two plies from the fifty-move limit the mate no longer lands
        let late = solve_exhaustive(&position, &rules, &[], 98, limits, &mut cache).unwrap();
        assert_eq!(late.verdict, Verdict::Draw);

        let again = solve_exhaustive(&position, &rules, &[], 0, limits, &mut cache).unwrap();
        assert_eq!(again.verdict, Verdict::Win);
        assert_eq!(again.score, fresh.score);
        assert_eq!(again.best_move, fresh.best_move);
    }

    #[test]
    fn test_budget_aborts() {
        let position = Position::start(Geometry::standard(Variant::SingleFile));
        let limits = ExhaustiveLimits {
            node_budget: 5,
            ..ExhaustiveLimits::default()
        };
        let aborted = solve(&position, &RuleSet::default(), limits).unwrap_err();
        assert_eq!(aborted.reason, AbortReason::NodeBudget);
        assert_eq!(aborted.nodes, 5);
    }

    #[test]
    fn test_ply_ceiling_aborts() {
        let position = Position::start(Geometry::standard(Variant::SingleFile));
        let limits = ExhaustiveLimits {
            node_budget: 10_000,
            max_ply: 2,
        };
        let aborted = solve(&position, &RuleSet::default(), limits).unwrap_err();
        assert_eq!(aborted.reason, AbortReason::PlyCeiling);
    }

    #[test]
    fn test_exact_verdict() {
        assert_eq!(exact_verdict(CHECKMATE_SCORE - 3), Verdict::Win);
        assert_eq!(exact_verdict(0), Verdict::Draw);
        assert_eq!(exact_verdict(-(CHECKMATE_SCORE - 2)), Verdict::Loss);
    }
}
