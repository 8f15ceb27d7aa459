use crate::evaluation::{evaluate, CHECKMATE_SCORE, INFINITY, MATE_THRESHOLD};
use crate::transposition::{score_from_cache, score_to_cache, CacheEntry, NodeType, TranspositionCache};
use log::debug;
use minichess_core::{
    classify, generate_legal_moves, Color, GameOutcome, Move, Position, RuleSet,
};
use std::fmt;
use std::time::{Duration, Instant};

/// Game-theoretic value of a move for the side playing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Win,
    Draw,
    Loss,
    /// Heuristic score only, no proof either way
    Unknown,
}

impl Verdict {
    /// Reads a heuristic search score: mate scores are decided,
    /// everything else is unknown.
    pub fn from_score(score: i32) -> Self {
        if score >= MATE_THRESHOLD {
            Verdict::Win
        } else if score <= -MATE_THRESHOLD {
            Verdict::Loss
        } else {
            Verdict::Unknown
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Win => f.write_str("WIN"),
            Verdict::Draw => f.write_str("DRAW"),
            Verdict::Loss => f.write_str("LOSS"),
            Verdict::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// A root move with its own score and verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub mv: Move,
    pub score: i32,
    pub verdict: Verdict,
}

/// Node count of one iterative deepening pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationStats {
    pub depth: u8,
    pub nodes: u64,
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    /// Deepest completed depth
    pub depth: u8,
    pub nodes: u64,
    pub stopped: bool,
    /// Root moves from the deepest completed depth
    pub candidates: Vec<Candidate>,
    pub iterations: Vec<IterationStats>,
}

#[derive(Debug, Clone)]
pub struct SearchLimits {
    pub max_depth: u8,
    /// Node budget of each iteration; an iteration that runs out is discarded
    pub iteration_nodes: Option<u64>,
    /// Soft deadline, checked between iterations
    pub move_time: Option<Duration>,
    /// Absolute ply ceiling, quiescence included
    pub max_ply: u16,
}

impl SearchLimits {
    pub const DEFAULT_MAX_PLY: u16 = 30;

    pub fn depth(depth: u8) -> Self {
        Self {
            max_depth: depth,
            iteration_nodes: None,
            move_time: None,
            max_ply: Self::DEFAULT_MAX_PLY,
        }
    }

    pub fn bounded(max_depth: u8, iteration_nodes: u64, move_time: Duration) -> Self {
        Self {
            max_depth,
            iteration_nodes: Some(iteration_nodes),
            move_time: Some(move_time),
            max_ply: Self::DEFAULT_MAX_PLY,
        }
    }
}

struct SearchInfo<'a> {
    rules: &'a RuleSet,
    limits: SearchLimits,
    /// Nodes of the current iteration
    nodes: u64,
    stopped: bool,
    /// Set when some line was cut off by the depth limit or a cached bound
    horizon_reached: bool,
    cache: &'a mut TranspositionCache,
    /// Game positions before the root, then the current search line
    line: Vec<Position>,
}

impl SearchInfo<'_> {
    fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }

        // Check node limit
        if let Some(max_nodes) = self.limits.iteration_nodes {
            if self.nodes >= max_nodes {
                self.stopped = true;
                return true;
            }
        }

        false
    }
}

/// Score of a finished game for `side`, mates and wins closer to the
/// root scoring higher.
pub(crate) fn outcome_score(outcome: &GameOutcome, side: Color, ply: u16) -> i32 {
    match outcome.winner {
        Some(winner) if winner == side => CHECKMATE_SCORE - i32::from(ply),
        Some(_) => -(CHECKMATE_SCORE - i32::from(ply)),
        None => 0,
    }
}

/// Searches the position to increasing depths within the limits.
///
/// `game_line` holds the positions played before `position`; reaching one
/// of them again counts as a draw. The result comes from the deepest
/// iteration that finished inside its node budget.
pub fn iterative_deepening(
    position: &Position,
    rules: &RuleSet,
    game_line: &[Position],
    halfmove_clock: u32,
    limits: SearchLimits,
    cache: &mut TranspositionCache,
) -> SearchResult {
    let start_time = Instant::now();
    let mut result = SearchResult::default();

    let mut root_moves = generate_legal_moves(position, rules).into_vec();
    if root_moves.is_empty() {
        return result;
    }
    let tt_move = cache.probe(position).and_then(|e| e.best_move);
    order_moves(position, &mut root_moves, tt_move);

    let max_depth = limits.max_depth;
    let move_time = limits.move_time;
    let mut info = SearchInfo {
        rules,
        limits,
        nodes: 0,
        stopped: false,
        horizon_reached: false,
        cache,
        line: game_line.to_vec(),
    };

    // Search to increasing depths until a budget runs out
    for depth in 1..=max_depth {
        info.nodes = 0;
        info.horizon_reached = false;

        let candidates = alpha_beta_root(position, &root_moves, depth, halfmove_clock, &mut info);
        result.nodes += info.nodes;
        result.iterations.push(IterationStats {
            depth,
            nodes: info.nodes,
            completed: candidates.is_some(),
        });

        // Only update result if we completed this depth
        let Some(mut candidates) = candidates else {
            debug!("depth {} aborted after {} nodes", depth, info.nodes);
            break;
        };

        // With no line cut short every score is a game result
        if !info.horizon_reached {
            for candidate in candidates.iter_mut().filter(|c| c.score == 0) {
                candidate.verdict = Verdict::Draw;
            }
        }

        let best = best_candidate(&candidates);
        result.best_move = Some(best.mv);
        result.score = best.score;
        result.depth = depth;
        debug!(
            "depth {}: best {} score {} nodes {}",
            depth, best.mv, best.score, info.nodes
        );

        // Best moves first on the next pass
        let mut ranked = candidates.clone();
        ranked.sort_by_key(|c| -c.score);
        root_moves = ranked.iter().map(|c| c.mv).collect();
        let all_lost = candidates.iter().all(|c| c.score <= -MATE_THRESHOLD);
        result.candidates = candidates;

        if !info.horizon_reached {
            debug!("search tree exhausted at depth {}", depth);
            break;
        }

        // Stop if we found a forced mate either way
        if best.score >= MATE_THRESHOLD || all_lost {
            break;
        }

        if let Some(move_time) = move_time {
            if start_time.elapsed() >= move_time {
                debug!("time budget spent after depth {}", depth);
                break;
            }
        }
    }

    result.stopped = info.stopped;
    result
}

/// First candidate with the highest score.
pub(crate) fn best_candidate(candidates: &[Candidate]) -> Candidate {
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.score > best.score {
            best = *candidate;
        }
    }
    best
}

/// Scores every root move with a full window.
/// Returns `None` if the iteration ran out of nodes.
fn alpha_beta_root(
    position: &Position,
    moves: &[Move],
    depth: u8,
    halfmove_clock: u32,
    info: &mut SearchInfo,
) -> Option<Vec<Candidate>> {
    let mut candidates = Vec::with_capacity(moves.len());
    info.line.push(position.clone());

    for &mv in moves {
        let new_position = position.apply_move(mv, info.rules);
        let clock = next_clock(position, mv, halfmove_clock);
        let score = -alpha_beta(&new_position, depth - 1, 1, -INFINITY, INFINITY, clock, info);

        if info.stopped {
            break;
        }

        candidates.push(Candidate {
            mv,
            score,
            verdict: Verdict::from_score(score),
        });
    }

    info.line.pop();
    if info.stopped {
        None
    } else {
        Some(candidates)
    }
}

pub(crate) fn next_clock(position: &Position, mv: Move, halfmove_clock: u32) -> u32 {
    if position.is_progress(mv) {
        0
    } else {
        halfmove_clock + 1
    }
}

fn alpha_beta(
    position: &Position,
    depth: u8,
    ply: u16,
    mut alpha: i32,
    beta: i32,
    halfmove_clock: u32,
    info: &mut SearchInfo,
) -> i32 {
    // Check if we should stop searching
    if info.should_stop() {
        return 0;
    }
    info.nodes += 1;

    // Repetition of the game or the current line
    if info.line.contains(position) {
        return 0;
    }

    // Generate all legal moves
    let moves = generate_legal_moves(position, info.rules);
    if let Some(outcome) = classify(position, info.rules, &moves, halfmove_clock, 1) {
        return outcome_score(&outcome, position.turn, ply);
    }

    if ply >= info.limits.max_ply {
        info.horizon_reached = true;
        return evaluate(position);
    }

    // Horizon node - enter quiescence search
    if depth == 0 {
        info.horizon_reached = true;
        return quiescence(position, ply, alpha, beta, info);
    }

    let original_alpha = alpha;
    let mut tt_move = None;

    // Probe transposition cache
    if let Some(entry) = info.cache.probe(position) {
        if entry.depth >= depth && entry.usable_at(halfmove_clock, info.rules.fifty_move) {
            let score = score_from_cache(entry.score, ply);
            // A cached score may hide a depth cutoff
            info.horizon_reached = true;
            match entry.node_type {
                NodeType::Exact => return score,
                NodeType::LowerBound => alpha = alpha.max(score),
                NodeType::UpperBound => {
                    if score <= alpha {
                        return score;
                    }
                }
            }

            // Alpha-beta cutoff
            if alpha >= beta {
                return score;
            }
        }
        // Save the best move from the cache for move ordering
        tt_move = entry.best_move;
    }

    let mut moves_vec = moves.into_vec();

    // Order moves for better pruning (cached move first, then captures)
    order_moves(position, &mut moves_vec, tt_move);

    let mut best_move = None;
    let mut best_score = -INFINITY;
    info.line.push(position.clone());

    for mv in moves_vec {
        let new_position = position.apply_move(mv, info.rules);
        let clock = next_clock(position, mv, halfmove_clock);

        // Recursive search with negamax
        let score = -alpha_beta(&new_position, depth - 1, ply + 1, -beta, -alpha, clock, info);

        // If search was stopped, the partial result is discarded
        if info.stopped {
            info.line.pop();
            return 0;
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
        }

        if score > alpha {
            alpha = score;
        }

        // Beta cutoff
        if alpha >= beta {
            break;
        }
    }

    info.line.pop();

    // Store in transposition cache
    let node_type = if best_score <= original_alpha {
        NodeType::UpperBound
    } else if best_score >= beta {
        NodeType::LowerBound
    } else {
        NodeType::Exact
    };

    info.cache.store(
        position,
        CacheEntry {
            score: score_to_cache(best_score, ply),
            node_type,
            depth,
            best_move,
            halfmove_clock,
        },
    );

    best_score
}

fn quiescence(position: &Position, ply: u16, mut alpha: i32, beta: i32, info: &mut SearchInfo) -> i32 {
    // Check if we should stop searching
    if info.should_stop() {
        return 0;
    }
    info.nodes += 1;

    // Stand pat evaluation - can we beat alpha without searching?
    let stand_pat = evaluate(position);

    if stand_pat >= beta {
        return beta;
    }

    if alpha < stand_pat {
        alpha = stand_pat;
    }

    // Absolute ply ceiling
    if ply >= info.limits.max_ply {
        return stand_pat;
    }

    // Filter to only captures and promotions
    let mut capture_moves: Vec<Move> = generate_legal_moves(position, info.rules)
        .into_iter()
        .filter(|&mv| position.is_capture(mv) || mv.promotion.is_some())
        .collect();

    // If no captures, return stand pat
    if capture_moves.is_empty() {
        return stand_pat;
    }

    order_moves(position, &mut capture_moves, None);

    for mv in capture_moves {
        let new_position = position.apply_move(mv, info.rules);
        let score = -quiescence(&new_position, ply + 1, -beta, -alpha, info);

        if info.stopped {
            return alpha;
        }

        if score >= beta {
            return beta;
        }

        if score > alpha {
            alpha = score;
        }
    }

    alpha
}

/// Move ordering: cached move first, then captures by MVV-LVA (most
/// valuable victim, least valuable attacker), then promotions.
pub(crate) fn order_moves(position: &Position, moves: &mut [Move], tt_move: Option<Move>) {
    moves.sort_by_cached_key(|mv| {
        // Cached move gets highest priority
        if tt_move == Some(*mv) {
            return i32::MIN;
        }

        let mut score = 0;

        if position.is_capture(*mv) {
            // En passant takes a pawn from a square other than `to`
            let victim = position
                .board
                .piece_at(mv.to)
                .map_or(100, |p| i32::from(p.piece_type.value()));
            let attacker = position
                .board
                .piece_at(mv.from)
                .map_or(0, |p| i32::from(p.piece_type.value()));
            score -= 1000 + victim * 10 - attacker;
        }

        if let Some(promotion) = mv.promotion {
            score -= 900 + i32::from(promotion.value());
        }

        score
    });
}
