pub mod disposition;
pub mod evaluation;
pub mod exhaustive;
pub mod random;
pub mod search;
pub mod solver;
pub mod transposition;

use minichess_core::{History, Move, Position};

/// Core trait for players
pub trait Agent {
    /// Get the move to play in the position, `None` if there is none
    fn best_move(&mut self, position: &Position, history: &History) -> Option<Move>;

    /// Get the agent's name
    fn name(&self) -> &str;
}

pub use disposition::select;
pub use evaluation::*;
pub use exhaustive::{solve_exhaustive, AbortReason, Aborted, ExhaustiveLimits, ExhaustiveResult};
pub use random::RandomAgent;
pub use search::{iterative_deepening, Candidate, IterationStats, SearchLimits, SearchResult, Verdict};
pub use solver::{
    complexity, Decision, SolveError, SolveOutcome, Solver, SolverAgent, SolverConfig, Tier,
};
pub use transposition::{CacheEntry, NodeType, TranspositionCache};
