use crate::evaluation::MATE_THRESHOLD;
use log::trace;
use minichess_core::{Move, Position};
use std::collections::HashMap;

/// Type of node in the search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Exact score (PV-node)
    Exact,
    /// Lower bound (fail-high node)
    LowerBound,
    /// Upper bound (fail-low node)
    UpperBound,
}

/// Entry in the transposition cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// Score relative to the node, mate scores counted from the node
    pub score: i32,
    /// Type of node (exact, lower bound, upper bound)
    pub node_type: NodeType,
    /// Remaining search depth the score was computed with
    pub depth: u8,
    /// Best move found at this position
    pub best_move: Option<Move>,
    /// Halfmove clock at the time of the search
    pub halfmove_clock: u32,
}

impl CacheEntry {
    /// With the fifty-move rule on, the clock is part of the state: a higher
    /// clock cuts lines short and a lower one lets them run on, so only a
    /// result computed at the same clock applies.
    pub fn usable_at(&self, halfmove_clock: u32, fifty_move: bool) -> bool {
        !fifty_move || halfmove_clock == self.halfmove_clock
    }
}

/// Bounded memo of search results keyed by position.
///
/// Once full, new positions are refused while stored ones may still be
/// updated.
#[derive(Debug)]
pub struct TranspositionCache {
    entries: HashMap<Position, CacheEntry>,
    capacity: usize,
    refused: u64,
}

impl TranspositionCache {
    /// Creates an empty cache holding at most `capacity` positions.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            refused: 0,
        }
    }

    /// Stores an entry. Returns false if the cache is full and the
    /// position is not already present.
    pub fn store(&mut self, position: &Position, entry: CacheEntry) -> bool {
        if let Some(existing) = self.entries.get_mut(position) {
            *existing = entry;
            return true;
        }

        if self.entries.len() >= self.capacity {
            self.refused += 1;
            trace!("cache full at {} entries, refusing {}", self.capacity, position);
            return false;
        }

        self.entries.insert(position.clone(), entry);
        true
    }

    /// Probes the cache for a position.
    pub fn probe(&self, position: &Position) -> Option<&CacheEntry> {
        self.entries.get(position)
    }

    /// Clears the cache.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.refused = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stores refused since the last clear.
    pub fn refused(&self) -> u64 {
        self.refused
    }
}

/// Converts a root-relative mate score to one relative to the node at `ply`.
pub fn score_to_cache(score: i32, ply: u16) -> i32 {
    if score >= MATE_THRESHOLD {
        score + i32::from(ply)
    } else if score <= -MATE_THRESHOLD {
        score - i32::from(ply)
    } else {
        score
    }
}

/// Converts a node-relative mate score back to one relative to the root.
pub fn score_from_cache(score: i32, ply: u16) -> i32 {
    if score >= MATE_THRESHOLD {
        score - i32::from(ply)
    } else if score <= -MATE_THRESHOLD {
        score + i32::from(ply)
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::CHECKMATE_SCORE;
    use minichess_core::{Geometry, Variant};

    fn entry(score: i32) -> CacheEntry {
        CacheEntry {
            score,
            node_type: NodeType::Exact,
            depth: 3,
            best_move: None,
            halfmove_clock: 10,
        }
    }

    #[test]
    fn test_capacity_refuses_new_keys() {
        let single = Position::start(Geometry::standard(Variant::SingleFile));
        let double = Position::start(Geometry::standard(Variant::TwoFile));
        let mut cache = TranspositionCache::new(1);

        assert!(cache.store(&single, entry(5)));
        assert!(!cache.store(&double, entry(7)));
        assert_eq!(cache.refused(), 1);
        assert!(cache.probe(&double).is_none());

        // Existing keys are still updated
        assert!(cache.store(&single, entry(9)));
        assert_eq!(cache.probe(&single).map(|e| e.score), Some(9));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.refused(), 0);
    }

    #[test]
    fn test_mate_scores_are_ply_adjusted() {
        let mate_in_five = CHECKMATE_SCORE - 5;
        let stored = score_to_cache(mate_in_five, 3);
        assert_eq!(stored, CHECKMATE_SCORE - 2);
        assert_eq!(score_from_cache(stored, 3), mate_in_five);
        // Reached two plies deeper the same mate is two plies further away
        assert_eq!(score_from_cache(stored, 5), CHECKMATE_SCORE - 7);

        assert_eq!(score_to_cache(-mate_in_five, 3), -(CHECKMATE_SCORE - 2));
        assert_eq!(score_to_cache(150, 3), 150);
    }

    #[test]
    fn test_fifty_move_reuse() {
        let e = entry(0);
        assert!(e.usable_at(10, true));
        // A draw forced near the limit says nothing about a fresh clock
        assert!(!e.usable_at(4, true));
        assert!(!e.usable_at(11, true));
        assert!(e.usable_at(4, false));
        assert!(e.usable_at(11, false));
    }
}
