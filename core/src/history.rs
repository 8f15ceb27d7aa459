use crate::position::Position;
use crate::types::Move;

/// One recorded position with the halfmove clock reached there.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HistoryEntry {
    pub key: String,
    pub halfmove_clock: u32,
}

/// Positions seen in the current game, oldest first.
///
/// Keys are canonical encodings, so a repeated position compares equal
/// whatever move order produced it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new record from the given position, dropping earlier entries.
    pub fn push_initial(&mut self, position: &Position) {
        self.entries.clear();
        self.entries.push(HistoryEntry {
            key: position.encode(),
            halfmove_clock: 0,
        });
    }

    /// Records the position reached by playing `mv` from `before`.
    pub fn push_move(&mut self, before: &Position, mv: Move, after: &Position) {
        let halfmove_clock = if before.is_progress(mv) {
            0
        } else {
            self.halfmove_clock() + 1
        };
        self.entries.push(HistoryEntry {
            key: after.encode(),
            halfmove_clock,
        });
    }

    /// Removes the most recent entry. The initial position is kept.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        if self.entries.len() > 1 {
            self.entries.pop()
        } else {
            None
        }
    }

    /// Keeps only the first `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u32 {
        self.entries.last().map_or(0, |e| e.halfmove_clock)
    }

    pub fn last_key(&self) -> Option<&str> {
        self.entries.last().map(|e| e.key.as_str())
    }

    /// Counts how often `key` was recorded.
    pub fn occurrences(&self, key: &str) -> usize {
        self.entries.iter().filter(|e| e.key == key).count()
    }

    /// Occurrences of the position counting the current one, which is
    /// added once unless it already is the last entry.
    pub fn repetitions(&self, position: &Position) -> usize {
        let key = position.encode();
        let recorded = self.occurrences(&key);
        if self.last_key() == Some(key.as_str()) {
            recorded
        } else {
            recorded + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use crate::types::{Geometry, Square, Variant};

    #[test]
    fn test_clock_and_undo() {
        let rules = RuleSet::default();
        let start = Position::decode("wk,.,wr,.,.,bn,.,bk:w", Geometry::standard(Variant::SingleFile))
            .unwrap();
        let mut history = History::new();
        history.push_initial(&start);

        let quiet = Move::new(Square::from_index(0), Square::from_index(1));
        let after_quiet = start.apply_move(quiet, &rules);
        history.push_move(&start, quiet, &after_quiet);
        assert_eq!(history.halfmove_clock(), 1);

        let reply = Move::new(Square::from_index(7), Square::from_index(6));
        let after_reply = after_quiet.apply_move(reply, &rules);
        history.push_move(&after_quiet, reply, &after_reply);
        assert_eq!(history.halfmove_clock(), 2);

        let capture = Move::new(Square::from_index(2), Square::from_index(5));
        let after_capture = after_reply.apply_move(capture, &rules);
        history.push_move(&after_reply, capture, &after_capture);
        assert_eq!(history.halfmove_clock(), 0);

        assert!(history.undo().is_some());
        assert_eq!(history.halfmove_clock(), 2);
        assert_eq!(history.last_key(), Some(after_reply.encode().as_str()));

        history.truncate(1);
        assert_eq!(history.undo(), None);
        assert_eq!(history.len(), 1);
        assert_eq!(history.repetitions(&start), 1);
        assert_eq!(history.repetitions(&after_quiet), 1);
    }
}
