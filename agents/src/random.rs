use crate::Agent;
use minichess_core::{generate_legal_moves, History, Move, Position, RuleSet};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Plays a uniformly random legal move.
pub struct RandomAgent {
    name: String,
    rules: RuleSet,
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(rules: RuleSet) -> Self {
        RandomAgent {
            name: "Random".to_string(),
            rules,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(rules: RuleSet, seed: u64) -> Self {
        RandomAgent {
            name: "Random".to_string(),
            rules,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn best_move(&mut self, position: &Position, _history: &History) -> Option<Move> {
        let moves = generate_legal_moves(position, &self.rules);
        moves.as_slice().choose(&mut self.rng).copied()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minichess_core::{Geometry, Variant};

    #[test]
    fn test_plays_legal_moves() {
        let rules = RuleSet::default();
        let position = Position::start(Geometry::standard(Variant::TwoFile));
        let mut agent = RandomAgent::with_seed(rules, 11);
        let legal = generate_legal_moves(&position, &rules);

        for _ in 0..16 {
            let mv = agent.best_move(&position, &History::new()).unwrap();
            assert!(legal.contains(&mv));
        }
    }

    #[test]
    fn test_no_move_when_mated() {
        let position =
            Position::decode("wk,.,.,.,wn,wr,.,bk:b", Geometry::standard(Variant::SingleFile))
                .unwrap();
        let mut agent = RandomAgent::new(RuleSet::default());
        assert!(agent.best_move(&position, &History::new()).is_none());
    }
}
