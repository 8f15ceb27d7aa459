use crate::search::{Candidate, Verdict};
use minichess_core::Disposition;
use rand::seq::SliceRandom;
use rand::Rng;

/// Default advantage, in centipawns, a cooperative player needs before it
/// plays for the win.
pub const COOPERATIVE_MARGIN: i32 = 50;

/// Picks the move to play from the searched root candidates.
///
/// Returns `None` only when there are no candidates.
pub fn select<R: Rng + ?Sized>(
    disposition: Disposition,
    candidates: &[Candidate],
    margin: i32,
    rng: &mut R,
) -> Option<Candidate> {
    match disposition {
        Disposition::Perfect => best_by(candidates, |c| c.score),
        Disposition::Aggressive => best_by(candidates, |c| (decisiveness(c.verdict), c.score)),
        Disposition::Cooperative => cooperative(candidates, margin, rng),
    }
}

/// Decisive results first, a draw last.
fn decisiveness(verdict: Verdict) -> u8 {
    match verdict {
        Verdict::Win => 3,
        Verdict::Unknown => 2,
        Verdict::Loss => 1,
        Verdict::Draw => 0,
    }
}

/// First candidate with the greatest key.
fn best_by<K: Ord>(candidates: &[Candidate], key: impl Fn(&Candidate) -> K) -> Option<Candidate> {
    let mut best: Option<&Candidate> = None;
    for candidate in candidates {
        match best {
            Some(b) if key(candidate) <= key(b) => {}
            _ => best = Some(candidate),
        }
    }
    best.copied()
}

fn cooperative<R: Rng + ?Sized>(
    candidates: &[Candidate],
    margin: i32,
    rng: &mut R,
) -> Option<Candidate> {
    let clear_wins: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.score > margin)
        .copied()
        .collect();
    if !clear_wins.is_empty() {
        return best_by(&clear_wins, |c| c.score);
    }

    let modest: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.score <= 0)
        .copied()
        .collect();
    let pool = if modest.is_empty() {
        candidates
    } else {
        modest.as_slice()
    };
    pool.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use minichess_core::{Move, Square};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn candidate(to: u8, score: i32, verdict: Verdict) -> Candidate {
        Candidate {
            mv: Move::new(Square::from_index(0), Square::from_index(to)),
            score,
            verdict,
        }
    }

    fn target(candidate: Option<Candidate>) -> u8 {
        candidate.unwrap().mv.to.index()
    }

    #[test]
    fn test_perfect_takes_first_best() {
        let mut rng = StdRng::seed_from_u64(1);
        let candidates = [
            candidate(1, 0, Verdict::Draw),
            candidate(2, 99_990, Verdict::Win),
            candidate(3, 99_990, Verdict::Win),
            candidate(4, -99_990, Verdict::Loss),
        ];
        assert_eq!(target(select(Disposition::Perfect, &candidates, 50, &mut rng)), 2);
    }

    #[test]
    fn test_aggressive_prefers_decisive_results() {
        let mut rng = StdRng::seed_from_u64(1);
        let candidates = [
            candidate(1, 0, Verdict::Draw),
            candidate(2, -99_990, Verdict::Loss),
        ];
        assert_eq!(target(select(Disposition::Aggressive, &candidates, 50, &mut rng)), 2);

        let candidates = [
            candidate(1, 0, Verdict::Draw),
            candidate(2, -99_990, Verdict::Loss),
            candidate(3, -40, Verdict::Unknown),
        ];
        assert_eq!(target(select(Disposition::Aggressive, &candidates, 50, &mut rng)), 3);

        let candidates = [
            candidate(3, 200, Verdict::Unknown),
            candidate(4, 99_980, Verdict::Win),
        ];
        assert_eq!(target(select(Disposition::Aggressive, &candidates, 50, &mut rng)), 4);
    }

    #[test]
    fn test_cooperative_plays_clear_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = [
            candidate(1, 0, Verdict::Draw),
            candidate(2, 120, Verdict::Unknown),
            candidate(3, 400, Verdict::Unknown),
        ];
        assert_eq!(target(select(Disposition::Cooperative, &candidates, 50, &mut rng)), 3);
    }

    #[test]
    fn test_cooperative_avoids_slight_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = [
            candidate(1, 0, Verdict::Unknown),
            candidate(2, 30, Verdict::Unknown),
            candidate(3, -10, Verdict::Unknown),
            candidate(4, 0, Verdict::Unknown),
        ];

        let mut seen = HashSet::new();
        for _ in 0..64 {
            let picked = target(select(Disposition::Cooperative, &candidates, 50, &mut rng));
            assert_ne!(picked, 2);
            seen.insert(picked);
        }
        assert!(seen.len() > 1, "cooperative choice never varied");
    }

    #[test]
    fn test_cooperative_falls_back_to_any_move() {
        let mut rng = StdRng::seed_from_u64(3);
        let candidates = [candidate(1, 20, Verdict::Unknown), candidate(2, 40, Verdict::Unknown)];
        let picked = target(select(Disposition::Cooperative, &candidates, 50, &mut rng));
        assert!(picked == 1 || picked == 2);
    }

    #[test]
    fn test_no_candidates() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select(Disposition::Perfect, &[], 50, &mut rng).is_none());
        assert!(select(Disposition::Cooperative, &[], 50, &mut rng).is_none());
    }
}
