//! Seed-and-extend aligner for long reads.
//!
//! Full banded DP over a long read is costly when most of it matches. This
//! stage votes for the dominant diagonal using exact k-mer hits inside the
//! band, takes the longest exact run on that diagonal as the anchor, and only
//! runs the affine aligner on the flanks: end-pinned to the left of the
//! anchor, start-pinned to the right. Each flank's band is centred on the
//! anchor, so the assembled path is checked against the query's own band.
//! It commits only when the path stays inside that band, the combined score
//! fits the budget and re-scores consistently; otherwise it defers.

use rustc_hash::FxHashMap;

use super::actions::{Action, AlignmentRecord};
use super::affine_gap::AffineGapAligner;
use super::aligner::{AlignQuery, EditDistance};
use super::penalties::Penalties;
use super::seed::SeedShifter;
use crate::core::compute::encoding::code_at;

/// Exact match between `read[read_start..read_end]` and the template on
/// `diagonal` (relative to the query's template start).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub read_start: usize,
    pub read_end: usize,
    pub diagonal: i32,
}

impl Anchor {
    pub fn len(&self) -> usize {
        self.read_end - self.read_start
    }

    pub fn is_empty(&self) -> bool {
        self.read_end == self.read_start
    }
}

type KmerLookup = FxHashMap<u64, Vec<i64>>;

/// Whether every diagonal visited by `actions`, starting on `diagonal`,
/// lies within `[-max_shift, max_shift]`.
fn stays_in_band(mut diagonal: i32, actions: &[Action], max_shift: i32) -> bool {
    if diagonal.abs() > max_shift {
        return false;
    }
    for action in actions {
        match action {
            Action::DeletionFromReference => diagonal += 1,
            Action::InsertionIntoReference => diagonal -= 1,
            _ => continue,
        }
        if diagonal.abs() > max_shift {
            return false;
        }
    }
    true
}

#[derive(Debug)]
pub struct SeedExtendAligner {
    penalties: Penalties,
    k: usize,
    min_read_len: usize,
    extender: AffineGapAligner,
    lookup: KmerLookup,
    votes: FxHashMap<i32, u32>,
}

impl SeedExtendAligner {
    pub fn new(penalties: Penalties, k: usize, min_read_len: usize) -> Self {
        Self {
            extender: AffineGapAligner::new(penalties.clone()),
            penalties,
            k,
            min_read_len,
            lookup: FxHashMap::default(),
            votes: FxHashMap::default(),
        }
    }

    /// Longest exact run on the most-voted diagonal, if any reaches `k`.
    pub fn find_anchor(&mut self, query: &AlignQuery<'_>) -> Option<Anchor> {
        let read = query.read_slice();
        let k = self.k;
        if read.len() < k {
            return None;
        }
        let start = query.template_start as i64;
        let shift = query.max_shift as i64;

        self.lookup.clear();
        let mut seed = SeedShifter::new(k);
        for pos in start - shift..start + read.len() as i64 + shift {
            seed.step_at(query.template, pos);
            if let Some(kmer) = seed.seed() {
                self.lookup.entry(kmer).or_default().push(pos + 1 - k as i64);
            }
        }

        self.votes.clear();
        seed.reset();
        for (i, &r) in read.iter().enumerate() {
            seed.step(r);
            let Some(kmer) = seed.seed() else { continue };
            let Some(hits) = self.lookup.get(&kmer) else { continue };
            let read_start = (i + 1 - k) as i64;
            for &t in hits {
                let d = t - start - read_start;
                if d.abs() <= shift {
                    *self.votes.entry(d as i32).or_insert(0) += 1;
                }
            }
        }
        let (&diagonal, _) = self
            .votes
            .iter()
            .max_by_key(|&(&d, &n)| (n, std::cmp::Reverse(d.unsigned_abs()), d))?;

        let unknown = self.penalties.unknown_code();
        let mut best = Anchor {
            read_start: 0,
            read_end: 0,
            diagonal,
        };
        let mut run_start = 0;
        for (i, &r) in read.iter().enumerate() {
            let t = code_at(query.template, start + i as i64 + diagonal as i64, unknown);
            if r != t || self.penalties.is_unknown(r) {
                run_start = i + 1;
            } else if i + 1 - run_start > best.len() {
                best.read_start = run_start;
                best.read_end = i + 1;
            }
        }
        (best.len() >= k).then_some(best)
    }

    fn extend(&mut self, query: &AlignQuery<'_>, anchor: Anchor) -> Option<AlignmentRecord> {
        let read = query.read_slice();
        let anchor_template = query.template_start + anchor.read_start as i32 + anchor.diagonal;
        let anchor_len = anchor.len() as i32;

        let left = if anchor.read_start > 0 {
            let q = AlignQuery {
                read: &read[..anchor.read_start],
                read_len: anchor.read_start,
                ..*query
            };
            let rec = self.extender.align_fixed_end(&q, anchor_template).ok()??;
            if rec.is_sentinel() {
                return None;
            }
            rec
        } else {
            AlignmentRecord::new(0, anchor_template, Vec::new())
        };

        let right = if anchor.read_end < read.len() {
            let q = AlignQuery {
                read: &read[anchor.read_end..],
                read_len: read.len() - anchor.read_end,
                template_start: anchor_template + anchor_len,
                max_score: query.max_score - left.score(),
                ..*query
            };
            let rec = self.extender.align_fixed_start(&q).ok()??;
            if rec.is_sentinel() {
                return None;
            }
            rec
        } else {
            AlignmentRecord::new(0, anchor_template + anchor_len, Vec::new())
        };

        let score = left.score() + right.score();
        if score > query.max_score {
            return None;
        }
        let mut actions = Vec::with_capacity(read.len() + 8);
        actions.extend_from_slice(left.actions());
        actions.extend(std::iter::repeat(Action::Same).take(anchor.len()));
        actions.extend_from_slice(right.actions());

        let start_diagonal = left.template_start() - query.template_start;
        if !stays_in_band(start_diagonal, &actions, query.max_shift) {
            log::trace!(
                "seed-extend path leaves the band at {}; deferring",
                query.template_start
            );
            return None;
        }

        let rescored =
            self.penalties
                .score_actions(read, query.template, left.template_start(), &actions);
        if rescored != score {
            log::warn!(
                "seed-extend score {} disagrees with rescoring {} at {}; deferring",
                score,
                rescored,
                query.template_start
            );
            return None;
        }
        Some(AlignmentRecord::new(score, left.template_start(), actions))
    }
}

impl EditDistance for SeedExtendAligner {
    fn name(&self) -> &'static str {
        "seed-extend"
    }

    fn align(&mut self, query: &AlignQuery<'_>) -> Option<AlignmentRecord> {
        if query.read_len < self.min_read_len {
            return None;
        }
        let anchor = self.find_anchor(query)?;
        log::trace!(
            "seed-extend anchor {}..{} on diagonal {}",
            anchor.read_start,
            anchor.read_end,
            anchor.diagonal
        );
        self.extend(query, anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_sequence(rng: &mut StdRng, len: usize) -> Vec<u8> {
        (0..len).map(|_| rng.gen_range(0..4)).collect()
    }

    fn penalties() -> Penalties {
        Penalties::new(9, 5, 19, 1)
    }

    #[test]
    fn test_short_reads_are_deferred() {
        let mut rng = StdRng::seed_from_u64(11);
        let template = random_sequence(&mut rng, 200);
        let read = template[50..150].to_vec();
        let mut a = SeedExtendAligner::new(penalties(), 12, 256);
        assert!(a
            .align(&AlignQuery::new(&read, read.len(), &template, 50, 100, 5))
            .is_none());
    }

    #[test]
    fn test_anchor_on_dominant_diagonal() {
        let mut rng = StdRng::seed_from_u64(5);
        let template = random_sequence(&mut rng, 400);
        let mut read = template[102..352].to_vec();
        read[60] = (read[60] + 1) % 4;
        let mut a = SeedExtendAligner::new(penalties(), 12, 100);
        let q = AlignQuery::new(&read, read.len(), &template, 100, 50, 4);
        let anchor = a.find_anchor(&q).unwrap();
        assert_eq!(anchor.diagonal, 2);
        assert_eq!((anchor.read_start, anchor.read_end), (61, 250));
    }

    #[test]
    fn test_matches_affine_score_on_long_read() {
        let mut rng = StdRng::seed_from_u64(7);
        let template = random_sequence(&mut rng, 500);
        let mut read = template[100..400].to_vec();
        read[50] = (read[50] + 1) % 4;
        read.remove(200);
        let q = AlignQuery::new(&read, read.len(), &template, 100, 60, 6);

        let mut seed_extend = SeedExtendAligner::new(penalties(), 12, 256);
        let rec = seed_extend.align(&q).unwrap();
        let mut affine = AffineGapAligner::new(penalties());
        let exact = affine.align(&q).unwrap();

        assert_eq!(rec.score(), 29);
        assert_eq!(rec.score(), exact.score());
        assert_eq!(rec.template_start(), 100);
        assert_eq!(
            penalties().score_actions(&read, &template, rec.template_start(), rec.actions()),
            rec.score()
        );
    }

    #[test]
    fn test_path_leaving_the_band_defers() {
        let mut rng = StdRng::seed_from_u64(21);
        let template = random_sequence(&mut rng, 500);
        // halves on diagonals +4 and +8 relative to the candidate position
        let mut read = template[104..300].to_vec();
        read.extend_from_slice(&template[304..404]);
        let q = AlignQuery::new(&read, read.len(), &template, 100, 40, 4);

        let mut seed_extend = SeedExtendAligner::new(penalties(), 12, 256);
        assert!(seed_extend.align(&q).is_none());
        let mut affine = AffineGapAligner::new(penalties());
        assert!(affine.align(&q).unwrap().is_sentinel());

        // with room for both diagonals the same read is placed
        let roomy = AlignQuery { max_shift: 8, ..q };
        let rec = seed_extend.align(&roomy).unwrap();
        assert_eq!(rec.score(), affine.align(&roomy).unwrap().score());
    }

    #[test]
    fn test_band_walk() {
        use Action::*;
        assert!(stays_in_band(2, &[Same, DeletionFromReference, Same], 3));
        assert!(!stays_in_band(3, &[Same, DeletionFromReference], 3));
        assert!(stays_in_band(-3, &[DeletionFromReference, InsertionIntoReference], 3));
        assert!(!stays_in_band(-4, &[], 3));
    }

    #[test]
    fn test_unrelated_read_has_no_anchor() {
        let mut rng = StdRng::seed_from_u64(3);
        let template = random_sequence(&mut rng, 600);
        let read = random_sequence(&mut rng, 300);
        let mut a = SeedExtendAligner::new(penalties(), 12, 256);
        assert!(a
            .align(&AlignQuery::new(&read, read.len(), &template, 100, 60, 6))
            .is_none());
    }

    #[test]
    fn test_over_budget_defers() {
        let mut rng = StdRng::seed_from_u64(9);
        let template = random_sequence(&mut rng, 500);
        let mut read = template[100..400].to_vec();
        for pos in [20, 80, 260] {
            read[pos] = (read[pos] + 2) % 4;
        }
        let mut a = SeedExtendAligner::new(penalties(), 12, 256);
        assert!(a
            .align(&AlignQuery::new(&read, read.len(), &template, 100, 20, 6))
            .is_none());
    }
}
