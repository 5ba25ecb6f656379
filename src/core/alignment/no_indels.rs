//! Fast substitution-only aligner.
//!
//! Compares read and template in lock-step on the anchor diagonal. A handful
//! of mismatches can be cheaper than a single indel; beyond
//! `floor((gap_open + gap_extend) / substitution)` of them an indel might win,
//! so the question is passed on.
//!
//! With a non-zero shift the anchor diagonal only wins if no other diagonal
//! in the band is strictly cheaper; the neighbours are scanned with the
//! anchor score as a cut-off before committing.

use super::actions::{Action, AlignmentRecord};
use super::aligner::{AlignQuery, EditDistance};
use super::penalties::Penalties;
use crate::core::compute::encoding::code_at;

#[derive(Debug)]
pub struct NoIndelsAligner {
    penalties: Penalties,
    max_mismatches: usize,
    mismatch_positions: Vec<usize>,
}

impl NoIndelsAligner {
    pub fn new(penalties: Penalties) -> Self {
        let max_mismatches = (penalties.min_indel_cost() / penalties.substitution.max(1)) as usize;
        Self {
            penalties,
            max_mismatches,
            mismatch_positions: Vec::new(),
        }
    }

    /// Mismatches above which an indel alignment could be cheaper.
    pub fn max_mismatches(&self) -> usize {
        self.max_mismatches
    }

    /// Whether some ungapped alignment on another diagonal of the band costs
    /// less than `bound`.
    fn cheaper_diagonal_exists(&self, query: &AlignQuery<'_>, bound: i32) -> bool {
        let read = query.read_slice();
        let unknown = self.penalties.unknown_code();
        let start = query.template_start as i64;
        (-query.max_shift..=query.max_shift)
            .filter(|&d| d != 0)
            .any(|d| {
                let mut cost = 0;
                for (i, &r) in read.iter().enumerate() {
                    let t = code_at(query.template, start + d as i64 + i as i64, unknown);
                    cost += self.penalties.column_cost(r, t);
                    if cost >= bound {
                        return false;
                    }
                }
                true
            })
    }
}

impl EditDistance for NoIndelsAligner {
    fn name(&self) -> &'static str {
        "no-indels"
    }

    fn align(&mut self, query: &AlignQuery<'_>) -> Option<AlignmentRecord> {
        let start = query.template_start as i64;
        if start < 0 || query.ungapped_end() > query.template.len() as i64 {
            return None;
        }
        let read = query.read_slice();
        let window = &query.template[start as usize..start as usize + read.len()];

        self.mismatch_positions.clear();
        for (pos, (&r, &t)) in read.iter().zip(window).enumerate() {
            if self.penalties.is_unknown(r) || self.penalties.is_unknown(t) {
                return None;
            }
            if r != t {
                if self.mismatch_positions.len() == self.max_mismatches {
                    return None;
                }
                self.mismatch_positions.push(pos);
            }
        }

        let score: i32 = self
            .mismatch_positions
            .iter()
            .map(|&pos| self.penalties.column_cost(read[pos], window[pos]))
            .sum();
        if score > query.max_score {
            // Only the anchor diagonal is admissible without shift.
            return (query.max_shift == 0).then(|| AlignmentRecord::sentinel(query.template_start));
        }
        if query.max_shift > 0 && score > 0 {
            // Any gapped path costs at least one indel.
            if score >= self.penalties.min_indel_cost()
                || self.cheaper_diagonal_exists(query, score)
            {
                return None;
            }
        }

        let mut actions = vec![Action::Same; read.len()];
        for &pos in &self.mismatch_positions {
            actions[pos] = Action::Mismatch;
        }
        Some(AlignmentRecord::new(score, query.template_start, actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute::encoding::ResidueAlphabet;

    fn enc(s: &str) -> Vec<u8> {
        ResidueAlphabet::Nucleotide.encode_sequence(s.as_bytes())
    }

    fn aligner() -> NoIndelsAligner {
        NoIndelsAligner::new(Penalties::new(9, 5, 19, 1))
    }

    #[test]
    fn test_max_mismatches_from_penalties() {
        assert_eq!(aligner().max_mismatches(), 2);
        assert_eq!(NoIndelsAligner::new(Penalties::new(1, 1, 5, 2)).max_mismatches(), 7);
    }

    #[test]
    fn test_exact_match() {
        let (read, template) = (enc("ACGT"), enc("ACGT"));
        let rec = aligner()
            .align(&AlignQuery::new(&read, 4, &template, 0, 5, 0))
            .unwrap();
        assert_eq!(rec.score(), 0);
        assert_eq!(rec.actions(), &[Action::Same; 4]);
    }

    #[test]
    fn test_single_mismatch() {
        let (read, template) = (enc("ACGA"), enc("ACGT"));
        let rec = aligner()
            .align(&AlignQuery::new(&read, 4, &template, 0, 10, 0))
            .unwrap();
        assert_eq!(rec.score(), 9);
        assert_eq!(
            rec.actions(),
            &[Action::Same, Action::Same, Action::Same, Action::Mismatch]
        );
    }

    #[test]
    fn test_unknown_defers() {
        let (read, template) = (enc("ACGT"), enc("ACNT"));
        assert!(aligner()
            .align(&AlignQuery::new(&read, 4, &template, 0, 50, 0))
            .is_none());
    }

    #[test]
    fn test_too_many_mismatches_defers() {
        let (read, template) = (enc("TTTTAC"), enc("AAAAAC"));
        assert!(aligner()
            .align(&AlignQuery::new(&read, 6, &template, 0, 100, 0))
            .is_none());
    }

    #[test]
    fn test_over_budget_sentinel_only_without_shift() {
        let (read, template) = (enc("ACGTTT"), enc("ACGAAT"));
        let mut a = aligner();
        let rec = a.align(&AlignQuery::new(&read, 6, &template, 0, 10, 0)).unwrap();
        assert!(rec.is_sentinel());
        assert!(a.align(&AlignQuery::new(&read, 6, &template, 0, 10, 2)).is_none());
    }

    #[test]
    fn test_cheaper_shifted_diagonal_defers() {
        // the anchor diagonal costs one mismatch, diagonal +1 matches exactly
        let read = enc("AAAAAAAAAAAA");
        let template = enc("CAAAAAAAAAAAAG");
        let mut a = aligner();
        assert!(a.align(&AlignQuery::new(&read, 12, &template, 0, 30, 2)).is_none());

        let rec = a.align(&AlignQuery::new(&read, 12, &template, 0, 30, 0)).unwrap();
        assert_eq!(rec.score(), 9);
        let rec = a.align(&AlignQuery::new(&read, 12, &template, 1, 30, 2)).unwrap();
        assert_eq!(rec.score(), 0);
        assert_eq!(rec.template_start(), 1);
    }

    #[test]
    fn test_equal_shifted_diagonal_keeps_anchor() {
        // diagonals 0 and +1 both carry one mismatch; the anchor wins the tie
        let read = enc("AAAAAAAAAAAA");
        let template = enc("CAAAAAAAAAAAC");
        let rec = aligner()
            .align(&AlignQuery::new(&read, 12, &template, 0, 30, 1))
            .unwrap();
        assert_eq!(rec.score(), 9);
        assert_eq!(rec.template_start(), 0);
    }

    #[test]
    fn test_out_of_bounds_defers() {
        let (read, template) = (enc("ACGT"), enc("ACGT"));
        let mut a = aligner();
        assert!(a.align(&AlignQuery::new(&read, 4, &template, -1, 10, 0)).is_none());
        assert!(a.align(&AlignQuery::new(&read, 4, &template, 1, 10, 0)).is_none());
    }

    #[test]
    fn test_uses_read_len_prefix() {
        let (read, template) = (enc("ACGTTTTT"), enc("GGACGT"));
        let rec = aligner()
            .align(&AlignQuery::new(&read, 4, &template, 2, 0, 0))
            .unwrap();
        assert_eq!(rec.score(), 0);
        assert_eq!(rec.template_start(), 2);
        assert_eq!(rec.read_span(), 4);
    }
}
