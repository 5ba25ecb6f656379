//! Scoring convention shared by every aligner in a chain.
//!
//! Scores are non-negative costs; lower is better. An indel run of length `L`
//! costs `gap_open + gap_extend * L`. Unknown residues on either side of a
//! column cost `unknown` and never count as a match. In protein mode the
//! substitution cost comes from a [`ProteinMatrix`] instead of the fixed
//! mismatch penalty.

use std::sync::Arc;

use super::actions::Action;
use crate::core::compute::encoding::{PROTEIN_ALPHABET_SIZE, ResidueAlphabet, code_at};
use crate::error::ConfigError;

/// BLOSUM62 similarity scores in `ARNDCQEGHILKMFPSTWYVBJZX*` order.
#[rustfmt::skip]
pub static BLOSUM62: [i8; PROTEIN_ALPHABET_SIZE * PROTEIN_ALPHABET_SIZE] = [
    //       A,  R,  N,  D,  C,  Q,  E,  G,  H,  I,  L,  K,  M,  F,  P,  S,  T,  W,  Y,  V,  B,  J,  Z,  X,  *
    /*A*/    4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0, -2, -1, -1, -1, -4,
    /*R*/   -1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3, -1, -2,  0, -1, -4,
    /*N*/   -2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3,  4, -3,  0, -1, -4,
    /*D*/   -2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3,  4, -3,  1, -1, -4,
    /*C*/    0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1, -3, -1, -3, -1, -4,
    /*Q*/   -1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2,  0, -2,  4, -1, -4,
    /*E*/   -1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2,  1, -3,  4, -1, -4,
    /*G*/    0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3, -1, -4, -2, -1, -4,
    /*H*/   -2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3,  0, -3,  0, -1, -4,
    /*I*/   -1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3, -3,  3, -3, -1, -4,
    /*L*/   -1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1, -4,  3, -3, -1, -4,
    /*K*/   -1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2,  0, -3,  1, -1, -4,
    /*M*/   -1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1, -3,  2, -1, -1, -4,
    /*F*/   -2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1, -3,  0, -3, -1, -4,
    /*P*/   -1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2, -2, -3, -1, -1, -4,
    /*S*/    1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2,  0, -2,  0, -1, -4,
    /*T*/    0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0, -1, -1, -1, -1, -4,
    /*W*/   -3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3, -4, -2, -2, -1, -4,
    /*Y*/   -2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1, -3, -1, -2, -1, -4,
    /*V*/    0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4, -3,  2, -2, -1, -4,
    /*B*/   -2, -1,  4,  4, -3,  0,  1, -1,  0, -3, -4,  0, -3, -3, -2,  0, -1, -4, -3, -3,  4, -3,  0, -1, -4,
    /*J*/   -1, -2, -3, -3, -1, -2, -3, -4, -3,  3,  3, -3,  2,  0, -3, -2, -1, -2, -1,  2, -3,  3, -3, -1, -4,
    /*Z*/   -1,  0,  0,  1, -3,  4,  4, -2,  0, -3, -3,  1, -1, -3, -1,  0, -1, -2, -2, -2,  0, -3,  4, -1, -4,
    /*X*/   -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, -4,
    /***/   -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4,  1,
];

/// Substitution costs derived from a protein similarity matrix.
///
/// Similarity `s` becomes the cost `(s(a,a) + s(b,b)) / 2 - s(a,b)`, which is zero
/// on the diagonal and non-negative for the usual log-odds matrices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProteinMatrix {
    costs: Vec<i32>,
}

impl ProteinMatrix {
    pub fn from_similarity(scores: &[i8; PROTEIN_ALPHABET_SIZE * PROTEIN_ALPHABET_SIZE]) -> Self {
        let n = PROTEIN_ALPHABET_SIZE;
        let mut costs = vec![0i32; n * n];
        for a in 0..n {
            for b in 0..n {
                let self_a = scores[a * n + a] as i32;
                let self_b = scores[b * n + b] as i32;
                costs[a * n + b] = ((self_a + self_b) / 2 - scores[a * n + b] as i32).max(0);
            }
        }
        Self { costs }
    }

    pub fn blosum62() -> Self {
        Self::from_similarity(&BLOSUM62)
    }

    #[inline(always)]
    pub fn cost(&self, a: u8, b: u8) -> i32 {
        self.costs[a as usize * PROTEIN_ALPHABET_SIZE + b as usize]
    }

    /// Cheapest non-zero substitution in the matrix.
    pub fn min_substitution(&self) -> i32 {
        self.costs.iter().copied().filter(|&c| c > 0).min().unwrap_or(1)
    }
}

/// Immutable per-run penalty configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Penalties {
    pub substitution: i32,
    pub unknown: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
    alphabet: ResidueAlphabet,
    matrix: Option<Arc<ProteinMatrix>>,
}

impl Penalties {
    pub fn new(substitution: i32, unknown: i32, gap_open: i32, gap_extend: i32) -> Self {
        Self {
            substitution,
            unknown,
            gap_open,
            gap_extend,
            alphabet: ResidueAlphabet::Nucleotide,
            matrix: None,
        }
    }

    /// Protein scoring: substitutions come from `matrix`, `substitution` is kept
    /// as the cheapest non-zero matrix cost for bound computations.
    pub fn protein(matrix: ProteinMatrix, unknown: i32, gap_open: i32, gap_extend: i32) -> Self {
        Self {
            substitution: matrix.min_substitution(),
            unknown,
            gap_open,
            gap_extend,
            alphabet: ResidueAlphabet::Protein,
            matrix: Some(Arc::new(matrix)),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.substitution <= 0 {
            return Err(ConfigError::NonPositiveSubstitution(self.substitution));
        }
        for (name, value) in [
            ("unknown", self.unknown),
            ("gap open", self.gap_open),
            ("gap extend", self.gap_extend),
        ] {
            if value < 0 {
                return Err(ConfigError::NegativePenalty { name, value });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn alphabet(&self) -> ResidueAlphabet {
        self.alphabet
    }

    #[inline(always)]
    pub fn unknown_code(&self) -> u8 {
        self.alphabet.unknown_code()
    }

    #[inline(always)]
    pub fn is_unknown(&self, code: u8) -> bool {
        self.alphabet.is_unknown(code)
    }

    /// Cost of an indel run of `len` bases.
    #[inline(always)]
    pub fn gap_cost(&self, len: i32) -> i32 {
        self.gap_open + self.gap_extend * len
    }

    /// Cost of the cheapest possible indel.
    #[inline(always)]
    pub fn min_indel_cost(&self) -> i32 {
        self.gap_open + self.gap_extend
    }

    /// Cost of aligning read residue `r` against template residue `t`.
    #[inline(always)]
    pub fn column_cost(&self, r: u8, t: u8) -> i32 {
        if self.is_unknown(r) || self.is_unknown(t) {
            return self.unknown;
        }
        match &self.matrix {
            Some(m) => m.cost(r, t),
            None if r == t => 0,
            None => self.substitution,
        }
    }

    /// Action recorded for a read/template column.
    #[inline(always)]
    pub fn column_action(&self, r: u8, t: u8) -> Action {
        if r == t && !self.is_unknown(r) {
            Action::Same
        } else {
            Action::Mismatch
        }
    }

    /// Re-score an action list against the sequences it claims to align.
    ///
    /// Soft-clipped read bases cost nothing. Template positions outside the
    /// template behave as unknown residues.
    pub fn score_actions(
        &self,
        read: &[u8],
        template: &[u8],
        template_start: i32,
        actions: &[Action],
    ) -> i32 {
        let unknown = self.unknown_code();
        let mut score = 0;
        let mut ri = 0usize;
        let mut ti = template_start as i64;
        let mut previous: Option<Action> = None;

        for &action in actions {
            match action {
                Action::Same | Action::Mismatch => {
                    let r = read.get(ri).copied().unwrap_or(unknown);
                    score += self.column_cost(r, code_at(template, ti, unknown));
                    ri += 1;
                    ti += 1;
                }
                Action::InsertionIntoReference | Action::DeletionFromReference => {
                    score += if previous == Some(action) {
                        self.gap_extend
                    } else {
                        self.gap_cost(1)
                    };
                    if action == Action::InsertionIntoReference {
                        ri += 1;
                    } else {
                        ti += 1;
                    }
                }
                Action::SoftClip => ri += 1,
            }
            previous = Some(action);
        }
        score
    }
}

impl Default for Penalties {
    fn default() -> Self {
        use crate::defaults::*;
        Self::new(
            SUBSTITUTION_PENALTY,
            UNKNOWN_PENALTY,
            GAP_OPEN_PENALTY,
            GAP_EXTEND_PENALTY,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Action::*;

    #[test]
    fn test_column_cost_nucleotide() {
        let p = Penalties::new(9, 5, 19, 1);
        assert_eq!(p.column_cost(0, 0), 0);
        assert_eq!(p.column_cost(0, 1), 9);
        assert_eq!(p.column_cost(4, 4), 5);
        assert_eq!(p.column_cost(2, 4), 5);
        assert_eq!(p.column_action(4, 4), Mismatch);
        assert_eq!(p.column_action(3, 3), Same);
    }

    #[test]
    fn test_gap_costs_are_affine() {
        let p = Penalties::new(9, 5, 19, 1);
        assert_eq!(p.gap_cost(1), 20);
        assert_eq!(p.gap_cost(3), 22);
        assert_eq!(p.min_indel_cost(), 20);
    }

    #[test]
    fn test_score_actions_counts_gap_runs_once() {
        let p = Penalties::new(9, 5, 19, 1);
        // read ACTT vs template ACGGTT: the GG deletion is one gap
        let read = [0, 1, 3, 3];
        let template = [0, 1, 2, 2, 3, 3];
        let actions = [Same, Same, DeletionFromReference, DeletionFromReference, Same, Same];
        assert_eq!(p.score_actions(&read, &template, 0, &actions), 21);

        // insertion immediately followed by deletion is two gaps
        let actions = [Same, InsertionIntoReference, DeletionFromReference, Same];
        assert_eq!(p.score_actions(&[0, 1, 3], &[0, 2, 3], 0, &actions), 40);
    }

    #[test]
    fn test_score_actions_out_of_range_is_unknown() {
        let p = Penalties::new(9, 5, 19, 1);
        let actions = [Same, Same];
        assert_eq!(p.score_actions(&[0, 0], &[1], -1, &actions), 5 + 9);
    }

    #[test]
    fn test_score_actions_ignores_soft_clips() {
        let p = Penalties::new(9, 5, 19, 1);
        let actions = [SoftClip, SoftClip, Same, Same];
        assert_eq!(p.score_actions(&[3, 3, 0, 1], &[0, 1], 0, &actions), 0);
    }

    #[test]
    fn test_blosum62_costs() {
        let m = ProteinMatrix::blosum62();
        // A/A diagonal is free
        assert_eq!(m.cost(0, 0), 0);
        // W/W free, W/A = (11 + 4)/2 - (-3) = 10
        assert_eq!(m.cost(17, 17), 0);
        assert_eq!(m.cost(17, 0), 10);
        // I/V = (4 + 4)/2 - 3 = 1
        assert_eq!(m.cost(9, 19), 1);
        assert_eq!(m.min_substitution(), 1);
    }

    #[test]
    fn test_protein_penalties_treat_x_as_unknown() {
        let p = Penalties::protein(ProteinMatrix::blosum62(), 3, 11, 1);
        assert_eq!(p.alphabet(), ResidueAlphabet::Protein);
        assert_eq!(p.column_cost(23, 0), 3);
        assert_eq!(p.column_cost(9, 19), 1);
        assert_eq!(p.substitution, 1);
    }

    #[test]
    fn test_validate() {
        assert!(Penalties::new(9, 5, 19, 1).validate().is_ok());
        assert_eq!(
            Penalties::new(0, 5, 19, 1).validate(),
            Err(ConfigError::NonPositiveSubstitution(0))
        );
        assert_eq!(
            Penalties::new(9, 5, -1, 1).validate(),
            Err(ConfigError::NegativePenalty {
                name: "gap open",
                value: -1
            })
        );
    }
}
