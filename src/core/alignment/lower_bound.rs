//! K-mer lower-bound rejecter.
//!
//! Never produces an alignment. It counts read k-mers that do not occur in
//! the template window an alignment could reach; each such "novel" k-mer
//! overlaps at least one difference, and a single difference touches at most
//! one k-mer per residue class `i % k`. The largest per-class count times the
//! cheapest per-difference charge therefore bounds the alignment score from
//! below. If that bound exceeds the budget the read is rejected outright.

use super::actions::AlignmentRecord;
use super::aligner::{AlignQuery, EditDistance};
use super::penalties::Penalties;
use super::seed::SeedShifter;
use super::workspace::KmerOccurrences;

/// Smallest and largest supported word sizes. The occurrence table holds
/// `4^k` slots.
pub const MIN_WORD_SIZE: usize = 2;
pub const MAX_WORD_SIZE: usize = 10;

/// How far either side of each read k-mer the template window reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preroll {
    /// The full shift band. Never rejects an alignment the banded aligner
    /// would accept.
    #[default]
    Band,
    /// `min(max_shift, max_score)`, or `max_shift` when gap extension is
    /// free. Narrower and faster; only exact when alignment starts cannot
    /// drift without paying for indels.
    Budget,
    /// `min(max_shift, cap)`.
    Capped(i32),
}

#[derive(Debug)]
pub struct LowerBoundAligner {
    penalties: Penalties,
    k: usize,
    preroll: Preroll,
    occurrences: KmerOccurrences,
    buckets: Vec<u32>,
}

impl LowerBoundAligner {
    pub fn new(penalties: Penalties, k: usize, preroll: Preroll) -> Self {
        assert!(
            (MIN_WORD_SIZE..=MAX_WORD_SIZE).contains(&k),
            "lower-bound word size must be in {MIN_WORD_SIZE}..={MAX_WORD_SIZE}, got {k}"
        );
        Self {
            penalties,
            k,
            preroll,
            occurrences: KmerOccurrences::default(),
            buckets: vec![0; k],
        }
    }

    fn preroll_for(&self, query: &AlignQuery<'_>) -> i32 {
        match self.preroll {
            Preroll::Band => query.max_shift,
            Preroll::Budget if self.penalties.gap_extend == 0 => query.max_shift,
            Preroll::Budget => query.max_shift.min(query.max_score.max(0)),
            Preroll::Capped(cap) => query.max_shift.min(cap.max(0)),
        }
    }

    /// Cheapest charge that a single difference can be held responsible for.
    ///
    /// An insertion run of length `L` touches `L + k - 1` consecutive k-mer
    /// starts, i.e. up to `ceil((L + k - 1) / k)` per residue class, so the
    /// charge is capped by its cost divided by that count for every run
    /// length the band admits.
    fn difference_charge(&self, max_insertion: i32) -> i32 {
        let k = self.k as i32;
        let mut charge = self.penalties.substitution;
        for len in 1..=max_insertion.max(1) {
            let touched = (len + k - 1 + k - 1) / k;
            charge = charge.min(self.penalties.gap_cost(len) / touched);
        }
        charge
    }

    /// Lower bound on the alignment score, or `None` if the estimate had to
    /// be abandoned.
    pub fn lower_bound(&mut self, query: &AlignQuery<'_>) -> Option<i32> {
        let read = query.read_slice();
        let k = self.k;
        if read.len() < k {
            return None;
        }
        if read.iter().any(|&r| self.penalties.is_unknown(r)) {
            return None;
        }

        let preroll = self.preroll_for(query) as i64;
        let start = query.template_start as i64;
        let first = start - preroll;
        let last = start + read.len() as i64 + preroll;

        let template = query.template;
        let mut charge = self.difference_charge((2 * preroll).min(read.len() as i64) as i32);
        if first < 0 || last > template.len() as i64 {
            if self.penalties.unknown == 0 {
                return None;
            }
            charge = charge.min(self.penalties.unknown);
        }
        let len = template.len() as i64;
        let lo = first.clamp(0, len);
        let hi = last.clamp(lo, len);
        if template[lo as usize..hi as usize]
            .iter()
            .any(|&t| self.penalties.is_unknown(t))
        {
            return None;
        }
        if charge <= 0 {
            return None;
        }

        self.occurrences.begin(k);
        self.buckets.iter_mut().for_each(|b| *b = 0);

        let mut template_seed = SeedShifter::new(k);
        let mut read_seed = SeedShifter::new(k);
        // Next template position to shift in.
        let mut next_template = first;

        for (i, &r) in read.iter().enumerate() {
            read_seed.step(r);
            if i + 1 < k {
                continue;
            }
            let kmer_start = (i + 1 - k) as i64;
            let frontier = start + kmer_start + preroll;
            while next_template < frontier + k as i64 {
                template_seed.step_at(template, next_template);
                if let Some(kmer) = template_seed.seed() {
                    self.occurrences.insert(kmer, next_template + 1 - k as i64);
                }
                next_template += 1;
            }

            let window_start = start + kmer_start - preroll;
            let seen = read_seed
                .seed()
                .and_then(|kmer| self.occurrences.last_seen(kmer))
                .is_some_and(|pos| pos >= window_start);
            if !seen {
                self.buckets[kmer_start as usize % k] += 1;
            }
        }

        let worst = self.buckets.iter().copied().max().unwrap_or(0) as i64;
        Some((worst * charge as i64).min(i32::MAX as i64) as i32)
    }
}

impl EditDistance for LowerBoundAligner {
    fn name(&self) -> &'static str {
        "lower-bound"
    }

    fn align(&mut self, query: &AlignQuery<'_>) -> Option<AlignmentRecord> {
        let bound = self.lower_bound(query)?;
        if bound > query.max_score {
            if log::log_enabled!(log::Level::Trace) {
                log::trace!(
                    "lower bound {} exceeds budget {} at {}",
                    bound,
                    query.max_score,
                    query.template_start
                );
            }
            return Some(AlignmentRecord::sentinel(query.template_start));
        }
        None
    }

    fn log_stats(&mut self) {
        log::debug!(
            "lower-bound: occurrence table holds {} bytes",
            self.occurrences.capacity_bytes()
        );
    }
}
