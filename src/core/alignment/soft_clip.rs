//! Soft-clip post-processing of alignment records.
//!
//! Indels and mismatches close to a read end are usually alignment artefacts
//! rather than variation. Each end is scanned over the first
//! `max(indel_zone, mismatch_zone)` read positions (existing soft clips count
//! as positions but are not events). The innermost in-zone event becomes the
//! clip point and the clip extends inwards to the next match. Clipped read
//! bases turn into `SoftClip`, clipped deletions disappear, and a clipped
//! start moves the template start by the reference span removed.
//!
//! The score is kept as computed by the wrapped aligner. Records left with
//! fewer than `min_matches` matches are discarded (score set to the sentinel).

use super::actions::{Action, AlignmentRecord, MAX_SCORE};
use super::aligner::{AlignQuery, EditDistance};
use super::chain::ChainStats;
use crate::error::AlignError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftClipOpt {
    /// Read positions from each end in which an indel triggers clipping.
    pub indel_zone: usize,
    /// Read positions from each end in which a mismatch triggers clipping.
    pub mismatch_zone: usize,
    /// Minimum matches a clipped alignment must retain.
    pub min_matches: usize,
}

impl Default for SoftClipOpt {
    fn default() -> Self {
        use crate::defaults::*;
        Self {
            indel_zone: SOFT_CLIP_INDEL_ZONE,
            mismatch_zone: SOFT_CLIP_MISMATCH_ZONE,
            min_matches: SOFT_CLIP_MIN_MATCHES,
        }
    }
}

/// Index of the innermost clip-worthy event within the zones, scanning
/// actions from one end.
fn last_event(actions: impl Iterator<Item = (usize, Action)>, opt: &SoftClipOpt) -> Option<usize> {
    let scan = opt.indel_zone.max(opt.mismatch_zone);
    let mut read_pos = 0;
    let mut event = None;
    for (idx, action) in actions {
        if read_pos >= scan {
            break;
        }
        let in_zone = match action {
            Action::Mismatch => read_pos < opt.mismatch_zone,
            Action::InsertionIntoReference | Action::DeletionFromReference => {
                read_pos < opt.indel_zone
            }
            Action::Same | Action::SoftClip => false,
        };
        if in_zone {
            event = Some(idx);
        }
        if action.consumes_read() {
            read_pos += 1;
        }
    }
    event
}

/// Clip both ends of `record` in place. Returns true if the record changed.
pub fn clip_record(record: &mut AlignmentRecord, opt: &SoftClipOpt) -> bool {
    if record.is_sentinel() || record.actions().is_empty() {
        return false;
    }
    let actions = record.actions();
    let n = actions.len();

    let left_end = last_event(actions.iter().copied().enumerate(), opt).map(|mut idx| {
        while idx + 1 < n && actions[idx + 1] != Action::Same {
            idx += 1;
        }
        idx + 1
    });
    let right_start = last_event(actions.iter().copied().enumerate().rev(), opt).map(|mut idx| {
        while idx > 0 && actions[idx - 1] != Action::Same {
            idx -= 1;
        }
        idx
    });

    let changed = left_end.is_some() || right_start.is_some();
    if changed {
        let left_end = left_end.unwrap_or(0);
        let right_start = right_start.unwrap_or(n).max(left_end);
        let mut reference_clipped = 0;
        let mut clipped = Vec::with_capacity(n);
        for (idx, &action) in actions.iter().enumerate() {
            if idx >= left_end && idx < right_start {
                clipped.push(action);
                continue;
            }
            if idx < left_end && action.consumes_template() {
                reference_clipped += 1;
            }
            if action.consumes_read() {
                clipped.push(Action::SoftClip);
            }
        }
        let start = record.template_start() + reference_clipped;
        record.set_template_start(start);
        *record.actions_mut() = clipped;
    }

    if record.count(Action::Same) < opt.min_matches {
        record.set_score(MAX_SCORE);
        return true;
    }
    changed
}

/// Wraps an aligner and soft-clips every alignment it returns.
///
/// Fixed-anchor results pass through untouched: their ends are pinned by
/// the caller.
pub struct SoftClipper<A> {
    inner: A,
    opt: SoftClipOpt,
    clipped: u64,
    discarded: u64,
}

impl<A: EditDistance> SoftClipper<A> {
    pub fn new(inner: A, opt: SoftClipOpt) -> Self {
        Self {
            inner,
            opt,
            clipped: 0,
            discarded: 0,
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: EditDistance> EditDistance for SoftClipper<A> {
    fn name(&self) -> &'static str {
        "soft-clip"
    }

    fn align(&mut self, query: &AlignQuery<'_>) -> Option<AlignmentRecord> {
        let mut record = self.inner.align(query)?;
        if clip_record(&mut record, &self.opt) {
            if record.is_sentinel() {
                self.discarded += 1;
            } else {
                self.clipped += 1;
            }
        }
        Some(record)
    }

    fn align_fixed_start(
        &mut self,
        query: &AlignQuery<'_>,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        self.inner.align_fixed_start(query)
    }

    fn align_fixed_end(
        &mut self,
        query: &AlignQuery<'_>,
        template_end: i32,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        self.inner.align_fixed_end(query, template_end)
    }

    fn align_fixed_both(
        &mut self,
        query: &AlignQuery<'_>,
        template_end: i32,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        self.inner.align_fixed_both(query, template_end)
    }

    fn chain_stats(&self) -> Option<&ChainStats> {
        self.inner.chain_stats()
    }

    fn log_stats(&mut self) {
        log::info!(
            "soft-clip: {} records clipped, {} discarded below {} matches",
            self.clipped,
            self.discarded,
            self.opt.min_matches
        );
        self.inner.log_stats();
    }
}
