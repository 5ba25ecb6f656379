//! The per-direction aligner contract.
//!
//! An aligner answers one question for a read anchored near `template_start`:
//! what is the cheapest alignment whose score fits in `max_score`?
//!
//! - `Some(record)` with a real score: an attainable alignment of that cost.
//! - `Some(record)` carrying [`MAX_SCORE`]: proof that nothing fits the budget.
//! - `None`: this aligner cannot decide; the next stage in the chain should.
//!
//! [`MAX_SCORE`]: super::actions::MAX_SCORE

use super::actions::AlignmentRecord;
use super::chain::ChainStats;
use crate::error::AlignError;

/// One alignment request. Sequences are residue codes; `read[..read_len]` is
/// aligned. `template_start` may lie outside the template.
#[derive(Debug, Clone, Copy)]
pub struct AlignQuery<'a> {
    pub read: &'a [u8],
    pub read_len: usize,
    pub template: &'a [u8],
    pub template_start: i32,
    pub max_score: i32,
    pub max_shift: i32,
    pub side_hint: bool,
}

impl<'a> AlignQuery<'a> {
    /// Build a query, panicking if `read_len` exceeds the read buffer.
    pub fn new(
        read: &'a [u8],
        read_len: usize,
        template: &'a [u8],
        template_start: i32,
        max_score: i32,
        max_shift: i32,
    ) -> Self {
        assert!(
            read_len <= read.len(),
            "read length {} exceeds read buffer of {}",
            read_len,
            read.len()
        );
        assert!(max_shift >= 0, "negative max shift {max_shift}");
        Self {
            read,
            read_len,
            template,
            template_start,
            max_score,
            max_shift,
            side_hint: false,
        }
    }

    pub fn with_side_hint(mut self, side_hint: bool) -> Self {
        self.side_hint = side_hint;
        self
    }

    /// The aligned part of the read.
    #[inline(always)]
    pub fn read_slice(&self) -> &'a [u8] {
        &self.read[..self.read_len]
    }

    /// Exclusive template end if the read aligned without indels.
    #[inline(always)]
    pub fn ungapped_end(&self) -> i64 {
        self.template_start as i64 + self.read_len as i64
    }
}

/// Behaviour shared by every stage of an alignment chain.
pub trait EditDistance {
    /// Short stage name used in statistics and diagnostics.
    fn name(&self) -> &'static str;

    /// Align with both ends free to drift within `max_shift`.
    fn align(&mut self, query: &AlignQuery<'_>) -> Option<AlignmentRecord>;

    /// Align with the template start pinned at `query.template_start`.
    fn align_fixed_start(
        &mut self,
        _query: &AlignQuery<'_>,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        Err(AlignError::Unsupported {
            aligner: self.name(),
            variant: "fixed-start",
        })
    }

    /// Align with the exclusive template end pinned at `template_end`.
    fn align_fixed_end(
        &mut self,
        _query: &AlignQuery<'_>,
        _template_end: i32,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        Err(AlignError::Unsupported {
            aligner: self.name(),
            variant: "fixed-end",
        })
    }

    /// Align with the start pinned at `query.template_start` and the
    /// exclusive end pinned at `template_end`.
    fn align_fixed_both(
        &mut self,
        _query: &AlignQuery<'_>,
        _template_end: i32,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        Err(AlignError::Unsupported {
            aligner: self.name(),
            variant: "fixed-both",
        })
    }

    /// Statistics of a composed chain, if this stage is (or wraps) one.
    fn chain_stats(&self) -> Option<&ChainStats> {
        None
    }

    /// Write accumulated statistics to the operator log.
    fn log_stats(&mut self) {}
}

/// Chain stages are owned trait objects; each worker owns its own set.
pub type BoxedEditDistance = Box<dyn EditDistance + Send>;

impl<T: EditDistance + ?Sized> EditDistance for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn align(&mut self, query: &AlignQuery<'_>) -> Option<AlignmentRecord> {
        (**self).align(query)
    }

    fn align_fixed_start(
        &mut self,
        query: &AlignQuery<'_>,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        (**self).align_fixed_start(query)
    }

    fn align_fixed_end(
        &mut self,
        query: &AlignQuery<'_>,
        template_end: i32,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        (**self).align_fixed_end(query, template_end)
    }

    fn align_fixed_both(
        &mut self,
        query: &AlignQuery<'_>,
        template_end: i32,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        (**self).align_fixed_both(query, template_end)
    }

    fn chain_stats(&self) -> Option<&ChainStats> {
        (**self).chain_stats()
    }

    fn log_stats(&mut self) {
        (**self).log_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Undecided;

    impl EditDistance for Undecided {
        fn name(&self) -> &'static str {
            "undecided"
        }

        fn align(&mut self, _query: &AlignQuery<'_>) -> Option<AlignmentRecord> {
            None
        }
    }

    #[test]
    fn test_fixed_variants_default_to_unsupported() {
        let mut aligner: BoxedEditDistance = Box::new(Undecided);
        let q = AlignQuery::new(&[0, 1], 2, &[0, 1], 0, 10, 0);
        assert_eq!(
            aligner.align_fixed_start(&q),
            Err(AlignError::Unsupported {
                aligner: "undecided",
                variant: "fixed-start"
            })
        );
        assert!(aligner.align_fixed_end(&q, 2).is_err());
        assert!(aligner.align_fixed_both(&q, 2).is_err());
        assert!(aligner.align(&q).is_none());
        assert!(aligner.chain_stats().is_none());
    }

    #[test]
    #[should_panic(expected = "exceeds read buffer")]
    fn test_read_len_beyond_buffer_panics() {
        let _ = AlignQuery::new(&[0, 1], 3, &[0, 1, 2], 0, 10, 0);
    }

    #[test]
    fn test_query_helpers() {
        let q = AlignQuery::new(&[0, 1, 2, 3], 3, &[], -2, 10, 1).with_side_hint(true);
        assert_eq!(q.read_slice(), &[0, 1, 2]);
        assert_eq!(q.ungapped_end(), 1);
        assert!(q.side_hint);
    }
}
