//! Forward / reverse-complement orientation wrapper.
//!
//! Callers always speak forward template coordinates. A reverse query aligns
//! the read as given against the reverse complement of the template, so the
//! wrapper mirrors the anchor into that frame, runs the reverse chain, and
//! mirrors the result back: the start becomes `L - start - reference_span`
//! and the action list is reversed so it reads along the forward template.

use std::fmt;
use std::sync::Arc;

use super::actions::AlignmentRecord;
use super::aligner::{AlignQuery, BoxedEditDistance, EditDistance};
use super::chain::ChainStats;
use crate::core::compute::encoding::reverse_complement_into;
use crate::error::AlignError;

/// Per-technology adjustment of the template span a read is expected to
/// cover. Used to mirror anchors into the reverse frame.
pub trait GapCorrection: fmt::Debug + Send {
    /// Template bases covered beyond `read_len` by a read of that length.
    fn span_offset(&self, read_len: usize) -> i32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoGapCorrection;

impl GapCorrection for NoGapCorrection {
    fn span_offset(&self, _read_len: usize) -> i32 {
        0
    }
}

/// Reads of exactly `read_length` bases span `offset` extra template bases.
///
/// Complete Genomics first-generation reads (35 bp) carry a known gap.
#[derive(Debug, Clone, Copy)]
pub struct FixedGapCorrection {
    pub read_length: usize,
    pub offset: i32,
}

impl FixedGapCorrection {
    pub fn complete_genomics_legacy() -> Self {
        Self {
            read_length: crate::defaults::CG_LEGACY_READ_LENGTH,
            offset: crate::defaults::CG_LEGACY_SPAN_OFFSET,
        }
    }
}

impl GapCorrection for FixedGapCorrection {
    fn span_offset(&self, read_len: usize) -> i32 {
        if read_len == self.read_length {
            self.offset
        } else {
            0
        }
    }
}

/// Forward and reverse chains plus the reverse-complement template cache.
///
/// One instance per worker: the chains and the cache are mutable scratch.
pub struct BidirectionalAligner {
    forward: BoxedEditDistance,
    reverse: Option<BoxedEditDistance>,
    correction: Box<dyn GapCorrection>,
    template: Option<Arc<[u8]>>,
    rc_template: Vec<u8>,
    rc_valid: bool,
}

impl BidirectionalAligner {
    pub fn new(
        forward: BoxedEditDistance,
        reverse: BoxedEditDistance,
        correction: Box<dyn GapCorrection>,
    ) -> Self {
        Self {
            forward,
            reverse: Some(reverse),
            correction,
            template: None,
            rc_template: Vec::new(),
            rc_valid: false,
        }
    }

    /// A single chain with no reverse-complement frame (protein data).
    pub fn single(chain: BoxedEditDistance) -> Self {
        Self {
            forward: chain,
            reverse: None,
            correction: Box::new(NoGapCorrection),
            template: None,
            rc_template: Vec::new(),
            rc_valid: false,
        }
    }

    pub fn is_bidirectional(&self) -> bool {
        self.reverse.is_some()
    }

    /// Replace the template; the reverse complement is rebuilt on first use.
    pub fn set_template(&mut self, template: Arc<[u8]>) {
        self.template = Some(template);
        self.rc_valid = false;
    }

    pub fn template(&self) -> Option<&[u8]> {
        self.template.as_deref()
    }

    pub fn forward_stats(&self) -> Option<&ChainStats> {
        self.forward.chain_stats()
    }

    pub fn reverse_stats(&self) -> Option<&ChainStats> {
        self.reverse.as_ref().and_then(|r| r.chain_stats())
    }

    fn forward_template(&self) -> Arc<[u8]> {
        match &self.template {
            Some(t) => Arc::clone(t),
            None => panic!("alignment requested before a template was set"),
        }
    }

    /// Template length, building the reverse-complement cache if stale.
    fn prepare_reverse(&mut self) -> i32 {
        assert!(
            self.reverse.is_some(),
            "reverse-complement alignment requested on a single-orientation aligner"
        );
        let template = self.forward_template();
        if !self.rc_valid {
            reverse_complement_into(&template, &mut self.rc_template);
            self.rc_valid = true;
            log::debug!("cached reverse complement of {} bp template", template.len());
        }
        template.len() as i32
    }

    /// Mirror a reverse-frame record into forward coordinates.
    fn mirror(record: AlignmentRecord, template_len: i32, fallback_start: i32) -> AlignmentRecord {
        if record.is_sentinel() {
            return AlignmentRecord::sentinel(fallback_start);
        }
        let start = template_len - record.template_start() - record.reference_span();
        let mut actions = record.actions().to_vec();
        actions.reverse();
        AlignmentRecord::new(record.score(), start, actions)
    }

    /// Anchor of a reverse query in the reverse-complement frame.
    fn mirrored_start(&self, template_len: i32, template_start: i32, read_len: usize) -> i32 {
        template_len - template_start - (read_len as i32 + self.correction.span_offset(read_len))
    }

    /// Align `read[..read_len]` near forward position `template_start`.
    ///
    /// With `reverse_complement` the read is aligned against the reverse
    /// complement of the template; the result is still reported in forward
    /// coordinates. Returns the sentinel at `template_start` when nothing
    /// fits `max_score`.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_edit_distance(
        &mut self,
        read: &[u8],
        read_len: usize,
        template_start: i32,
        reverse_complement: bool,
        max_score: i32,
        max_shift: i32,
        side_hint: bool,
    ) -> AlignmentRecord {
        if !reverse_complement {
            let template = self.forward_template();
            let query = AlignQuery::new(read, read_len, &template, template_start, max_score, max_shift)
                .with_side_hint(side_hint);
            return self
                .forward
                .align(&query)
                .unwrap_or_else(|| AlignmentRecord::sentinel(template_start));
        }

        let len = self.prepare_reverse();
        let rc_start = self.mirrored_start(len, template_start, read_len);
        let query = AlignQuery::new(read, read_len, &self.rc_template, rc_start, max_score, max_shift)
            .with_side_hint(!side_hint);
        let record = match self.reverse.as_mut() {
            Some(reverse) => reverse.align(&query),
            None => None,
        };
        match record {
            Some(rec) => Self::mirror(rec, len, template_start),
            None => AlignmentRecord::sentinel(template_start),
        }
    }

    /// Align with the forward template start pinned at `template_start`.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_edit_distance_fixed_start(
        &mut self,
        read: &[u8],
        read_len: usize,
        template_start: i32,
        reverse_complement: bool,
        max_score: i32,
        max_shift: i32,
    ) -> Result<AlignmentRecord, AlignError> {
        self.fixed(read, read_len, template_start, None, reverse_complement, max_score, max_shift)
    }

    /// Align with the forward exclusive template end pinned at `template_end`.
    /// `template_start` is only the anchor used for the band.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_edit_distance_fixed_end(
        &mut self,
        read: &[u8],
        read_len: usize,
        template_start: i32,
        template_end: i32,
        reverse_complement: bool,
        max_score: i32,
        max_shift: i32,
    ) -> Result<AlignmentRecord, AlignError> {
        let template = self.forward_template();
        if !reverse_complement {
            let query = AlignQuery::new(read, read_len, &template, template_start, max_score, max_shift);
            return Ok(self
                .forward
                .align_fixed_end(&query, template_end)?
                .unwrap_or_else(|| AlignmentRecord::sentinel(template_start)));
        }
        // a pinned forward end is a pinned start in the mirrored frame
        let len = self.prepare_reverse();
        let query = AlignQuery::new(read, read_len, &self.rc_template, len - template_end, max_score, max_shift);
        let record = match self.reverse.as_mut() {
            Some(reverse) => reverse.align_fixed_start(&query)?,
            None => None,
        };
        Ok(match record {
            Some(rec) => Self::mirror(rec, len, template_start),
            None => AlignmentRecord::sentinel(template_start),
        })
    }

    /// Align with both forward ends pinned.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_edit_distance_fixed_both(
        &mut self,
        read: &[u8],
        read_len: usize,
        template_start: i32,
        template_end: i32,
        reverse_complement: bool,
        max_score: i32,
        max_shift: i32,
    ) -> Result<AlignmentRecord, AlignError> {
        self.fixed(
            read,
            read_len,
            template_start,
            Some(template_end),
            reverse_complement,
            max_score,
            max_shift,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn fixed(
        &mut self,
        read: &[u8],
        read_len: usize,
        template_start: i32,
        template_end: Option<i32>,
        reverse_complement: bool,
        max_score: i32,
        max_shift: i32,
    ) -> Result<AlignmentRecord, AlignError> {
        if !reverse_complement {
            let template = self.forward_template();
            let query = AlignQuery::new(read, read_len, &template, template_start, max_score, max_shift);
            let record = match template_end {
                Some(end) => self.forward.align_fixed_both(&query, end)?,
                None => self.forward.align_fixed_start(&query)?,
            };
            return Ok(record.unwrap_or_else(|| AlignmentRecord::sentinel(template_start)));
        }

        let len = self.prepare_reverse();
        let record = match template_end {
            Some(end) => {
                let query =
                    AlignQuery::new(read, read_len, &self.rc_template, len - end, max_score, max_shift);
                match self.reverse.as_mut() {
                    Some(reverse) => reverse.align_fixed_both(&query, len - template_start)?,
                    None => None,
                }
            }
            None => {
                let rc_start = self.mirrored_start(len, template_start, read_len);
                let query =
                    AlignQuery::new(read, read_len, &self.rc_template, rc_start, max_score, max_shift);
                match self.reverse.as_mut() {
                    Some(reverse) => reverse.align_fixed_end(&query, len - template_start)?,
                    None => None,
                }
            }
        };
        Ok(match record {
            Some(rec) => Self::mirror(rec, len, template_start),
            None => AlignmentRecord::sentinel(template_start),
        })
    }

    /// Flush per-direction statistics and drop the reverse-complement cache.
    pub fn log_stats(&mut self) {
        log::info!("forward orientation:");
        self.forward.log_stats();
        if let Some(reverse) = self.reverse.as_mut() {
            log::info!("reverse orientation:");
            reverse.log_stats();
        }
        self.rc_template = Vec::new();
        self.rc_valid = false;
    }
}

impl fmt::Debug for BidirectionalAligner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BidirectionalAligner")
            .field("forward", &self.forward.name())
            .field("reverse", &self.reverse.as_ref().map(|r| r.name()))
            .field("correction", &self.correction)
            .field("template_len", &self.template.as_ref().map(|t| t.len()))
            .finish()
    }
}
