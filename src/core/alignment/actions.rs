//! Alignment actions and the alignment record shared by every aligner.
//!
//! Internally a record is a structured value. At the boundary with the
//! evidence-collection consumer it is serialised to the packed integer layout:
//!
//! ```text
//! word 0        alignment score (MAX_SCORE = no alignment within budget)
//! word 1        zero-based template start
//! word 2        number of actions
//! word 3..      actions, eight per word, 4 bits each; action j lives at
//!               bits 4*(j % 8) of word 3 + j / 8
//! ```

use std::fmt;

use crate::error::RecordError;

/// Score sentinel meaning "no alignment within the budget" (or rejected).
pub const MAX_SCORE: i32 = i32::MAX;

pub const SCORE_INDEX: usize = 0;
pub const TEMPLATE_START_INDEX: usize = 1;
pub const ACTIONS_LENGTH_INDEX: usize = 2;
pub const ACTIONS_START_INDEX: usize = 3;

pub const BITS_PER_ACTION: usize = 4;
pub const ACTIONS_PER_WORD: usize = 32 / BITS_PER_ACTION;
const ACTION_MASK: u32 = (1 << BITS_PER_ACTION) - 1;

/// Elementary alignment action, one per alignment column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    /// Read base equals template base.
    Same = 0,
    /// Read base differs from template base (or either is unknown).
    Mismatch = 1,
    /// Base present in the reference, absent from the read.
    DeletionFromReference = 2,
    /// Base present in the read, absent from the reference.
    InsertionIntoReference = 3,
    /// Read base excluded from the alignment after post-processing.
    SoftClip = 5,
}

impl Action {
    #[inline(always)]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Same),
            1 => Some(Self::Mismatch),
            2 => Some(Self::DeletionFromReference),
            3 => Some(Self::InsertionIntoReference),
            5 => Some(Self::SoftClip),
            _ => None,
        }
    }

    /// Returns true if this action consumes a read base.
    #[inline(always)]
    pub const fn consumes_read(self) -> bool {
        matches!(
            self,
            Self::Same | Self::Mismatch | Self::InsertionIntoReference | Self::SoftClip
        )
    }

    /// Returns true if this action consumes a template base.
    #[inline(always)]
    pub const fn consumes_template(self) -> bool {
        matches!(
            self,
            Self::Same | Self::Mismatch | Self::DeletionFromReference
        )
    }

    #[inline(always)]
    pub const fn is_indel(self) -> bool {
        matches!(
            self,
            Self::DeletionFromReference | Self::InsertionIntoReference
        )
    }

    /// Extended CIGAR character for this action.
    #[inline(always)]
    pub const fn cigar_char(self) -> char {
        match self {
            Self::Same => '=',
            Self::Mismatch => 'X',
            Self::DeletionFromReference => 'D',
            Self::InsertionIntoReference => 'I',
            Self::SoftClip => 'S',
        }
    }
}

/// Result of aligning one read at one candidate position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    score: i32,
    template_start: i32,
    actions: Vec<Action>,
}

impl AlignmentRecord {
    pub fn new(score: i32, template_start: i32, actions: Vec<Action>) -> Self {
        Self {
            score,
            template_start,
            actions,
        }
    }

    /// A record that carries only the sentinel score: no alignment within budget.
    pub fn sentinel(template_start: i32) -> Self {
        Self {
            score: MAX_SCORE,
            template_start,
            actions: Vec::new(),
        }
    }

    #[inline]
    pub fn score(&self) -> i32 {
        self.score
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.score == MAX_SCORE
    }

    #[inline]
    pub fn template_start(&self) -> i32 {
        self.template_start
    }

    #[inline]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn set_score(&mut self, score: i32) {
        self.score = score;
    }

    pub fn set_template_start(&mut self, start: i32) {
        self.template_start = start;
    }

    pub(crate) fn actions_mut(&mut self) -> &mut Vec<Action> {
        &mut self.actions
    }

    /// Number of template bases consumed by the actions.
    pub fn reference_span(&self) -> i32 {
        self.actions
            .iter()
            .filter(|a| a.consumes_template())
            .count() as i32
    }

    /// Number of read bases consumed by the actions (soft clips included).
    pub fn read_span(&self) -> i32 {
        self.actions.iter().filter(|a| a.consumes_read()).count() as i32
    }

    /// Exclusive template end position.
    pub fn template_end(&self) -> i32 {
        self.template_start + self.reference_span()
    }

    /// Net indel length: positive when the alignment consumes more template than read.
    pub fn indel_length(&self) -> i32 {
        let aligned_read = self
            .actions
            .iter()
            .filter(|a| a.consumes_read() && **a != Action::SoftClip)
            .count() as i32;
        self.reference_span() - aligned_read
    }

    pub fn count(&self, action: Action) -> usize {
        self.actions.iter().filter(|&&a| a == action).count()
    }

    /// Serialise to the packed integer layout.
    pub fn to_packed(&self) -> Vec<i32> {
        let mut out = Vec::new();
        self.write_packed(&mut out);
        out
    }

    /// Serialise into an existing buffer, reusing its capacity.
    pub fn write_packed(&self, out: &mut Vec<i32>) {
        out.clear();
        out.push(self.score);
        out.push(self.template_start);
        out.push(self.actions.len() as i32);
        for chunk in self.actions.chunks(ACTIONS_PER_WORD) {
            let mut word = 0u32;
            for (slot, action) in chunk.iter().enumerate() {
                word |= (action.code() as u32) << (slot * BITS_PER_ACTION);
            }
            out.push(word as i32);
        }
    }

    /// Decode from the packed integer layout.
    pub fn from_packed(packed: &[i32]) -> Result<Self, RecordError> {
        if packed.len() < ACTIONS_START_INDEX {
            return Err(RecordError::Truncated {
                needed: ACTIONS_START_INDEX,
                got: packed.len(),
            });
        }
        let count = packed[ACTIONS_LENGTH_INDEX];
        if count < 0 {
            return Err(RecordError::NegativeActionCount(count));
        }
        let count = count as usize;
        let needed = ACTIONS_START_INDEX + count.div_ceil(ACTIONS_PER_WORD);
        if packed.len() < needed {
            return Err(RecordError::Truncated {
                needed,
                got: packed.len(),
            });
        }

        let mut actions = Vec::with_capacity(count);
        for index in 0..count {
            let word = packed[ACTIONS_START_INDEX + index / ACTIONS_PER_WORD] as u32;
            let code = ((word >> ((index % ACTIONS_PER_WORD) * BITS_PER_ACTION)) & ACTION_MASK) as u8;
            let action =
                Action::from_code(code).ok_or(RecordError::UnknownActionCode { code, index })?;
            actions.push(action);
        }

        Ok(Self {
            score: packed[SCORE_INDEX],
            template_start: packed[TEMPLATE_START_INDEX],
            actions,
        })
    }
}

impl fmt::Display for AlignmentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            return write!(f, "score=MAX start={}", self.template_start);
        }
        write!(
            f,
            "score={} start={} actions={}",
            self.score,
            self.template_start,
            super::cigar::extended_cigar(&self.actions)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Action::*;

    #[test]
    fn test_spans() {
        let rec = AlignmentRecord::new(
            20,
            10,
            vec![SoftClip, Same, Mismatch, InsertionIntoReference, Same, DeletionFromReference, Same],
        );
        assert_eq!(rec.reference_span(), 5);
        assert_eq!(rec.read_span(), 6);
        assert_eq!(rec.template_end(), 15);
        // 4 aligned read bases vs 5 template bases
        assert_eq!(rec.indel_length(), 1);
        assert_eq!(rec.count(Same), 3);
    }

    #[test]
    fn test_packed_layout() {
        let actions = vec![Same, Mismatch, DeletionFromReference, InsertionIntoReference, SoftClip];
        let rec = AlignmentRecord::new(7, 3, actions);
        let packed = rec.to_packed();
        assert_eq!(packed.len(), 4);
        assert_eq!(packed[SCORE_INDEX], 7);
        assert_eq!(packed[TEMPLATE_START_INDEX], 3);
        assert_eq!(packed[ACTIONS_LENGTH_INDEX], 5);
        // 0 | 1<<4 | 2<<8 | 3<<12 | 5<<16
        assert_eq!(packed[ACTIONS_START_INDEX], 0x5_3210);
    }

    #[test]
    fn test_packed_spills_into_second_word() {
        let rec = AlignmentRecord::new(0, 0, vec![Mismatch; 9]);
        let packed = rec.to_packed();
        assert_eq!(packed.len(), ACTIONS_START_INDEX + 2);
        assert_eq!(packed[ACTIONS_START_INDEX + 1], 1);
        assert_eq!(AlignmentRecord::from_packed(&packed).unwrap(), rec);
    }

    #[test]
    fn test_sentinel_packs_without_actions() {
        let packed = AlignmentRecord::sentinel(-4).to_packed();
        assert_eq!(packed, vec![MAX_SCORE, -4, 0]);
    }

    #[test]
    fn test_from_packed_errors() {
        assert_eq!(
            AlignmentRecord::from_packed(&[0, 0]),
            Err(RecordError::Truncated { needed: 3, got: 2 })
        );
        assert_eq!(
            AlignmentRecord::from_packed(&[0, 0, 9]),
            Err(RecordError::Truncated { needed: 5, got: 3 })
        );
        assert_eq!(
            AlignmentRecord::from_packed(&[0, 0, -1]),
            Err(RecordError::NegativeActionCount(-1))
        );
        assert_eq!(
            AlignmentRecord::from_packed(&[0, 0, 2, 0x40]),
            Err(RecordError::UnknownActionCode { code: 4, index: 1 })
        );
    }

    #[test]
    fn test_write_packed_reuses_buffer() {
        let rec = AlignmentRecord::new(1, 2, vec![Same; 4]);
        let mut buf = Vec::with_capacity(16);
        let ptr = buf.as_ptr();
        rec.write_packed(&mut buf);
        rec.write_packed(&mut buf);
        assert_eq!(buf.len(), 4);
        assert_eq!(ptr, buf.as_ptr());
    }
}
