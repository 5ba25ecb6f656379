//! Rolling k-mer register.
//!
//! A `SeedShifter` packs the last `k` residues at 2 bits each. Validity is
//! tracked in a separate shift mask with one bit per position in the window:
//! a bit is set while an unknown residue (or an unfilled slot) sits at that
//! position, so the seed is valid exactly when the mask is zero.

use crate::core::compute::encoding::{UNKNOWN_NUCLEOTIDE, code_at};

/// Largest word length a 64-bit register can hold.
pub const MAX_WORD_SIZE: usize = 32;

#[derive(Debug, Clone)]
pub struct SeedShifter {
    k: usize,
    value_mask: u64,
    dirty_mask: u64,
    value: u64,
    dirty: u64,
}

impl SeedShifter {
    /// Create a register of word length `k` (2 ≤ k ≤ 32), initially invalid.
    pub fn new(k: usize) -> Self {
        assert!(
            (2..=MAX_WORD_SIZE).contains(&k),
            "seed word size must be in 2..={MAX_WORD_SIZE}, got {k}"
        );
        let value_mask = if k == MAX_WORD_SIZE {
            u64::MAX
        } else {
            (1u64 << (2 * k)) - 1
        };
        let dirty_mask = (1u64 << k) - 1;
        Self {
            k,
            value_mask,
            dirty_mask,
            value: 0,
            dirty: dirty_mask,
        }
    }

    #[inline]
    pub fn word_size(&self) -> usize {
        self.k
    }

    /// Forget everything: the register is invalid until `k` known residues arrive.
    #[inline]
    pub fn reset(&mut self) {
        self.value = 0;
        self.dirty = self.dirty_mask;
    }

    /// Shift in one nucleotide code. Codes of 4 and above are unknown.
    #[inline(always)]
    pub fn step(&mut self, code: u8) {
        let unknown = code >= UNKNOWN_NUCLEOTIDE;
        let bits = if unknown { 0 } else { code as u64 & 3 };
        self.value = ((self.value << 2) | bits) & self.value_mask;
        self.dirty = ((self.dirty << 1) | unknown as u64) & self.dirty_mask;
    }

    /// Shift in the residue at `pos`; positions outside `seq` are unknown.
    #[inline(always)]
    pub fn step_at(&mut self, seq: &[u8], pos: i64) {
        self.step(code_at(seq, pos, UNKNOWN_NUCLEOTIDE));
    }

    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.dirty == 0
    }

    /// Packed value of the last `k` residues (meaningful only when valid).
    #[inline(always)]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// The current seed if valid.
    #[inline(always)]
    pub fn seed(&self) -> Option<u64> {
        self.is_valid().then_some(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_until_filled() {
        let mut s = SeedShifter::new(3);
        s.step(0);
        assert!(!s.is_valid());
        s.step(1);
        assert!(!s.is_valid());
        s.step(2);
        assert_eq!(s.seed(), Some(0b00_01_10));
    }

    #[test]
    fn test_unknown_dirties_next_k_steps() {
        // A A N A A A with k = 3
        let mut s = SeedShifter::new(3);
        let mut validity = Vec::new();
        for code in [0, 0, 4, 0, 0, 0] {
            s.step(code);
            validity.push(s.is_valid());
        }
        assert_eq!(validity, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn test_value_rolls() {
        let mut s = SeedShifter::new(2);
        for code in [3, 2, 1] {
            s.step(code);
        }
        // last two residues: G C
        assert_eq!(s.seed(), Some(0b10_01));
    }

    #[test]
    fn test_step_at_out_of_range_is_unknown() {
        let seq = [0u8, 1, 2, 3];
        let mut s = SeedShifter::new(2);
        s.step_at(&seq, 2);
        s.step_at(&seq, 3);
        assert!(s.is_valid());
        s.step_at(&seq, 4);
        assert!(!s.is_valid());
        s.reset();
        s.step_at(&seq, -1);
        s.step_at(&seq, 0);
        assert!(!s.is_valid());
    }

    #[test]
    fn test_full_width_register() {
        let mut s = SeedShifter::new(MAX_WORD_SIZE);
        for _ in 0..MAX_WORD_SIZE {
            s.step(3);
        }
        assert_eq!(s.seed(), Some(u64::MAX));
    }

    #[test]
    #[should_panic(expected = "seed word size")]
    fn test_rejects_word_size_one() {
        let _ = SeedShifter::new(1);
    }
}
