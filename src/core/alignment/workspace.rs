//! Per-instance scratch buffers for the edit-distance aligners.
//!
//! Every aligner owns its workspace outright. Buffers grow on demand to the
//! largest read seen and are reused for the life of the instance, so an
//! aligner must never be shared between threads; workers build their own.

use super::actions::Action;

/// Sentinel for unreachable DP cells. Half of `i32::MAX` so that adding any
/// single penalty cannot overflow.
pub const UNREACHABLE: i32 = i32::MAX / 2;

/// Traceback flags for one banded DP cell.
pub const TB_MATCH: u8 = 0;
pub const TB_INS: u8 = 1;
pub const TB_DEL: u8 = 2;
pub const TB_SOURCE_MASK: u8 = 0b11;
/// The insertion state at this cell extended an insertion run.
pub const TB_INS_EXTEND: u8 = 0b100;
/// The deletion state at this cell extended a deletion run.
pub const TB_DEL_EXTEND: u8 = 0b1000;

/// H (best) and I (insertion-ending) values for one band column.
#[derive(Clone, Copy, Debug)]
pub struct HiCell {
    pub h: i32,
    pub i: i32,
}

impl Default for HiCell {
    fn default() -> Self {
        Self {
            h: UNREACHABLE,
            i: UNREACHABLE,
        }
    }
}

/// Rows and traceback for the banded affine DP.
#[derive(Debug, Default)]
pub struct DpWorkspace {
    /// Previous row, indexed by band column.
    pub prev: Vec<HiCell>,
    /// Current row, indexed by band column.
    pub curr: Vec<HiCell>,
    /// `(rows) x width` traceback flags, row-major.
    pub traceback: Vec<u8>,
    /// Actions built by traceback, in reverse read order.
    pub actions: Vec<Action>,
    width: usize,
}

impl DpWorkspace {
    /// Size the buffers for `rows` DP rows over a band of `width` columns.
    pub fn prepare(&mut self, rows: usize, width: usize) {
        self.width = width;
        self.prev.clear();
        self.prev.resize(width, HiCell::default());
        self.curr.clear();
        self.curr.resize(width, HiCell::default());
        let cells = rows * width;
        if self.traceback.len() < cells {
            self.traceback.resize(cells, 0);
        }
        self.actions.clear();
    }

    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    pub fn tb(&self, row: usize, col: usize) -> u8 {
        self.traceback[row * self.width + col]
    }

    #[inline(always)]
    pub fn set_tb(&mut self, row: usize, col: usize, flags: u8) {
        self.traceback[row * self.width + col] = flags;
    }

    #[inline(always)]
    pub fn swap_rows(&mut self) {
        std::mem::swap(&mut self.prev, &mut self.curr);
    }

    /// Bytes currently held, for diagnostics.
    pub fn capacity_bytes(&self) -> usize {
        (self.prev.capacity() + self.curr.capacity()) * std::mem::size_of::<HiCell>()
            + self.traceback.capacity()
            + self.actions.capacity()
    }
}

/// Occurrence table for k-mers seen in the current template window.
///
/// Each slot stores the generation it was written in and the last template
/// position the k-mer started at. Bumping the generation clears the table in
/// O(1); the slots are only zeroed when the generation counter wraps.
#[derive(Debug, Default)]
pub struct KmerOccurrences {
    slots: Vec<(u32, i64)>,
    generation: u32,
}

impl KmerOccurrences {
    /// Start a fresh window for words of length `k`.
    pub fn begin(&mut self, k: usize) {
        let size = 1usize << (2 * k);
        if self.slots.len() != size {
            self.slots.clear();
            self.slots.resize(size, (0, 0));
            self.generation = 0;
        }
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.slots.fill((0, 0));
            self.generation = 1;
        }
    }

    #[inline(always)]
    pub fn insert(&mut self, kmer: u64, pos: i64) {
        self.slots[kmer as usize] = (self.generation, pos);
    }

    /// Last recorded start position of `kmer` in the current window.
    #[inline(always)]
    pub fn last_seen(&self, kmer: u64) -> Option<i64> {
        let (generation, pos) = self.slots[kmer as usize];
        (generation == self.generation).then_some(pos)
    }

    pub fn capacity_bytes(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<(u32, i64)>()
    }
}
