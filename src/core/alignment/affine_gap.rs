//! Banded affine-gap (Gotoh) aligner.
//!
//! The final stage of every chain. Rows are read positions, columns are band
//! diagonals `d = template_pos - read_pos - template_start`. The read is
//! aligned end to end; the template start and end are free inside the band
//! unless pinned by one of the fixed-anchor variants.
//!
//! Per cell three states are tracked, minimising cost:
//!
//! ```text
//! I(i,d) = min(H(i-1,d+1) + open + ext, I(i-1,d+1) + ext)   read base, no template
//! D(i,d) = min(H(i,d-1)   + open + ext, D(i,d-1)   + ext)   template base, no read
//! H(i,d) = min(H(i-1,d) + cost(read[i-1], template[start+i-1+d]), I(i,d), D(i,d))
//! ```
//!
//! Only two rows of H/I are kept; traceback flags cover the whole band.

use super::actions::{Action, AlignmentRecord};
use super::aligner::{AlignQuery, EditDistance};
use super::penalties::Penalties;
use super::workspace::{
    DpWorkspace, HiCell, TB_DEL, TB_DEL_EXTEND, TB_INS, TB_INS_EXTEND, TB_MATCH, TB_SOURCE_MASK,
    UNREACHABLE,
};
use crate::core::compute::encoding::code_at;
use crate::error::AlignError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum TraceState {
    H,
    Ins,
    Del,
}

#[inline(always)]
fn add(value: i32, penalty: i32) -> i32 {
    if value >= UNREACHABLE {
        UNREACHABLE
    } else {
        (value + penalty).min(UNREACHABLE)
    }
}

#[derive(Debug)]
pub struct AffineGapAligner {
    penalties: Penalties,
    /// Known diagonal the band is widened to include.
    seeded_offset: i32,
    name: &'static str,
    ws: DpWorkspace,
}

impl AffineGapAligner {
    pub fn new(penalties: Penalties) -> Self {
        Self {
            penalties,
            seeded_offset: 0,
            name: "affine-gap",
            ws: DpWorkspace::default(),
        }
    }

    /// Aligner for reads whose indel region sits at a known diagonal, such
    /// as Complete Genomics first-generation reads.
    pub fn seeded(penalties: Penalties, offset: i32) -> Self {
        Self {
            penalties,
            seeded_offset: offset,
            name: "cg-affine-gap",
            ws: DpWorkspace::default(),
        }
    }

    pub fn penalties(&self) -> &Penalties {
        &self.penalties
    }

    /// Lowest diagonal and width of the band for this query.
    fn band(&self, query: &AlignQuery<'_>, end_diagonal: Option<i32>) -> (i32, usize) {
        let reach = query.read_len as i64 + query.template.len() as i64;
        let shift = (query.max_shift as i64).min(reach);
        let anchors = [
            0i64,
            self.seeded_offset as i64,
            end_diagonal.unwrap_or(0) as i64,
        ];
        let lo = anchors.iter().copied().min().unwrap_or(0) - shift;
        let hi = anchors.iter().copied().max().unwrap_or(0) + shift;
        (lo as i32, (hi - lo + 1) as usize)
    }

    /// Fill the band and trace back the optimal alignment.
    fn solve(
        &mut self,
        query: &AlignQuery<'_>,
        pin_start: bool,
        end_diagonal: Option<i32>,
    ) -> AlignmentRecord {
        let (lo, width) = self.band(query, end_diagonal);
        let Self { penalties, ws, .. } = self;
        let read = query.read_slice();
        let n = read.len();
        let open = penalties.gap_cost(1);
        let ext = penalties.gap_extend;
        let unknown = penalties.unknown_code();
        let origin = query.template_start as i64 + lo as i64;
        let start_col = (-lo) as usize;

        ws.prepare(n + 1, width);

        // Row 0: nothing of the read consumed yet.
        for c in 0..width {
            let (h, flags) = if !pin_start || c == start_col {
                (0, TB_MATCH)
            } else if c > start_col {
                let run = (c - start_col) as i32;
                let flags = if run > 1 {
                    TB_DEL | TB_DEL_EXTEND
                } else {
                    TB_DEL
                };
                (penalties.gap_cost(run), flags)
            } else {
                (UNREACHABLE, TB_MATCH)
            };
            ws.curr[c] = HiCell { h, i: UNREACHABLE };
            ws.set_tb(0, c, flags);
        }
        if query.max_score < 0 {
            return AlignmentRecord::sentinel(query.template_start);
        }

        for i in 1..=n {
            ws.swap_rows();
            let r = read[i - 1];
            let mut del_state = UNREACHABLE;
            let mut row_min = UNREACHABLE;
            for c in 0..width {
                let tpos = origin + (i - 1) as i64 + c as i64;
                let diag = add(
                    ws.prev[c].h,
                    penalties.column_cost(r, code_at(query.template, tpos, unknown)),
                );

                let (ins, ins_extended) = if c + 1 < width {
                    let up = ws.prev[c + 1];
                    let opened = add(up.h, open);
                    let extended = add(up.i, ext);
                    if extended < opened {
                        (extended, true)
                    } else {
                        (opened, false)
                    }
                } else {
                    (UNREACHABLE, false)
                };

                let (del, del_extended) = if c > 0 {
                    let opened = add(ws.curr[c - 1].h, open);
                    let extended = add(del_state, ext);
                    if extended < opened {
                        (extended, true)
                    } else {
                        (opened, false)
                    }
                } else {
                    (UNREACHABLE, false)
                };

                let (h, mut flags) = if diag <= ins && diag <= del {
                    (diag, TB_MATCH)
                } else if ins <= del {
                    (ins, TB_INS)
                } else {
                    (del, TB_DEL)
                };
                if ins_extended {
                    flags |= TB_INS_EXTEND;
                }
                if del_extended {
                    flags |= TB_DEL_EXTEND;
                }

                ws.curr[c] = HiCell { h, i: ins };
                ws.set_tb(i, c, flags);
                del_state = del;
                row_min = row_min.min(h);
            }
            if row_min > query.max_score {
                return AlignmentRecord::sentinel(query.template_start);
            }
        }

        let end_col = match end_diagonal {
            Some(d) => (d - lo) as usize,
            None => {
                let side_hint = query.side_hint;
                (0..width)
                    .min_by_key(|&c| {
                        let d = lo + c as i32;
                        let off_side = if side_hint { d < 0 } else { d > 0 };
                        (ws.curr[c].h, d.unsigned_abs(), off_side)
                    })
                    .unwrap_or(start_col)
            }
        };
        let score = ws.curr[end_col].h;
        if score >= UNREACHABLE || score > query.max_score {
            return AlignmentRecord::sentinel(query.template_start);
        }

        // Traceback from (n, end_col) to row 0.
        let mut i = n;
        let mut c = end_col;
        let mut state = TraceState::H;
        loop {
            match state {
                TraceState::H => {
                    if i == 0 && (!pin_start || c == start_col) {
                        break;
                    }
                    match ws.tb(i, c) & TB_SOURCE_MASK {
                        TB_INS => state = TraceState::Ins,
                        TB_DEL => state = TraceState::Del,
                        _ => {
                            let tpos = origin + (i - 1) as i64 + c as i64;
                            let t = code_at(query.template, tpos, unknown);
                            ws.actions.push(penalties.column_action(read[i - 1], t));
                            i -= 1;
                        }
                    }
                }
                TraceState::Ins => {
                    ws.actions.push(Action::InsertionIntoReference);
                    let extended = ws.tb(i, c) & TB_INS_EXTEND != 0;
                    i -= 1;
                    c += 1;
                    if !extended {
                        state = TraceState::H;
                    }
                }
                TraceState::Del => {
                    ws.actions.push(Action::DeletionFromReference);
                    let extended = ws.tb(i, c) & TB_DEL_EXTEND != 0;
                    c -= 1;
                    if !extended {
                        state = TraceState::H;
                    }
                }
            }
        }

        let actions: Vec<Action> = ws.actions.iter().rev().copied().collect();
        let start = (origin + c as i64) as i32;
        AlignmentRecord::new(score, start, actions)
    }

    fn end_diagonal(query: &AlignQuery<'_>, template_end: i32) -> i32 {
        (template_end as i64 - query.template_start as i64 - query.read_len as i64) as i32
    }
}

impl EditDistance for AffineGapAligner {
    fn name(&self) -> &'static str {
        self.name
    }

    fn align(&mut self, query: &AlignQuery<'_>) -> Option<AlignmentRecord> {
        Some(self.solve(query, false, None))
    }

    fn align_fixed_start(
        &mut self,
        query: &AlignQuery<'_>,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        Ok(Some(self.solve(query, true, None)))
    }

    fn align_fixed_end(
        &mut self,
        query: &AlignQuery<'_>,
        template_end: i32,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        let end = Self::end_diagonal(query, template_end);
        Ok(Some(self.solve(query, false, Some(end))))
    }

    fn align_fixed_both(
        &mut self,
        query: &AlignQuery<'_>,
        template_end: i32,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        let end = Self::end_diagonal(query, template_end);
        Ok(Some(self.solve(query, true, Some(end))))
    }

    fn log_stats(&mut self) {
        log::debug!(
            "{}: workspace holds {} bytes",
            self.name,
            self.ws.capacity_bytes()
        );
    }
}
