//! CIGAR rendering and NM/MD computation for alignment records.
//!
//! The evidence-collection consumer needs two views of an action list: the
//! extended form (`=`/`X` kept apart) and the SAM form where matches and
//! mismatches collapse into `M`. NM and MD are computed in one pass from the
//! record and the sequences it was aligned against.

use std::fmt::Write;

use super::actions::{Action, AlignmentRecord};
use crate::core::compute::encoding::{UNKNOWN_NUCLEOTIDE, code_at, nucleotide_to_char};

/// Check if a byte represents a query-consuming CIGAR operation
#[inline(always)]
pub const fn op_consumes_query(op: u8) -> bool {
    matches!(op, b'M' | b'I' | b'S' | b'=' | b'X')
}

/// Check if a byte represents a reference-consuming CIGAR operation
#[inline(always)]
pub const fn op_consumes_ref(op: u8) -> bool {
    matches!(op, b'M' | b'D' | b'N' | b'=' | b'X')
}

/// Run-length encode actions in extended form (`=`, `X`, `I`, `D`, `S`).
pub fn extended_cigar(actions: &[Action]) -> String {
    let mut ops: Vec<(u8, i32)> = actions
        .iter()
        .map(|a| (a.cigar_char() as u8, 1))
        .collect();
    normalize_in_place(&mut ops);
    to_string(&ops)
}

/// SAM-style operations: matches and mismatches collapse into `M`.
pub fn sam_cigar_ops(actions: &[Action]) -> Vec<(u8, i32)> {
    let mut ops: Vec<(u8, i32)> = actions
        .iter()
        .map(|a| match a {
            Action::Same | Action::Mismatch => (b'M', 1),
            other => (other.cigar_char() as u8, 1),
        })
        .collect();
    normalize_in_place(&mut ops);
    ops
}

/// Normalize CIGAR in-place by merging adjacent identical operations.
///
/// E.g., `[(M, 10), (M, 5)]` → `[(M, 15)]`
#[inline]
pub fn normalize_in_place(cigar: &mut Vec<(u8, i32)>) {
    if cigar.len() <= 1 {
        return;
    }

    let mut write = 0;
    for read in 1..cigar.len() {
        if cigar[read].0 == cigar[write].0 {
            cigar[write].1 += cigar[read].1;
        } else {
            write += 1;
            cigar[write] = cigar[read];
        }
    }
    cigar.truncate(write + 1);
}

/// Sum of reference-consuming operation lengths.
#[inline]
pub fn reference_length(cigar: &[(u8, i32)]) -> i32 {
    cigar
        .iter()
        .filter(|&&(op, _)| op_consumes_ref(op))
        .map(|&(_, len)| len)
        .sum()
}

/// Sum of query-consuming operation lengths.
#[inline]
pub fn query_length(cigar: &[(u8, i32)]) -> i32 {
    cigar
        .iter()
        .filter(|&&(op, _)| op_consumes_query(op))
        .map(|&(_, len)| len)
        .sum()
}

/// Convert CIGAR to string representation (e.g., "50M2I48M").
#[inline]
pub fn to_string(cigar: &[(u8, i32)]) -> String {
    let mut result = String::with_capacity(cigar.len() * 4);
    write_to_string(cigar, &mut result);
    result
}

/// Write CIGAR to an existing string buffer.
#[inline]
pub fn write_to_string(cigar: &[(u8, i32)], buf: &mut String) {
    if cigar.is_empty() {
        buf.push('*');
        return;
    }

    for &(op, len) in cigar {
        let _ = write!(buf, "{}{}", len, op as char);
    }
}

/// Compute NM (edit distance) and the MD tag of a nucleotide record.
///
/// `template` is the full encoded template the record was produced against;
/// soft-clipped read bases are skipped. Mismatch letters come from the
/// template, so the read itself is not needed.
///
/// # MD Tag Format
/// - Numbers: count of matching bases
/// - Letters: mismatching reference base
/// - ^LETTERS: deleted reference bases
/// - Consecutive mismatches are separated by 0: "A0T" not "AT"
pub fn compute_nm_and_md(record: &AlignmentRecord, template: &[u8]) -> (i32, String) {
    let mut nm: i32 = 0;
    let mut md = String::with_capacity(record.actions().len() / 4 + 8);
    let mut match_count: u32 = 0;
    let mut ti = record.template_start() as i64;
    let mut in_deletion = false;

    for &action in record.actions() {
        match action {
            Action::Same => {
                match_count += 1;
                in_deletion = false;
                ti += 1;
            }
            Action::Mismatch => {
                nm += 1;
                push_number(&mut md, match_count);
                match_count = 0;
                in_deletion = false;
                md.push(nucleotide_to_char(code_at(template, ti, UNKNOWN_NUCLEOTIDE)));
                ti += 1;
            }
            Action::DeletionFromReference => {
                nm += 1;
                if !in_deletion {
                    push_number(&mut md, match_count);
                    match_count = 0;
                    md.push('^');
                    in_deletion = true;
                }
                md.push(nucleotide_to_char(code_at(template, ti, UNKNOWN_NUCLEOTIDE)));
                ti += 1;
            }
            Action::InsertionIntoReference => {
                // Insertions count for NM but leave no MD entry
                nm += 1;
            }
            Action::SoftClip => {}
        }
    }

    if match_count > 0 || md.is_empty() || md.ends_with(|c: char| c.is_ascii_alphabetic()) {
        push_number(&mut md, match_count);
    }

    (nm, md)
}

/// Compute NM only, without building the MD string.
#[inline]
pub fn compute_nm_only(record: &AlignmentRecord) -> i32 {
    record
        .actions()
        .iter()
        .filter(|a| matches!(a, Action::Mismatch) || a.is_indel())
        .count() as i32
}

/// Helper to push a number to the MD string
#[inline(always)]
fn push_number(md: &mut String, n: u32) {
    if n < 10 {
        md.push((b'0' + n as u8) as char);
    } else {
        let _ = write!(md, "{}", n);
    }
}
