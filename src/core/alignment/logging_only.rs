//! Diagnostic pass-through stage.
//!
//! Sits between the cheap rejecters and the expensive aligners and records
//! what reached that point. It never decides anything.

use std::hash::Hasher;

use rustc_hash::FxHasher;

use super::actions::AlignmentRecord;
use super::aligner::{AlignQuery, EditDistance};
use crate::core::compute::encoding::{ResidueAlphabet, code_at};

#[derive(Debug)]
pub struct LoggingOnlyAligner {
    alphabet: ResidueAlphabet,
    limit: u64,
    logged: u64,
    window: String,
}

impl LoggingOnlyAligner {
    /// Log at most `limit` queries.
    pub fn new(alphabet: ResidueAlphabet, limit: u64) -> Self {
        Self {
            alphabet,
            limit,
            logged: 0,
            window: String::new(),
        }
    }

    pub fn logged(&self) -> u64 {
        self.logged
    }

    /// Checksum over the read and the template window it was offered.
    pub fn checksum(query: &AlignQuery<'_>) -> u64 {
        let mut hasher = FxHasher::default();
        hasher.write(query.read_slice());
        hasher.write_i32(query.template_start);
        hasher.write_i32(query.max_score);
        hasher.write_i32(query.max_shift);
        hasher.finish()
    }

    fn decode_window(&mut self, query: &AlignQuery<'_>) {
        let alphabet = self.alphabet;
        let unknown = alphabet.unknown_code();
        let from = query.template_start as i64 - query.max_shift as i64;
        let to = query.ungapped_end() + query.max_shift as i64;
        self.window.clear();
        self.window.extend(
            (from..to).map(|pos| alphabet.code_to_char(code_at(query.template, pos, unknown))),
        );
    }
}

impl EditDistance for LoggingOnlyAligner {
    fn name(&self) -> &'static str {
        "logging-only"
    }

    fn align(&mut self, query: &AlignQuery<'_>) -> Option<AlignmentRecord> {
        if self.logged >= self.limit {
            return None;
        }
        self.logged += 1;
        self.decode_window(query);
        let read: String = query
            .read_slice()
            .iter()
            .map(|&c| self.alphabet.code_to_char(c))
            .collect();
        log::info!(
            "edit-distance query #{} checksum={:016x} start={} max_score={} max_shift={}",
            self.logged,
            Self::checksum(query),
            query.template_start,
            query.max_score,
            query.max_shift
        );
        log::info!("  read:     {}", read);
        log::info!("  template: {}", self.window);
        None
    }

    fn log_stats(&mut self) {
        log::info!("logging-only stage recorded {} of {} queries", self.logged, self.limit);
    }
}
