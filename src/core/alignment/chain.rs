//! Prioritised chain of aligners.
//!
//! Stages run cheapest first. The first stage that returns a record (an
//! alignment or a proven rejection) ends the query; if every stage defers,
//! the chain reports the sentinel at the query's template start. Earlier
//! stages only prove things cheaper ones could not, so the order must not be
//! shuffled without re-validating it.

use std::fmt::Write;
use std::time::{Duration, Instant};

use super::actions::AlignmentRecord;
use super::aligner::{AlignQuery, BoxedEditDistance, EditDistance};
use crate::error::AlignError;

/// Counters for one stage of a chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageStats {
    pub name: &'static str,
    /// Queries offered to the stage.
    pub calls: u64,
    /// Queries the stage deferred.
    pub nulls: u64,
    /// Queries the stage rejected with the sentinel.
    pub sentinels: u64,
    /// Sum of committed (non-sentinel) scores.
    pub total_score: u64,
    /// Calls that were timed.
    pub timed_calls: u64,
    pub timed: Duration,
}

impl StageStats {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    pub fn committed(&self) -> u64 {
        self.calls - self.nulls - self.sentinels
    }

    pub fn mean_score(&self) -> f64 {
        match self.committed() {
            0 => 0.0,
            n => self.total_score as f64 / n as f64,
        }
    }

    /// Mean wall time over the sampled calls.
    pub fn mean_time(&self) -> Duration {
        match self.timed_calls {
            0 => Duration::ZERO,
            n => self.timed / n as u32,
        }
    }

    fn record(&mut self, result: &Option<AlignmentRecord>) {
        match result {
            None => self.nulls += 1,
            Some(rec) if rec.is_sentinel() => self.sentinels += 1,
            Some(rec) => self.total_score += rec.score().max(0) as u64,
        }
    }

    fn merge(&mut self, other: &StageStats) {
        self.calls += other.calls;
        self.nulls += other.nulls;
        self.sentinels += other.sentinels;
        self.total_score += other.total_score;
        self.timed_calls += other.timed_calls;
        self.timed += other.timed;
    }
}

/// Per-stage statistics of a chain plus queries no stage decided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainStats {
    pub stages: Vec<StageStats>,
    pub undecided: u64,
}

impl ChainStats {
    pub fn new(names: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            stages: names.into_iter().map(StageStats::new).collect(),
            undecided: 0,
        }
    }

    pub fn total_calls(&self) -> u64 {
        self.stages.first().map_or(0, |s| s.calls)
    }

    /// Add another instance's counters, matching stages by position.
    ///
    /// Worker clones share one composition; stages missing here are appended.
    pub fn merge(&mut self, other: &ChainStats) {
        for (i, theirs) in other.stages.iter().enumerate() {
            match self.stages.get_mut(i) {
                Some(ours) => {
                    debug_assert_eq!(ours.name, theirs.name, "merging different chains");
                    ours.merge(theirs);
                }
                None => self.stages.push(theirs.clone()),
            }
        }
        self.undecided += other.undecided;
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            *stage = StageStats::new(stage.name);
        }
        self.undecided = 0;
    }

    /// Fixed-width text table, one line per stage.
    pub fn report(&self, label: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{label} chain statistics ({} queries, {} undecided)",
            self.total_calls(),
            self.undecided
        );
        let _ = writeln!(
            out,
            "  {:<16} {:>12} {:>12} {:>12} {:>12} {:>10} {:>12}",
            "stage", "calls", "undecided", "rejected", "committed", "mean", "time/call"
        );
        for s in &self.stages {
            let _ = writeln!(
                out,
                "  {:<16} {:>12} {:>12} {:>12} {:>12} {:>10.2} {:>12.2?}",
                s.name,
                s.calls,
                s.nulls,
                s.sentinels,
                s.committed(),
                s.mean_score(),
                s.mean_time()
            );
        }
        out
    }

    pub fn log_report(&self, label: &str) {
        for line in self.report(label).lines() {
            log::info!("{}", line);
        }
    }
}

/// Ordered list of stages tried until one decides.
pub struct PrioritisedChain {
    stages: Vec<BoxedEditDistance>,
    stats: ChainStats,
    sample_interval: u64,
}

impl PrioritisedChain {
    /// Build a chain; timing is sampled every `sample_interval`-th call per stage.
    pub fn new(stages: Vec<BoxedEditDistance>, sample_interval: u64) -> Self {
        assert!(!stages.is_empty(), "an alignment chain needs at least one stage");
        let stats = ChainStats::new(stages.iter().map(|s| s.name()));
        Self {
            stages,
            stats,
            sample_interval: sample_interval.max(1),
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn stats(&self) -> &ChainStats {
        &self.stats
    }

    /// Run `call` on stages in order until one returns a record.
    fn run<F>(
        &mut self,
        query: &AlignQuery<'_>,
        variant: &'static str,
        mut call: F,
    ) -> Result<AlignmentRecord, AlignError>
    where
        F: FnMut(&mut BoxedEditDistance) -> Result<Option<AlignmentRecord>, AlignError>,
    {
        let mut supported = false;
        for (stage, stats) in self.stages.iter_mut().zip(self.stats.stages.iter_mut()) {
            stats.calls += 1;
            let timed = stats.calls % self.sample_interval == 0;
            let started = timed.then(Instant::now);
            let result = match call(stage) {
                Ok(result) => result,
                Err(AlignError::Unsupported { .. }) => {
                    stats.calls -= 1;
                    continue;
                }
            };
            supported = true;
            if let Some(t) = started {
                stats.timed_calls += 1;
                stats.timed += t.elapsed();
            }
            stats.record(&result);
            if let Some(rec) = result {
                return Ok(rec);
            }
        }
        if !supported {
            return Err(AlignError::Unsupported {
                aligner: "prioritised chain",
                variant,
            });
        }
        self.stats.undecided += 1;
        Ok(AlignmentRecord::sentinel(query.template_start))
    }

    /// Align, always producing a record.
    pub fn align_record(&mut self, query: &AlignQuery<'_>) -> AlignmentRecord {
        match self.run(query, "free", |stage| Ok(stage.align(query))) {
            Ok(rec) => rec,
            Err(_) => AlignmentRecord::sentinel(query.template_start),
        }
    }
}

impl EditDistance for PrioritisedChain {
    fn name(&self) -> &'static str {
        "prioritised chain"
    }

    fn align(&mut self, query: &AlignQuery<'_>) -> Option<AlignmentRecord> {
        Some(self.align_record(query))
    }

    fn align_fixed_start(
        &mut self,
        query: &AlignQuery<'_>,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        self.run(query, "fixed-start", |stage| stage.align_fixed_start(query))
            .map(Some)
    }

    fn align_fixed_end(
        &mut self,
        query: &AlignQuery<'_>,
        template_end: i32,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        self.run(query, "fixed-end", |stage| {
            stage.align_fixed_end(query, template_end)
        })
        .map(Some)
    }

    fn align_fixed_both(
        &mut self,
        query: &AlignQuery<'_>,
        template_end: i32,
    ) -> Result<Option<AlignmentRecord>, AlignError> {
        self.run(query, "fixed-both", |stage| {
            stage.align_fixed_both(query, template_end)
        })
        .map(Some)
    }

    fn chain_stats(&self) -> Option<&ChainStats> {
        Some(&self.stats)
    }

    fn log_stats(&mut self) {
        self.stats.log_report("alignment");
        for stage in &mut self.stages {
            stage.log_stats();
        }
    }
}
