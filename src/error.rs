//! Error types for the edit-distance engine.
//!
//! Running out of score budget is never an error: it is reported as data
//! (`None` from an aligner, or a record carrying [`MAX_SCORE`]). The types here
//! cover configuration that is rejected before any per-read work, fixed-anchor
//! variants a component does not implement, and malformed packed records.
//!
//! [`MAX_SCORE`]: crate::core::alignment::actions::MAX_SCORE

use thiserror::Error;

/// Run configuration rejected at chain-construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("substitution penalty must be positive, got {0}")]
    NonPositiveSubstitution(i32),

    #[error("{name} penalty must not be negative, got {value}")]
    NegativePenalty { name: &'static str, value: i32 },

    #[error("lower-bound word size must be in 2..=10, got {0}")]
    LowerBoundWordSize(usize),

    #[error("seed-extend word size must be in 2..=31, got {0}")]
    SeedExtendWordSize(usize),

    #[error("read length statistics are inconsistent: min {min} > max {max}")]
    ReadLengthRange { min: usize, max: usize },

    #[error("{platform} alignment requires fixed read length {expected}, got {min}..={max}")]
    FixedReadLength {
        platform: &'static str,
        expected: usize,
        min: usize,
        max: usize,
    },

    #[error("{platform} platform cannot be combined with protein data")]
    ProteinPlatform { platform: &'static str },

    #[error("statistics sample interval must be positive")]
    ZeroSampleInterval,
}

/// Failure of an alignment request that indicates a calling-pipeline defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlignError {
    #[error("{aligner} does not support {variant} alignment")]
    Unsupported {
        aligner: &'static str,
        variant: &'static str,
    },
}

/// Decoding failure for the packed integer record layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("packed record truncated: need {needed} words, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("packed record has negative action count {0}")]
    NegativeActionCount(i32),

    #[error("unknown action code {code} at action {index}")]
    UnknownActionCode { code: u8, index: usize },
}
