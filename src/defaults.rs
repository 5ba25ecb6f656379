// src/defaults.rs

// Scoring Constants
pub const SUBSTITUTION_PENALTY: i32 = 9;
pub const UNKNOWN_PENALTY: i32 = 5;
pub const GAP_OPEN_PENALTY: i32 = 19;
pub const GAP_EXTEND_PENALTY: i32 = 1;

// Protein Scoring Constants
pub const PROTEIN_UNKNOWN_PENALTY: i32 = 3;
pub const PROTEIN_GAP_OPEN_PENALTY: i32 = 11;
pub const PROTEIN_GAP_EXTEND_PENALTY: i32 = 1;

// Chain Composition
pub const LOWER_BOUND_WORD_SIZE: usize = 6;
pub const SEED_EXTEND_MIN_READ_LEN: usize = 256;
pub const SEED_EXTEND_WORD_SIZE: usize = 12;
pub const LOGGING_ONLY_LIMIT: u64 = 0;
pub const STATS_SAMPLE_INTERVAL: u64 = 64;

// Soft Clipping
pub const SOFT_CLIP_INDEL_ZONE: usize = 5;
pub const SOFT_CLIP_MISMATCH_ZONE: usize = 3;
pub const SOFT_CLIP_MIN_MATCHES: usize = 0;

// Complete Genomics legacy chemistry
pub const CG_LEGACY_READ_LENGTH: usize = 35;
pub const CG_LEGACY_SPAN_OFFSET: i32 = 4;

// Query Defaults (CLI)
pub const MAX_SCORE: i32 = 60;
pub const MAX_SHIFT: i32 = 7;
pub const VERBOSITY: i32 = 3;
