use clap::{Args, ValueEnum};

use crate::core::alignment::lower_bound::{self, Preroll};
use crate::core::alignment::penalties::{Penalties, ProteinMatrix};
use crate::core::alignment::seed;
use crate::core::alignment::soft_clip::SoftClipOpt;
use crate::core::compute::encoding::ResidueAlphabet;
use crate::defaults;
use crate::error::ConfigError;

// src/edit_opt.rs
//
// Run configuration for building edit-distance aligners.

/// Sequencing platform; decides whether the legacy Complete Genomics chain
/// is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Platform {
    #[default]
    Generic,
    #[value(name = "cg-legacy")]
    CompleteGenomicsLegacy,
}

impl Platform {
    pub fn name(self) -> &'static str {
        match self {
            Platform::Generic => "generic",
            Platform::CompleteGenomicsLegacy => "Complete Genomics legacy",
        }
    }
}

/// Read length range observed for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadLengthStats {
    pub min: usize,
    pub max: usize,
}

impl ReadLengthStats {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn fixed(len: usize) -> Self {
        Self { min: len, max: len }
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Widen the range to include `len`. An empty range (0, 0) adopts it.
    pub fn observe(&mut self, len: usize) {
        if self.min == 0 && self.max == 0 {
            self.min = len;
            self.max = len;
        } else {
            self.min = self.min.min(len);
            self.max = self.max.max(len);
        }
    }
}

/// Alignment engine options
#[derive(Debug, Clone)]
pub struct EditOpt {
    pub data_type: ResidueAlphabet,
    pub platform: Platform,
    pub read_length: ReadLengthStats,

    // Scoring
    pub penalties: Penalties,
    pub protein_matrix: ProteinMatrix,

    // Chain composition
    pub lower_bound_word: usize,
    pub lower_bound_preroll: Preroll,
    pub seed_extend_min_read_len: usize,
    pub seed_extend_word: usize,
    pub logging_only_limit: u64,
    pub stats_sample_interval: u64,

    /// Soft clipping of alignment ends; `None` disables it.
    pub soft_clip: Option<SoftClipOpt>,
}

impl Default for EditOpt {
    fn default() -> Self {
        Self {
            data_type: ResidueAlphabet::Nucleotide,
            platform: Platform::Generic,
            read_length: ReadLengthStats::default(),
            penalties: Penalties::default(),
            protein_matrix: ProteinMatrix::blosum62(),
            lower_bound_word: defaults::LOWER_BOUND_WORD_SIZE,
            lower_bound_preroll: Preroll::Band,
            seed_extend_min_read_len: defaults::SEED_EXTEND_MIN_READ_LEN,
            seed_extend_word: defaults::SEED_EXTEND_WORD_SIZE,
            logging_only_limit: defaults::LOGGING_ONLY_LIMIT,
            stats_sample_interval: defaults::STATS_SAMPLE_INTERVAL,
            soft_clip: None,
        }
    }
}

impl EditOpt {
    /// Penalties in effect for the configured data type.
    pub fn effective_penalties(&self) -> Penalties {
        match self.data_type {
            ResidueAlphabet::Nucleotide => self.penalties.clone(),
            ResidueAlphabet::Protein => Penalties::protein(
                self.protein_matrix.clone(),
                self.penalties.unknown,
                self.penalties.gap_open,
                self.penalties.gap_extend,
            ),
        }
    }

    /// Switch to protein data with the protein default penalties.
    pub fn use_protein_defaults(&mut self) {
        self.data_type = ResidueAlphabet::Protein;
        self.penalties.unknown = defaults::PROTEIN_UNKNOWN_PENALTY;
        self.penalties.gap_open = defaults::PROTEIN_GAP_OPEN_PENALTY;
        self.penalties.gap_extend = defaults::PROTEIN_GAP_EXTEND_PENALTY;
    }

    /// Reject inconsistent configuration before any aligner is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.penalties.validate()?;

        if !(lower_bound::MIN_WORD_SIZE..=lower_bound::MAX_WORD_SIZE).contains(&self.lower_bound_word) {
            return Err(ConfigError::LowerBoundWordSize(self.lower_bound_word));
        }
        if !(2..seed::MAX_WORD_SIZE).contains(&self.seed_extend_word) {
            return Err(ConfigError::SeedExtendWordSize(self.seed_extend_word));
        }
        if self.read_length.min > self.read_length.max {
            return Err(ConfigError::ReadLengthRange {
                min: self.read_length.min,
                max: self.read_length.max,
            });
        }
        if self.stats_sample_interval == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }

        if self.platform == Platform::CompleteGenomicsLegacy {
            if self.data_type == ResidueAlphabet::Protein {
                return Err(ConfigError::ProteinPlatform {
                    platform: self.platform.name(),
                });
            }
            let expected = defaults::CG_LEGACY_READ_LENGTH;
            if !self.read_length.is_fixed() || self.read_length.max != expected {
                return Err(ConfigError::FixedReadLength {
                    platform: self.platform.name(),
                    expected,
                    min: self.read_length.min,
                    max: self.read_length.max,
                });
            }
        }
        Ok(())
    }
}

/// Parse a pre-roll policy: "band", "budget" or a non-negative cap.
pub fn parse_preroll(s: &str) -> Result<Preroll, String> {
    match s {
        "band" => Ok(Preroll::Band),
        "budget" => Ok(Preroll::Budget),
        _ => match s.parse::<i32>() {
            Ok(cap) if cap >= 0 => Ok(Preroll::Capped(cap)),
            _ => Err(format!("pre-roll must be 'band', 'budget' or INT >= 0: {}", s)),
        },
    }
}

#[derive(Debug, Clone, Args)]
pub struct EditCliOptions {
    // ===== Scoring Options =====
    /// Penalty for a substitution
    #[arg(short = 'B', long, value_name = "INT", default_value_t = defaults::SUBSTITUTION_PENALTY)]
    pub substitution_penalty: i32,

    /// Penalty for aligning against an unknown base [default: 5, protein 3]
    #[arg(short = 'N', long, value_name = "INT")]
    pub unknown_penalty: Option<i32>,

    /// Gap open penalty; a gap of size k costs '{-O} + {-E}*k' [default: 19, protein 11]
    #[arg(short = 'O', long, value_name = "INT")]
    pub gap_open: Option<i32>,

    /// Gap extension penalty [default: 1]
    #[arg(short = 'E', long, value_name = "INT")]
    pub gap_extend: Option<i32>,

    /// Align protein sequences (BLOSUM62 substitution costs, protein gap defaults)
    #[arg(long)]
    pub protein: bool,

    /// Sequencing platform
    #[arg(long, value_enum, default_value_t = Platform::Generic)]
    pub platform: Platform,

    // ===== Chain Options =====
    /// Word size of the k-mer lower-bound rejecter
    #[arg(long, value_name = "INT", default_value_t = defaults::LOWER_BOUND_WORD_SIZE)]
    pub lower_bound_word: usize,

    /// Lower-bound indel pre-roll: band, budget or INT cap
    #[arg(long, value_name = "POLICY", default_value = "band", value_parser = parse_preroll)]
    pub lower_bound_preroll: Preroll,

    /// Reads at least this long get the seed-extend stage
    #[arg(long, value_name = "INT", default_value_t = defaults::SEED_EXTEND_MIN_READ_LEN)]
    pub seed_extend_min_len: usize,

    /// Anchor word size of the seed-extend stage
    #[arg(long, value_name = "INT", default_value_t = defaults::SEED_EXTEND_WORD_SIZE)]
    pub seed_extend_word: usize,

    /// Log the first INT queries reaching the exact stages (0 disables)
    #[arg(long, value_name = "INT", default_value_t = defaults::LOGGING_ONLY_LIMIT)]
    pub log_queries: u64,

    /// Time every INT-th call per stage
    #[arg(long, value_name = "INT", default_value_t = defaults::STATS_SAMPLE_INTERVAL)]
    pub stats_interval: u64,

    // ===== Soft Clipping =====
    /// Soft-clip unreliable alignment ends
    #[arg(short = 'S', long)]
    pub soft_clip: bool,

    /// Read positions from each end in which an indel triggers clipping
    #[arg(long, value_name = "INT", default_value_t = defaults::SOFT_CLIP_INDEL_ZONE)]
    pub indel_zone: usize,

    /// Read positions from each end in which a mismatch triggers clipping
    #[arg(long, value_name = "INT", default_value_t = defaults::SOFT_CLIP_MISMATCH_ZONE)]
    pub mismatch_zone: usize,

    /// Discard clipped alignments with fewer matches
    #[arg(long, value_name = "INT", default_value_t = defaults::SOFT_CLIP_MIN_MATCHES)]
    pub min_matches: usize,
}

impl EditCliOptions {
    /// Convert into run options; read lengths are filled in by the caller.
    pub fn into_opt(self) -> EditOpt {
        let mut opt = EditOpt::default();
        if self.protein {
            opt.use_protein_defaults();
        }
        // explicit values always win over the data-type defaults
        opt.penalties.substitution = self.substitution_penalty;
        if let Some(unknown) = self.unknown_penalty {
            opt.penalties.unknown = unknown;
        }
        if let Some(gap_open) = self.gap_open {
            opt.penalties.gap_open = gap_open;
        }
        if let Some(gap_extend) = self.gap_extend {
            opt.penalties.gap_extend = gap_extend;
        }
        opt.platform = self.platform;
        opt.lower_bound_word = self.lower_bound_word;
        opt.lower_bound_preroll = self.lower_bound_preroll;
        opt.seed_extend_min_read_len = self.seed_extend_min_len;
        opt.seed_extend_word = self.seed_extend_word;
        opt.logging_only_limit = self.log_queries;
        opt.stats_sample_interval = self.stats_interval;
        if self.soft_clip {
            opt.soft_clip = Some(SoftClipOpt {
                indel_zone: self.indel_zone,
                mismatch_zone: self.mismatch_zone,
                min_matches: self.min_matches,
            });
        }
        opt
    }
}
