//! Builds per-worker aligners from run configuration.
//!
//! Configuration is validated once in [`EditDistanceFactory::new`]; every
//! later [`build`](EditDistanceFactory::build) hands out a fresh, independent
//! aligner whose scratch buffers belong to the calling worker alone.

use super::affine_gap::AffineGapAligner;
use super::aligner::{BoxedEditDistance, EditDistance};
use super::chain::PrioritisedChain;
use super::logging_only::LoggingOnlyAligner;
use super::lower_bound::LowerBoundAligner;
use super::no_indels::NoIndelsAligner;
use super::orientation::{BidirectionalAligner, FixedGapCorrection, GapCorrection, NoGapCorrection};
use super::penalties::Penalties;
use super::seed_extend::SeedExtendAligner;
use super::soft_clip::SoftClipper;
use crate::core::compute::encoding::ResidueAlphabet;
use crate::defaults;
use crate::edit_opt::{EditOpt, Platform};
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct EditDistanceFactory {
    opt: EditOpt,
    penalties: Penalties,
}

impl EditDistanceFactory {
    pub fn new(opt: EditOpt) -> Result<Self, ConfigError> {
        opt.validate()?;
        let penalties = opt.effective_penalties();
        penalties.validate()?;
        Ok(Self { opt, penalties })
    }

    pub fn opt(&self) -> &EditOpt {
        &self.opt
    }

    pub fn penalties(&self) -> &Penalties {
        &self.penalties
    }

    /// One direction's chain, cheapest stage first.
    pub fn build_chain(&self) -> PrioritisedChain {
        let p = &self.penalties;
        let opt = &self.opt;
        let mut stages: Vec<BoxedEditDistance> = Vec::new();

        match (opt.data_type, opt.platform) {
            (ResidueAlphabet::Protein, _) => {
                stages.push(Box::new(AffineGapAligner::new(p.clone())));
            }
            (ResidueAlphabet::Nucleotide, Platform::CompleteGenomicsLegacy) => {
                if opt.logging_only_limit > 0 {
                    stages.push(Box::new(LoggingOnlyAligner::new(p.alphabet(), opt.logging_only_limit)));
                }
                // the band is widened to the known gap, so the diagonal-only
                // stages would reject valid alignments
                stages.push(Box::new(AffineGapAligner::seeded(
                    p.clone(),
                    defaults::CG_LEGACY_SPAN_OFFSET,
                )));
            }
            (ResidueAlphabet::Nucleotide, Platform::Generic) => {
                stages.push(Box::new(NoIndelsAligner::new(p.clone())));
                stages.push(Box::new(LowerBoundAligner::new(
                    p.clone(),
                    opt.lower_bound_word,
                    opt.lower_bound_preroll,
                )));
                if opt.logging_only_limit > 0 {
                    stages.push(Box::new(LoggingOnlyAligner::new(p.alphabet(), opt.logging_only_limit)));
                }
                if opt.read_length.max >= opt.seed_extend_min_read_len {
                    stages.push(Box::new(SeedExtendAligner::new(
                        p.clone(),
                        opt.seed_extend_word,
                        opt.seed_extend_min_read_len,
                    )));
                }
                stages.push(Box::new(AffineGapAligner::new(p.clone())));
            }
        }
        PrioritisedChain::new(stages, opt.stats_sample_interval)
    }

    fn build_direction(&self) -> BoxedEditDistance {
        let chain = self.build_chain();
        match self.opt.soft_clip {
            Some(clip) => Box::new(SoftClipper::new(chain, clip)),
            None => Box::new(chain),
        }
    }

    fn gap_correction(&self) -> Box<dyn GapCorrection> {
        match self.opt.platform {
            Platform::CompleteGenomicsLegacy => Box::new(FixedGapCorrection::complete_genomics_legacy()),
            Platform::Generic => Box::new(NoGapCorrection),
        }
    }

    /// A fresh aligner for one worker.
    pub fn build(&self) -> BidirectionalAligner {
        let forward = self.build_direction();
        if log::log_enabled!(log::Level::Debug) {
            let stages: Vec<&str> = forward
                .chain_stats()
                .map(|stats| stats.stages.iter().map(|s| s.name).collect())
                .unwrap_or_default();
            log::debug!(
                "built {} aligner: {}",
                self.opt.platform.name(),
                stages.join(" -> ")
            );
        }
        match self.opt.data_type {
            ResidueAlphabet::Protein => BidirectionalAligner::single(forward),
            ResidueAlphabet::Nucleotide => {
                BidirectionalAligner::new(forward, self.build_direction(), self.gap_correction())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alignment::soft_clip::SoftClipOpt;
    use crate::edit_opt::ReadLengthStats;

    #[test]
    fn test_short_read_chain() {
        let opt = EditOpt {
            read_length: ReadLengthStats::fixed(100),
            ..Default::default()
        };
        let factory = EditDistanceFactory::new(opt).unwrap();
        assert_eq!(
            factory.build_chain().stage_names(),
            vec!["no-indels", "lower-bound", "affine-gap"]
        );
    }

    #[test]
    fn test_built_aligner_carries_one_chain_per_direction() {
        let opt = EditOpt {
            read_length: ReadLengthStats::fixed(100),
            ..Default::default()
        };
        let aligner = EditDistanceFactory::new(opt).unwrap().build();
        fn names(stats: &crate::core::alignment::chain::ChainStats) -> Vec<&'static str> {
            stats.stages.iter().map(|s| s.name).collect()
        }
        let expected = vec!["no-indels", "lower-bound", "affine-gap"];
        assert_eq!(names(aligner.forward_stats().unwrap()), expected);
        assert_eq!(names(aligner.reverse_stats().unwrap()), expected);
    }

    #[test]
    fn test_long_read_chain_with_diagnostics() {
        let opt = EditOpt {
            read_length: ReadLengthStats::new(150, 300),
            logging_only_limit: 10,
            ..Default::default()
        };
        let factory = EditDistanceFactory::new(opt).unwrap();
        assert_eq!(
            factory.build_chain().stage_names(),
            vec!["no-indels", "lower-bound", "logging-only", "seed-extend", "affine-gap"]
        );
    }

    #[test]
    fn test_cg_legacy_chain() {
        let opt = EditOpt {
            platform: Platform::CompleteGenomicsLegacy,
            read_length: ReadLengthStats::fixed(35),
            ..Default::default()
        };
        let factory = EditDistanceFactory::new(opt).unwrap();
        assert_eq!(factory.build_chain().stage_names(), vec!["cg-affine-gap"]);
        assert!(factory.build().is_bidirectional());
    }

    #[test]
    fn test_cg_legacy_rejects_variable_lengths() {
        let opt = EditOpt {
            platform: Platform::CompleteGenomicsLegacy,
            read_length: ReadLengthStats::new(33, 35),
            ..Default::default()
        };
        assert!(matches!(
            EditDistanceFactory::new(opt),
            Err(ConfigError::FixedReadLength { .. })
        ));
    }

    #[test]
    fn test_protein_is_single_direction() {
        let mut opt = EditOpt::default();
        opt.use_protein_defaults();
        let factory = EditDistanceFactory::new(opt).unwrap();
        assert_eq!(factory.penalties().alphabet(), ResidueAlphabet::Protein);
        assert_eq!(factory.build_chain().stage_names(), vec!["affine-gap"]);
        assert!(!factory.build().is_bidirectional());
    }

    #[test]
    fn test_soft_clip_wraps_each_direction() {
        let opt = EditOpt {
            read_length: ReadLengthStats::fixed(50),
            soft_clip: Some(SoftClipOpt::default()),
            ..Default::default()
        };
        let aligner = EditDistanceFactory::new(opt).unwrap().build();
        let debug = format!("{:?}", aligner);
        assert!(debug.contains("soft-clip"));
        assert!(aligner.forward_stats().is_some());
        assert!(aligner.reverse_stats().is_some());
    }

    #[test]
    fn test_builds_are_independent() {
        let factory = EditDistanceFactory::new(EditOpt::default()).unwrap();
        let template: std::sync::Arc<[u8]> = vec![0u8, 1, 2, 3, 0, 1, 2, 3, 0, 1].into();
        let mut a = factory.build();
        let b = factory.build();
        a.set_template(template);
        a.calculate_edit_distance(&[0, 1, 2, 3], 4, 0, false, 10, 2, false);
        assert_eq!(a.forward_stats().unwrap().total_calls(), 1);
        assert_eq!(b.forward_stats().unwrap().total_calls(), 0);
    }
}
