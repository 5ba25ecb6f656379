//! Edit-distance aligners and their composition.
//!
//! Every aligner implements [`aligner::EditDistance`]. A
//! [`chain::PrioritisedChain`] tries them cheapest first, an
//! [`orientation::BidirectionalAligner`] runs one chain per strand, and
//! [`factory::EditDistanceFactory`] assembles both from run options.

pub mod actions;
pub mod affine_gap;
pub mod aligner;
pub mod chain;
pub mod cigar;
pub mod factory;
pub mod logging_only;
pub mod lower_bound;
pub mod no_indels;
pub mod orientation;
pub mod penalties;
pub mod seed;
pub mod seed_extend;
pub mod soft_clip;
pub mod workspace; // Per-instance scratch buffers
