//! Core reusable components for edit-distance alignment.
//!
//! `compute` holds residue encoding shared by every aligner; `alignment`
//! holds the aligners, their composition and the alignment record.

pub mod alignment;
pub mod compute;
