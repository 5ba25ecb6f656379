pub mod core;
pub mod defaults;
pub mod edit_opt;
pub mod error;

pub use crate::core::alignment::actions::{Action, AlignmentRecord, MAX_SCORE};
pub use crate::core::alignment::factory::EditDistanceFactory;
pub use crate::core::alignment::orientation::BidirectionalAligner;
pub use crate::edit_opt::EditOpt;
