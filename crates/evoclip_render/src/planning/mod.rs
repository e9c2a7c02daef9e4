//! Segment planning: sentences, scenes and clips in; segments and a draft
//! timeline out.

mod planner;
mod segment;

pub use planner::SegmentPlanner;
pub use segment::{PlanError, PlanOutput, Segment};
