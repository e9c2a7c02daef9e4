//! Pipeline step implementations.
//!
//! Each step handles one phase of a render.

mod plan;
mod publish;
mod render;
mod validate;

pub use plan::PlanStep;
pub use publish::PublishStep;
pub use render::RenderStep;
pub use validate::{check_monotonic, ValidateStep};
