//! Pipeline orchestration module.

mod orchestrator;
mod stats;
mod status;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
