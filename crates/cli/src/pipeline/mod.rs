//! Measurement run orchestration.

mod orchestrator;
mod output;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use output::{default_output_path, write_snapshot};
pub use stats::PipelineStats;
