//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the workspace.
//! Business crates depend only on this crate for cross-crate types.
//!
//! ## Time Model
//! - Experiment time: seconds (f64) since the run started
//! - Rates: bit/s (f64)

mod blueprint;
mod engine_config;
mod error;
mod flow_id;
mod line_source;
mod report;
mod snapshot;
mod stop;
mod units;

pub use blueprint::*;
pub use engine_config::*;
pub use error::*;
pub use flow_id::FlowId;
pub use line_source::{LineCallback, LineSource, SourceEvent};
pub use report::*;
pub use snapshot::*;
pub use stop::StopFlag;
pub use units::{format_rate, parse_rate};
