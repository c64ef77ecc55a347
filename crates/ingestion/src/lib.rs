//! # Ingestion Pipeline
//!
//! Turns the text output of external measurement tools into store updates.
//!
//! Responsibilities:
//! - Run one line source per stream (iperf listener per port, link probe)
//! - Parse iperf TCP/UDP CSV and bwm-ng CSV lines, dropping malformed ones
//! - Map each flow's interval numbering onto experiment time
//! - Feed `Store::ingest` / `Store::ingest_link`
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::IngestionPipeline;
//!
//! let pipeline = IngestionPipeline::from_blueprint(&blueprint, store, clock, stop)?;
//! pipeline.start_all();
//! // ... consumer runs ...
//! pipeline.stop_all();
//! ```
//!
//! ## Scripted Sources
//!
//! ```ignore
//! use ingestion::ScriptedLineSource;
//!
//! let source = ScriptedLineSource::new("tcp", StreamKind::Listener(Protocol::Tcp), lines);
//! pipeline.register_listener(Protocol::Tcp, Box::new(source))?;
//! ```

mod adapter;
mod anchor;
mod config;
mod error;
mod handlers;
mod line_adapter;
mod mock;
mod parsers;
mod pipeline;
mod process;

// Re-exports
pub use adapter::{IngestContext, StreamAdapter};
pub use anchor::TimeAnchor;
pub use config::{IngestionMetrics, MetricsSnapshot};
pub use error::{IngestionError, Result};
pub use handlers::{LineHandler, LinkHandler, ListenerHandler};
pub use line_adapter::LineAdapter;
pub use mock::ScriptedLineSource;
pub use parsers::{parse_bwm_ng, parse_iperf, parse_iperf_tcp, parse_iperf_udp, LineRejected};
pub use pipeline::IngestionPipeline;
pub use process::{bwm_ng_args, iperf_server_args, ProcessLineSource};
