//! # Rate Engine
//!
//! Real-time reconciliation of per-flow TCP and UDP throughput.
//!
//! Each flow keeps one series per protocol and a combined total. A fresh
//! report for one protocol is written provisionally into the total; once
//! the sibling protocol can be interpolated at that instant the total is
//! rewritten as the sum. Silent series are closed with a zero sample.
//!
//! ## Usage
//!
//! ```ignore
//! use rate_engine::{Monitor, Store, SystemClock};
//!
//! let store = Arc::new(Store::new(config.engine.clone()));
//!
//! // Producers, one per report stream
//! store.ingest(&flow_id, Protocol::Tcp, time, rate_bps);
//!
//! // Consumer
//! let monitor = Monitor::new(store.clone(), config.watchdog.clone(), stop.clone());
//! monitor.run(Arc::new(SystemClock::start()), period, |report| render(report)).await;
//! ```

mod clock;
mod death;
mod flow;
mod monitor;
mod pending;
mod reconciler;
mod series;
mod store;

pub use clock::{ExperimentClock, ManualClock, SystemClock};
pub use death::DeathDetector;
pub use flow::FlowRecord;
pub use monitor::Monitor;
pub use pending::PendingSet;
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use series::TimeSeries;
pub use store::{Store, TickView};

// Re-export contracts types
pub use contracts::{EngineConfig, Protocol, StoreSnapshot, TickReport, WatchdogConfig};
