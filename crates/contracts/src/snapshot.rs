//! Store snapshots - consumer view
//!
//! Copies of the store state taken under a single lock acquisition.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{FlowId, Protocol, Sample};

/// Consistent copy of every flow plus the link aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Experiment time at which the snapshot was taken
    pub taken_at: f64,

    /// Per-flow series, ordered by address
    pub flows: BTreeMap<FlowId, FlowSnapshot>,

    /// Link-wide rate as measured by the probe
    pub link: Vec<Sample>,
}

impl StoreSnapshot {
    /// Latest link rate, if the probe reported anything.
    pub fn link_rate(&self) -> Option<f64> {
        self.link.last().map(|s| s.value)
    }
}

/// The three series of one flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowSnapshot {
    pub tcp: Vec<Sample>,
    pub udp: Vec<Sample>,
    pub total: Vec<Sample>,

    /// Timestamps still awaiting the sibling protocol
    pub pending: Vec<f64>,
}

impl FlowSnapshot {
    /// Series for one protocol.
    pub fn protocol(&self, protocol: Protocol) -> &[Sample] {
        match protocol {
            Protocol::Tcp => &self.tcp,
            Protocol::Udp => &self.udp,
        }
    }

    /// Total at exactly `time`, if present.
    pub fn total_at(&self, time: f64) -> Option<f64> {
        self.total
            .iter()
            .find(|s| s.time == time)
            .map(|s| s.value)
    }

    /// Latest total sample value.
    pub fn current_total(&self) -> Option<f64> {
        self.total.last().map(|s| s.value)
    }
}

/// Outcome of one consumer tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickReport {
    /// Experiment time of the tick
    pub now: f64,

    /// Flows considered active by the liveness rule
    pub active_flows: usize,

    /// Synthetic zero samples appended by the death sweep
    pub deaths_marked: usize,

    /// Latest total per flow
    pub flow_rates: BTreeMap<FlowId, f64>,

    /// Latest link rate
    pub link_rate: Option<f64>,

    /// Set when the watchdog decided the run must stop
    pub watchdog_tripped: bool,
}
