//! Rate reports - Ingestion output
//!
//! Parsed, validated report lines ready to be handed to the store.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::FlowId;

/// Transport protocol of a per-flow measurement stream.
///
/// A flow's total rate is the sum of its two protocol contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Both protocols, in lookup priority order.
    pub const ALL: [Protocol; 2] = [Protocol::Tcp, Protocol::Udp];

    /// The sibling protocol.
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Protocol::Tcp => Protocol::Udp,
            Protocol::Udp => Protocol::Tcp,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since experiment start
    pub time: f64,

    /// Rate in bit/s
    pub value: f64,
}

impl Sample {
    #[inline]
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Per-flow report parsed from an iperf server line.
///
/// `interval_start`/`interval_end` are in the tool's own interval
/// numbering; they are turned into experiment time by the time anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct RateReport {
    /// Client address
    pub flow_id: FlowId,

    /// Stream the report came from
    pub protocol: Protocol,

    /// Interval start as printed by the tool (seconds)
    pub interval_start: f64,

    /// Interval end as printed by the tool (seconds)
    pub interval_end: f64,

    /// Measured rate in bit/s
    pub rate_bps: f64,
}

impl RateReport {
    /// Width of the reported interval.
    #[inline]
    pub fn interval_width(&self) -> f64 {
        self.interval_end - self.interval_start
    }
}

/// Whole-interface report parsed from the link probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkReport {
    /// Unix timestamp printed by the probe (seconds)
    pub unix_time: f64,

    /// Incoming rate in bit/s
    pub rate_bps: f64,
}

/// Kind of external stream a line source produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Per-flow reports for one protocol listener
    Listener(Protocol),
    /// Link-wide probe
    LinkProbe,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Listener(protocol) => write!(f, "{protocol}_listener"),
            StreamKind::LinkProbe => f.write_str("link_probe"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_protocol() {
        assert_eq!(Protocol::Tcp.other(), Protocol::Udp);
        assert_eq!(Protocol::Udp.other(), Protocol::Tcp);
    }

    #[test]
    fn test_interval_width() {
        let report = RateReport {
            flow_id: "10.0.0.2".into(),
            protocol: Protocol::Tcp,
            interval_start: 9.0,
            interval_end: 10.0,
            rate_bps: 1_455_352.0,
        };
        assert_eq!(report.interval_width(), 1.0);
    }

    #[test]
    fn test_stream_kind_display() {
        assert_eq!(
            StreamKind::Listener(Protocol::Udp).to_string(),
            "udp_listener"
        );
        assert_eq!(StreamKind::LinkProbe.to_string(), "link_probe");
    }
}
