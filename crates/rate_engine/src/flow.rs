//! Per-flow state: one series per protocol, the total, and pending stamps.

use contracts::{FlowSnapshot, Protocol, Sample};

use crate::pending::PendingSet;
use crate::series::TimeSeries;

/// Everything the engine knows about one client address.
#[derive(Debug, Clone, Default)]
pub struct FlowRecord {
    tcp: TimeSeries,
    udp: TimeSeries,
    total: TimeSeries,
    pending: PendingSet,
}

impl FlowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn series(&self, protocol: Protocol) -> &TimeSeries {
        match protocol {
            Protocol::Tcp => &self.tcp,
            Protocol::Udp => &self.udp,
        }
    }

    #[inline]
    pub fn series_mut(&mut self, protocol: Protocol) -> &mut TimeSeries {
        match protocol {
            Protocol::Tcp => &mut self.tcp,
            Protocol::Udp => &mut self.udp,
        }
    }

    #[inline]
    pub fn total(&self) -> &TimeSeries {
        &self.total
    }

    #[inline]
    pub fn total_mut(&mut self) -> &mut TimeSeries {
        &mut self.total
    }

    #[inline]
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    #[inline]
    pub fn pending_mut(&mut self) -> &mut PendingSet {
        &mut self.pending
    }

    /// The protocol owning a sample at exactly `time`, and its value.
    ///
    /// TCP wins when both protocols reported at the same instant.
    pub fn own_sample_at(&self, time: f64) -> Option<(Protocol, f64)> {
        Protocol::ALL
            .into_iter()
            .find_map(|p| self.series(p).value_at(time).map(|v| (p, v)))
    }

    /// Whether any series ends with a recent sample carrying traffic.
    pub fn is_active(&self, now: f64, window: f64) -> bool {
        [&self.tcp, &self.udp, &self.total].into_iter().any(|series| {
            matches!(series.last(), Some(Sample { time, value }) if now - time <= window && value > 0.0)
        })
    }

    /// Mutable access to the three series, for the death sweep.
    pub(crate) fn all_series_mut(&mut self) -> [&mut TimeSeries; 3] {
        [&mut self.tcp, &mut self.udp, &mut self.total]
    }

    pub fn to_snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            tcp: self.tcp.samples().to_vec(),
            udp: self.udp.samples().to_vec(),
            total: self.total.samples().to_vec(),
            pending: self.pending.as_slice().to_vec(),
        }
    }
}
