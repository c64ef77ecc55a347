//! Per-flow time anchoring.
//!
//! iperf numbers its intervals from the start of each client session, not
//! from the start of the experiment. The anchor maps that numbering onto
//! experiment time: it is (re)set whenever a session starts over, or when
//! a flow is first seen, since the first UDP report may have been lost.

use std::collections::HashMap;

use contracts::{FlowId, RateReport};

#[derive(Debug, Default)]
pub struct TimeAnchor {
    anchors: HashMap<FlowId, f64>,
}

impl TimeAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Experiment time of `report`, received at experiment time `now`.
    pub fn stamp(&mut self, report: &RateReport, now: f64, report_interval: f64) -> f64 {
        let restarted = report.interval_start == 0.0;
        let anchor = match self.anchors.get_mut(&report.flow_id) {
            Some(anchor) => {
                if restarted {
                    *anchor = now - report_interval;
                }
                *anchor
            }
            None => {
                let anchor = now - report_interval;
                self.anchors.insert(report.flow_id.clone(), anchor);
                anchor
            }
        };
        anchor + report.interval_end
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
