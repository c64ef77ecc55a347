//! Per-line handling: parse, stamp, store.

use std::sync::{Mutex, PoisonError};

use contracts::Protocol;

use crate::adapter::IngestContext;
use crate::anchor::TimeAnchor;
use crate::parsers::{parse_bwm_ng, parse_iperf, LineRejected};

/// Turns one raw line into a store update.
pub trait LineHandler: Send + Sync + 'static {
    fn handle(&self, line: &str, ctx: &IngestContext) -> Result<(), LineRejected>;
}

/// iperf listener for one protocol.
#[derive(Debug)]
pub struct ListenerHandler {
    protocol: Protocol,
    report_interval: f64,
    anchor: Mutex<TimeAnchor>,
}

impl ListenerHandler {
    pub fn new(protocol: Protocol, report_interval: f64) -> Self {
        Self {
            protocol,
            report_interval,
            anchor: Mutex::new(TimeAnchor::new()),
        }
    }
}

impl LineHandler for ListenerHandler {
    fn handle(&self, line: &str, ctx: &IngestContext) -> Result<(), LineRejected> {
        let report = parse_iperf(self.protocol, line, self.report_interval)?;
        let now = ctx.clock.now();
        let time = self
            .anchor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stamp(&report, now, self.report_interval);

        ctx.store
            .ingest(&report.flow_id, report.protocol, time, report.rate_bps);
        Ok(())
    }
}

/// Link-wide probe.
#[derive(Debug, Default)]
pub struct LinkHandler;

impl LineHandler for LinkHandler {
    fn handle(&self, line: &str, ctx: &IngestContext) -> Result<(), LineRejected> {
        let report = parse_bwm_ng(line)?;
        ctx.store
            .ingest_link(ctx.clock.from_unix(report.unix_time), report.rate_bps);
        Ok(())
    }
}
