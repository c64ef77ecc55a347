//! Shared flow store.
//!
//! One mutex guards every flow and the link aggregate: producers mutate
//! under it in [`Store::ingest`], the consumer reads under it in
//! [`Store::snapshot`]. Nothing done while holding the lock blocks.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{EngineConfig, FlowId, Protocol, StoreSnapshot};
use tracing::{debug, instrument};

use crate::death::DeathDetector;
use crate::flow::FlowRecord;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::series::TimeSeries;

#[derive(Debug, Default)]
struct StoreState {
    flows: HashMap<FlowId, FlowRecord>,
    link: TimeSeries,
}

/// What the consumer needs each tick, read under one lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickView {
    pub deaths_marked: usize,
    pub active_flows: usize,
    /// Latest total per flow
    pub flow_rates: BTreeMap<FlowId, f64>,
    pub link_rate: Option<f64>,
}

/// Concurrency-safe aggregate of every flow plus the link-wide series.
#[derive(Debug)]
pub struct Store {
    state: Mutex<StoreState>,
    config: EngineConfig,
    reconciler: Reconciler,
    detector: DeathDetector,
}

impl Store {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: Mutex::default(),
            reconciler: Reconciler::new(&config),
            detector: DeathDetector::new(&config),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // A panic in another holder leaves plain data behind; keep serving it.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold one protocol report into its flow, creating the flow if new.
    #[instrument(level = "debug", name = "store_ingest", skip(self), fields(flow = %flow_id))]
    pub fn ingest(
        &self,
        flow_id: &FlowId,
        protocol: Protocol,
        time: f64,
        value: f64,
    ) -> ReconcileOutcome {
        let mut state = self.lock();
        if !state.flows.contains_key(flow_id) {
            debug!("new flow");
        }
        let flow = state.flows.entry(flow_id.clone()).or_default();
        let outcome = self.reconciler.apply(flow, protocol, time, value);
        drop(state);

        metrics::counter!("flowmeter_reports_ingested_total", "protocol" => protocol.as_str())
            .increment(1);
        if outcome.resolved > 0 {
            metrics::counter!("flowmeter_pending_resolved_total").increment(outcome.resolved as u64);
        }
        if outcome.sibling_marked_dead {
            metrics::counter!("flowmeter_deaths_marked_total", "cause" => "sibling_silent")
                .increment(1);
        }
        metrics::gauge!("flowmeter_pending_depth", "flow" => flow_id.to_string())
            .set(outcome.pending as f64);

        outcome
    }

    /// Record one link-wide probe sample.
    ///
    /// A second sample at the same time replaces the first.
    pub fn ingest_link(&self, time: f64, value: f64) {
        self.lock().link.upsert(time, value);
    }

    /// Append death markers to every silent series of every flow.
    ///
    /// Returns the number of markers appended.
    pub fn sweep_dead(&self, now: f64) -> usize {
        let marked = self.sweep_locked(&mut self.lock(), now);
        record_sweep(marked);
        marked
    }

    /// Death sweep, active count and latest totals from one store state.
    ///
    /// Only the last sample of each series is read, so the cost does not
    /// grow with run length.
    pub fn tick_view(&self, now: f64) -> TickView {
        let mut state = self.lock();
        let deaths_marked = self.sweep_locked(&mut state, now);
        let window = self.config.liveness_window();
        let view = TickView {
            deaths_marked,
            active_flows: state
                .flows
                .values()
                .filter(|flow| flow.is_active(now, window))
                .count(),
            flow_rates: state
                .flows
                .iter()
                .filter_map(|(id, flow)| flow.total().last().map(|s| (id.clone(), s.value)))
                .collect(),
            link_rate: state.link.last().map(|s| s.value),
        };
        drop(state);

        record_sweep(deaths_marked);
        view
    }

    fn sweep_locked(&self, state: &mut StoreState, now: f64) -> usize {
        let mut marked = 0;
        for (flow_id, flow) in state.flows.iter_mut() {
            for series in flow.all_series_mut() {
                if let Some(marker) = self.detector.mark_if_silent(series, now) {
                    debug!(flow = %flow_id, marker, "series went silent");
                    marked += 1;
                }
            }
        }
        marked
    }

    /// Flows with traffic inside the configured liveness window.
    pub fn active_count(&self, now: f64) -> usize {
        self.active_count_within(now, self.config.liveness_window())
    }

    pub fn active_count_within(&self, now: f64, window: f64) -> usize {
        self.lock()
            .flows
            .values()
            .filter(|flow| flow.is_active(now, window))
            .count()
    }

    pub fn flow_count(&self) -> usize {
        self.lock().flows.len()
    }

    /// Consistent copy of every flow and the link series.
    pub fn snapshot(&self, now: f64) -> StoreSnapshot {
        let state = self.lock();
        StoreSnapshot {
            taken_at: now,
            flows: state
                .flows
                .iter()
                .map(|(id, flow)| (id.clone(), flow.to_snapshot()))
                .collect(),
            link: state.link.samples().to_vec(),
        }
    }
}

fn record_sweep(marked: usize) {
    if marked > 0 {
        metrics::counter!("flowmeter_deaths_marked_total", "cause" => "silence")
            .increment(marked as u64);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
