//! Cross-protocol reconciliation of one flow.
//!
//! Every fresh protocol sample is written twice: into its own series and,
//! provisionally, into the flow total. Totals written while the sibling
//! protocol was still unknown are tracked as pending and rewritten to
//! `own + sibling` once the sibling series can be interpolated there.

use contracts::{EngineConfig, Protocol};
use tracing::{instrument, trace};

use crate::death::DeathDetector;
use crate::flow::FlowRecord;

/// What a single [`Reconciler::apply`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Samples of the same series removed by the burn window
    pub burned: usize,
    /// Pending timestamps whose total became `own + sibling`
    pub resolved: usize,
    /// Pending timestamps dropped for age
    pub pruned: usize,
    /// Pending timestamps left after this call
    pub pending: usize,
    /// Whether the sibling series received a death marker
    pub sibling_marked_dead: bool,
}

/// Stateless reconciliation rules, parameterized by the engine config.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    burn_half_width: f64,
    max_time_window: f64,
    detector: DeathDetector,
}

impl Reconciler {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            burn_half_width: config.burn_half_width(),
            max_time_window: config.max_time_window_s,
            detector: DeathDetector::new(config),
        }
    }

    /// Fold one protocol sample into `flow`.
    #[instrument(level = "trace", name = "reconcile", skip(self, flow))]
    pub fn apply(
        &self,
        flow: &mut FlowRecord,
        protocol: Protocol,
        time: f64,
        value: f64,
    ) -> ReconcileOutcome {
        let half = self.burn_half_width;

        let own = flow.series_mut(protocol);
        let burned = own.burn_delete(time, half);
        own.insert(time, value);

        // Provisional: only this protocol's contribution is known here
        flow.total_mut().upsert(time, value);

        let neighbours: Vec<f64> = flow.total().times_within(time - half, time + half).collect();
        flow.pending_mut().extend(neighbours);

        let marker = self
            .detector
            .mark_if_outlived(flow.series_mut(protocol.other()), time);
        if let Some(marker) = marker {
            trace!(sibling = %protocol.other(), marker, "sibling went silent");
            flow.pending_mut().insert(marker);
        }

        let pruned = flow.pending_mut().normalize(self.max_time_window);
        let resolved = self.resolve_pending(flow);

        ReconcileOutcome {
            burned,
            resolved,
            pruned,
            pending: flow.pending().len(),
            sibling_marked_dead: marker.is_some(),
        }
    }

    /// Rewrite every pending total whose sibling contribution is now known.
    ///
    /// A sibling value that is unavailable or not positive leaves the entry
    /// pending, as does a timestamp with no owning protocol sample.
    fn resolve_pending(&self, flow: &mut FlowRecord) -> usize {
        let resolved: Vec<(f64, f64)> = flow
            .pending()
            .as_slice()
            .iter()
            .filter_map(|&ts| {
                let (owner, own) = flow.own_sample_at(ts)?;
                let sibling = flow.series(owner.other()).interpolate(ts)?;
                (sibling > 0.0).then_some((ts, own + sibling))
            })
            .collect();

        for &(ts, total) in &resolved {
            flow.total_mut().upsert(ts, total);
        }

        let stamps: Vec<f64> = resolved.iter().map(|&(ts, _)| ts).collect();
        flow.pending_mut().remove_all(&stamps);
        stamps.len()
    }
}
