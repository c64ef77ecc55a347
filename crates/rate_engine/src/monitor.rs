//! Periodic consumer: death sweep, liveness watchdog, per-tick report.

use std::sync::Arc;
use std::time::Duration;

use contracts::{StopFlag, TickReport, WatchdogConfig};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, instrument, warn};

use crate::clock::ExperimentClock;
use crate::store::Store;

/// Drives the store on a fixed cadence.
///
/// Each tick appends death markers, counts active flows and, once the
/// watchdog deadline has passed, checks that enough flows are alive.
#[derive(Debug)]
pub struct Monitor {
    store: Arc<Store>,
    watchdog: WatchdogConfig,
    stop: StopFlag,
    watchdog_checked: bool,
}

impl Monitor {
    pub fn new(store: Arc<Store>, watchdog: WatchdogConfig, stop: StopFlag) -> Self {
        Self {
            store,
            watchdog,
            stop,
            watchdog_checked: false,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Run one consumer step at experiment time `now`.
    #[instrument(level = "debug", name = "monitor_tick", skip(self))]
    pub fn tick(&mut self, now: f64) -> TickReport {
        let view = self.store.tick_view(now);
        let watchdog_tripped = self.check_watchdog(now, view.active_flows);

        TickReport {
            now,
            active_flows: view.active_flows,
            deaths_marked: view.deaths_marked,
            flow_rates: view.flow_rates,
            link_rate: view.link_rate,
            watchdog_tripped,
        }
    }

    /// One-shot liveness check at the configured deadline.
    fn check_watchdog(&mut self, now: f64, active: usize) -> bool {
        if !self.watchdog.is_enabled()
            || self.watchdog_checked
            || now < self.watchdog.check_after_s
        {
            return false;
        }
        self.watchdog_checked = true;

        if active < self.watchdog.expected_flows {
            warn!(
                active,
                expected = self.watchdog.expected_flows,
                "too few active flows, stopping run"
            );
            self.stop.trigger();
            true
        } else {
            info!(active, "liveness check passed");
            false
        }
    }

    /// Tick every `period` until the stop flag is set.
    ///
    /// `on_tick` sees every report, including the one that tripped the
    /// watchdog. Returns the number of ticks run.
    pub async fn run<C, F>(mut self, clock: Arc<C>, period: Duration, mut on_tick: F) -> u64
    where
        C: ExperimentClock + ?Sized,
        F: FnMut(&TickReport),
    {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = 0;

        while !self.stop.is_set() {
            ticker.tick().await;
            if self.stop.is_set() {
                break;
            }
            let report = self.tick(clock.now());
            ticks += 1;
            on_tick(&report);
        }
        ticks
    }
}
