//! Silence detection: close a series with a zero when its stream stops.

use contracts::EngineConfig;

use crate::series::TimeSeries;

/// Appends a one-shot death marker to series that went quiet.
#[derive(Debug, Clone, Copy)]
pub struct DeathDetector {
    tolerance: f64,
    interval: f64,
}

impl DeathDetector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tolerance: config.death_tolerance(),
            interval: config.report_interval_s,
        }
    }

    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Periodic sweep rule: silent for at least the tolerance.
    ///
    /// Returns the time of the appended marker.
    pub fn mark_if_silent(&self, series: &mut TimeSeries, now: f64) -> Option<f64> {
        let last = series.last()?;
        if now - last.time >= self.tolerance {
            series.mark_dead(self.interval)
        } else {
            None
        }
    }

    /// Sibling rule used during reconciliation: silent for strictly more
    /// than the tolerance, measured from the incoming sample time.
    pub fn mark_if_outlived(&self, series: &mut TimeSeries, time: f64) -> Option<f64> {
        let last = series.last()?;
        if time - last.time > self.tolerance {
            series.mark_dead(self.interval)
        } else {
            None
        }
    }
}
