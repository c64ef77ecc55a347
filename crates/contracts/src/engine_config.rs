//! Rate engine configuration contracts shared across crates.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Reconciliation and liveness tuning.
///
/// All derived windows scale with the nominal report interval of the
/// measurement tools.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    /// Nominal interval between two reports of the same stream (seconds)
    #[validate(range(exclusive_min = 0.0))]
    pub report_interval_s: f64,

    /// Silence, in report intervals, after which a series is declared dead
    #[validate(range(min = 1.0))]
    pub death_tolerance_factor: f64,

    /// Burn half-width as a fraction of the report interval
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub burn_fraction: f64,

    /// Maximum age of a pending timestamp relative to the newest one (seconds)
    #[validate(range(exclusive_min = 0.0))]
    pub max_time_window_s: f64,

    /// Multiplier of the death tolerance used by the active-flow count
    #[validate(range(exclusive_min = 0.0))]
    pub liveness_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            report_interval_s: 1.0,
            death_tolerance_factor: 2.0,
            burn_fraction: 0.8,
            max_time_window_s: 60.0,
            liveness_factor: 1.0,
        }
    }
}

impl EngineConfig {
    /// Half-width `T` of the burn window.
    #[inline]
    pub fn burn_half_width(&self) -> f64 {
        self.burn_fraction * self.report_interval_s
    }

    /// Silence after which a death marker is appended.
    #[inline]
    pub fn death_tolerance(&self) -> f64 {
        self.death_tolerance_factor * self.report_interval_s
    }

    /// Recency window used when counting active flows.
    #[inline]
    pub fn liveness_window(&self) -> f64 {
        self.liveness_factor * self.death_tolerance()
    }
}

/// Liveness watchdog: abort the run when too few flows are active.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Flows that must be active at the check instant (0 = disabled)
    pub expected_flows: usize,

    /// Experiment time of the check (seconds)
    #[validate(range(min = 0.0))]
    pub check_after_s: f64,
}

impl WatchdogConfig {
    pub fn is_enabled(&self) -> bool {
        self.expected_flows > 0 && self.check_after_s > 0.0
    }
}
