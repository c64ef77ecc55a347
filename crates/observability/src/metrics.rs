//! Monitor metrics
//!
//! Gauges refreshed on every consumer tick, plus an in-memory aggregator
//! that summarizes a whole run.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{format_rate, TickReport};
use metrics::{counter, gauge, histogram};

/// Record the gauges of one consumer tick.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_tick;
///
/// monitor.run(clock, period, |report| record_tick(report)).await;
/// ```
pub fn record_tick(report: &TickReport) {
    counter!("flowmeter_ticks_total").increment(1);
    gauge!("flowmeter_active_flows").set(report.active_flows as f64);

    for (flow, rate) in &report.flow_rates {
        gauge!("flowmeter_flow_rate_bps", "flow" => flow.to_string()).set(*rate);
        histogram!("flowmeter_flow_rate_bps_hist", "flow" => flow.to_string()).record(*rate);
    }

    if let Some(rate) = report.link_rate {
        record_link_rate(rate);
    }

    if report.watchdog_tripped {
        counter!("flowmeter_watchdog_trips_total").increment(1);
    }
}

/// Record the latest whole-link rate
pub fn record_link_rate(bps: f64) {
    gauge!("flowmeter_link_rate_bps").set(bps);
}

/// Record how long rendering/exporting one tick took
pub fn record_tick_latency_ms(latency_ms: f64) {
    histogram!("flowmeter_tick_latency_ms").record(latency_ms);
}

/// Run statistics aggregator
///
/// Folds every tick report of a run into running statistics.
#[derive(Debug, Clone, Default)]
pub struct RunStatsAggregator {
    /// Ticks observed
    pub total_ticks: u64,

    /// Death markers appended by the sweeps
    pub total_deaths: u64,

    /// Set once any tick tripped the watchdog
    pub watchdog_tripped: bool,

    /// Active flow count per tick
    pub active_stats: RunningStats,

    /// Link rate per tick (bit/s)
    pub link_stats: RunningStats,

    /// Total rate per flow (bit/s)
    pub flow_stats: BTreeMap<String, RunningStats>,
}

impl RunStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, report: &TickReport) {
        self.total_ticks += 1;
        self.total_deaths += report.deaths_marked as u64;
        self.watchdog_tripped |= report.watchdog_tripped;
        self.active_stats.push(report.active_flows as f64);

        if let Some(rate) = report.link_rate {
            self.link_stats.push(rate);
        }
        for (flow, rate) in &report.flow_rates {
            self.flow_stats
                .entry(flow.to_string())
                .or_default()
                .push(*rate);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_ticks: self.total_ticks,
            total_deaths: self.total_deaths,
            watchdog_tripped: self.watchdog_tripped,
            active_flows: StatsSummary::from(&self.active_stats),
            link_rate: StatsSummary::from(&self.link_stats),
            flow_rates: self
                .flow_stats
                .iter()
                .map(|(flow, stats)| (flow.clone(), StatsSummary::from(stats)))
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub total_deaths: u64,
    pub watchdog_tripped: bool,
    pub active_flows: StatsSummary,
    pub link_rate: StatsSummary,
    pub flow_rates: BTreeMap<String, StatsSummary>,
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Summary ===")?;
        writeln!(f, "Ticks: {}", self.total_ticks)?;
        writeln!(f, "Death markers: {}", self.total_deaths)?;
        if self.watchdog_tripped {
            writeln!(f, "Watchdog: tripped")?;
        }
        writeln!(f, "Active flows: {}", self.active_flows)?;
        writeln!(f, "Link rate: {}", RateDisplay(&self.link_rate))?;

        if !self.flow_rates.is_empty() {
            writeln!(f, "Flow rates:")?;
            for (flow, stats) in &self.flow_rates {
                writeln!(f, "  {}: {}", flow, RateDisplay(stats))?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Bit-rate rendering of a summary ("mean=1.5m, max=2m").
struct RateDisplay<'a>(&'a StatsSummary);

impl fmt::Display for RateDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.0;
        if stats.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "mean={}, min={}, max={} (n={})",
                format_rate(stats.mean),
                format_rate(stats.min),
                format_rate(stats.max),
                stats.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use contracts::FlowId;

    use super::*;

    fn tick(now: f64, active: usize, rates: &[(&str, f64)], link: Option<f64>) -> TickReport {
        TickReport {
            now,
            active_flows: active,
            deaths_marked: 0,
            flow_rates: rates
                .iter()
                .map(|(flow, rate)| (FlowId::new(flow), *rate))
                .collect(),
            link_rate: link,
            watchdog_tripped: false,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = RunStatsAggregator::new();
        aggregator.update(&tick(1.0, 1, &[("10.0.0.2", 100.0)], Some(120.0)));
        aggregator.update(&tick(
            2.0,
            2,
            &[("10.0.0.2", 300.0), ("10.0.0.3", 50.0)],
            None,
        ));
        aggregator.update(&TickReport {
            deaths_marked: 3,
            watchdog_tripped: true,
            ..tick(3.0, 0, &[], None)
        });

        let summary = aggregator.summary();
        assert_eq!(summary.total_ticks, 3);
        assert_eq!(summary.total_deaths, 3);
        assert!(summary.watchdog_tripped);
        assert_eq!(summary.link_rate.count, 1);
        assert_eq!(summary.active_flows.max, 2.0);
        assert_eq!(summary.flow_rates["10.0.0.2"].mean, 200.0);
        assert_eq!(summary.flow_rates["10.0.0.3"].count, 1);

        aggregator.reset();
        assert_eq!(aggregator.total_ticks, 0);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = RunStatsAggregator::new();
        aggregator.update(&tick(1.0, 1, &[("10.0.0.2", 1500.0)], Some(2_000_000.0)));

        let output = aggregator.summary().to_string();
        assert!(output.contains("Ticks: 1"));
        assert!(output.contains("10.0.0.2: mean=1.5k"));
        assert!(output.contains("Link rate: mean=2m"));
        assert!(!output.contains("Watchdog"));
    }

    #[test]
    fn test_empty_stats_display() {
        assert_eq!(StatsSummary::default().to_string(), "N/A");
    }
}
