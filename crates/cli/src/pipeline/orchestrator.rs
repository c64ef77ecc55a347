//! Pipeline orchestrator - wires the listeners, the store and the monitor
//! together for one measurement run.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{format_rate, MonitorBlueprint, StopFlag, TickReport};
use ingestion::IngestionPipeline;
use observability::{record_tick, record_tick_latency_ms, RunStatsAggregator};
use rate_engine::{ExperimentClock, Monitor, Store, SystemClock};
use tracing::{debug, info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The resolved run configuration
    pub blueprint: MonitorBlueprint,

    /// Run length (None = until Ctrl+C or the watchdog)
    pub duration: Option<Duration>,

    /// Consumer tick period
    pub tick_period: Duration,

    /// Flows below this rate are left out of the tick log line
    pub noise_floor_bps: f64,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the duration elapses, Ctrl+C arrives or the watchdog trips.
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
        }

        let store = Arc::new(Store::new(blueprint.engine.clone()));
        let clock: Arc<dyn ExperimentClock> = Arc::new(SystemClock::start());
        let stop = StopFlag::new();

        info!("Setting up ingestion pipeline...");
        let ingestion = IngestionPipeline::from_blueprint(
            blueprint,
            Arc::clone(&store),
            Arc::clone(&clock),
            stop.clone(),
        )
        .context("Failed to build ingestion pipeline")?;

        let streams_started = ingestion.start_all();
        if streams_started == 0 {
            anyhow::bail!(
                "None of the {} measurement streams could be started",
                ingestion.source_count()
            );
        }
        info!(
            started = streams_started,
            configured = ingestion.source_count(),
            "Measurement streams running"
        );

        let monitor = Monitor::new(
            Arc::clone(&store),
            blueprint.watchdog.clone(),
            stop.clone(),
        );
        let mut run_stats = RunStatsAggregator::new();
        let noise_floor = self.config.noise_floor_bps;

        let monitor_task = monitor.run(Arc::clone(&clock), self.config.tick_period, |report| {
            let tick_start = Instant::now();
            record_tick(report);
            run_stats.update(report);
            info!(
                t = format!("{:.1}", report.now),
                active = report.active_flows,
                link = report.link_rate.map(format_rate).unwrap_or_default(),
                "{}",
                render_tick(report, noise_floor)
            );
            record_tick_latency_ms(tick_start.elapsed().as_secs_f64() * 1000.0);
        });

        tokio::select! {
            ticks = monitor_task => {
                debug!(ticks, "Monitor stopped");
            }
            _ = run_timer(self.config.duration) => {
                info!("Run duration elapsed");
            }
            _ = shutdown_signal() => {
                warn!("Received shutdown signal, stopping run...");
            }
        }

        info!("Shutting down measurement streams...");
        stop.trigger();
        ingestion.stop_all();

        let snapshot = store.snapshot(clock.now());
        let stats = PipelineStats {
            duration: start_time.elapsed(),
            streams_started,
            ingestion: ingestion.metrics().snapshot(),
            run: run_stats,
            snapshot,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            flows = stats.snapshot.flows.len(),
            "Measurement run complete"
        );

        Ok(stats)
    }
}

/// One-line view of a tick: every flow at or above `noise_floor` with its
/// current total.
pub fn render_tick(report: &TickReport, noise_floor: f64) -> String {
    if report.flow_rates.is_empty() {
        return "no flows".to_string();
    }
    let mut line = String::new();
    let mut quiet = 0;
    for (flow, rate) in &report.flow_rates {
        if *rate < noise_floor {
            quiet += 1;
            continue;
        }
        if !line.is_empty() {
            line.push(' ');
        }
        let _ = write!(line, "{}={}", flow, format_rate(*rate));
    }
    if quiet > 0 {
        if !line.is_empty() {
            line.push(' ');
        }
        let _ = write!(line, "(+{quiet} below {})", format_rate(noise_floor));
    }
    line
}

/// Resolves after `duration`, or never.
async fn run_timer(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending::<()>().await,
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
