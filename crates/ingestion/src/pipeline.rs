//! Ingestion Pipeline main entry

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{LineSource, MonitorBlueprint, Protocol, StopFlag};
use rate_engine::{ExperimentClock, Store};
use tracing::{debug, info, instrument, warn};

use crate::adapter::{IngestContext, StreamAdapter};
use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};
use crate::handlers::{LinkHandler, ListenerHandler};
use crate::line_adapter::LineAdapter;
use crate::process::ProcessLineSource;

/// Ingestion Pipeline
///
/// Owns one adapter per external stream and wires all of them to the same
/// store, clock and stop flag.
pub struct IngestionPipeline {
    /// Registered adapters, by source id
    adapters: BTreeMap<String, Box<dyn StreamAdapter>>,

    /// Shared context handed to every adapter on start
    ctx: IngestContext,

    /// Nominal report interval of the listeners
    report_interval: f64,
}

impl IngestionPipeline {
    pub fn new(store: Arc<Store>, clock: Arc<dyn ExperimentClock>, stop: StopFlag) -> Self {
        let report_interval = store.config().report_interval_s;
        Self {
            adapters: BTreeMap::new(),
            ctx: IngestContext {
                store,
                clock,
                metrics: Arc::new(IngestionMetrics::new()),
                stop,
            },
            report_interval,
        }
    }

    /// Pipeline with one process-backed source per listener plus the link
    /// probe, as described by the blueprint.
    pub fn from_blueprint(
        blueprint: &MonitorBlueprint,
        store: Arc<Store>,
        clock: Arc<dyn ExperimentClock>,
        stop: StopFlag,
    ) -> Result<Self> {
        let mut pipeline = Self::new(store, clock, stop);
        let interval = blueprint.engine.report_interval_s;

        for listener in &blueprint.listeners {
            let source =
                ProcessLineSource::iperf_server(&blueprint.run.iperf_command, listener, interval);
            pipeline.register_listener(listener.protocol, Box::new(source))?;
        }
        if blueprint.link.enabled {
            let source =
                ProcessLineSource::bwm_ng(&blueprint.link.probe_command, &blueprint.link.interface);
            pipeline.register_link_probe(Box::new(source))?;
        }
        Ok(pipeline)
    }

    /// Register an iperf listener stream
    #[instrument(
        name = "ingestion_register_listener",
        skip(self, source),
        fields(source_id = %source.source_id())
    )]
    pub fn register_listener(
        &mut self,
        protocol: Protocol,
        source: Box<dyn LineSource>,
    ) -> Result<()> {
        let handler = ListenerHandler::new(protocol, self.report_interval);
        self.register(Box::new(LineAdapter::new(source, handler)))
    }

    /// Register the link-wide probe stream
    #[instrument(
        name = "ingestion_register_link_probe",
        skip(self, source),
        fields(source_id = %source.source_id())
    )]
    pub fn register_link_probe(&mut self, source: Box<dyn LineSource>) -> Result<()> {
        self.register(Box::new(LineAdapter::new(source, LinkHandler)))
    }

    fn register(&mut self, adapter: Box<dyn StreamAdapter>) -> Result<()> {
        let source_id = adapter.source_id().to_string();
        if self.adapters.contains_key(&source_id) {
            return Err(IngestionError::DuplicateSource { source_id });
        }
        debug!(source_id = %source_id, kind = %adapter.kind(), "registered stream");
        self.adapters.insert(source_id, adapter);
        Ok(())
    }

    /// Start every registered stream.
    ///
    /// A stream that fails to start is logged and skipped; the others keep
    /// running. Returns the number of streams started.
    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) -> usize {
        info!(count = self.adapters.len(), "starting all stream adapters");
        let mut started = 0;
        for (source_id, adapter) in &self.adapters {
            if adapter.is_listening() {
                continue;
            }
            match adapter.start(self.ctx.clone()) {
                Ok(()) => started += 1,
                Err(e) => warn!(source_id = %source_id, error = %e, "stream not started"),
            }
        }
        started
    }

    /// Start one stream by id
    pub fn start(&self, source_id: &str) -> Result<()> {
        self.adapters
            .get(source_id)
            .ok_or_else(|| IngestionError::UnknownSource {
                source_id: source_id.to_string(),
            })?
            .start(self.ctx.clone())
    }

    /// Stop every stream
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.adapters.len(), "stopping all stream adapters");
        for (source_id, adapter) in &self.adapters {
            debug!(source_id = %source_id, "stopping adapter");
            adapter.stop();
        }
    }

    /// Block until no stream is listening, or the timeout elapses.
    ///
    /// Returns `true` when every stream has ended.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.listening_count() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.ctx.metrics)
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.ctx.store
    }

    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    pub fn source_ids(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn listening_count(&self) -> usize {
        self.adapters.values().filter(|a| a.is_listening()).count()
    }

    pub fn is_source_listening(&self, source_id: &str) -> bool {
        self.adapters
            .get(source_id)
            .map(|a| a.is_listening())
            .unwrap_or(false)
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
