//! Ingestion counters shared by every adapter of a pipeline

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Raw lines delivered by the sources
    pub lines_received: AtomicU64,

    /// Lines rejected by a parser
    pub lines_dropped: AtomicU64,

    /// Reports written into the store
    pub reports_ingested: AtomicU64,

    /// Sources whose stream ended
    pub sources_ended: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.lines_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingested(&self) {
        self.reports_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_source_ended(&self) {
        self.sources_ended.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_received: self.lines_received.load(Ordering::Relaxed),
            lines_dropped: self.lines_dropped.load(Ordering::Relaxed),
            reports_ingested: self.reports_ingested.load(Ordering::Relaxed),
            sources_ended: self.sources_ended.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`IngestionMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lines_received: u64,
    pub lines_dropped: u64,
    pub reports_ingested: u64,
    pub sources_ended: u64,
}
