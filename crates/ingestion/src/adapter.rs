//! Stream adapter trait

use std::sync::Arc;

use contracts::{StopFlag, StreamKind};
use rate_engine::{ExperimentClock, Store};

use crate::config::IngestionMetrics;
use crate::error::Result;

/// Everything an adapter needs to turn lines into store updates.
#[derive(Clone)]
pub struct IngestContext {
    pub store: Arc<Store>,
    pub clock: Arc<dyn ExperimentClock>,
    pub metrics: Arc<IngestionMetrics>,
    pub stop: StopFlag,
}

/// Stream adapter trait
///
/// One adapter per external stream. It owns the line source, parses each
/// line and feeds the result into the store:
/// 1. start the source worker
/// 2. parse every line, dropping the malformed ones
/// 3. stamp reports onto experiment time
/// 4. call the matching store entry point
pub trait StreamAdapter: Send + Sync {
    /// Get the source ID
    fn source_id(&self) -> &str;

    /// What the stream carries
    fn kind(&self) -> StreamKind;

    /// Start consuming the stream.
    ///
    /// # Errors
    /// Fails when already listening or when the source cannot be opened.
    fn start(&self, ctx: IngestContext) -> Result<()>;

    /// Stop consuming and release the source
    fn stop(&self);

    /// Whether the stream is still being consumed
    fn is_listening(&self) -> bool;
}
