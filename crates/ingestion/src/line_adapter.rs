//! Generic line adapter
//!
//! Bridges any `LineSource` to the store through a `LineHandler`, so
//! process-backed and scripted sources are handled the same way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{LineCallback, LineSource, SourceEvent, StreamKind};
use tracing::{debug, trace, warn};

use crate::adapter::{IngestContext, StreamAdapter};
use crate::error::{IngestionError, Result};
use crate::handlers::LineHandler;

pub struct LineAdapter<H> {
    source_id: String,
    source: Box<dyn LineSource>,
    handler: Arc<H>,
    listening: Arc<AtomicBool>,
}

impl<H: LineHandler> LineAdapter<H> {
    pub fn new(source: Box<dyn LineSource>, handler: H) -> Self {
        Self {
            source_id: source.source_id().to_string(),
            source,
            handler: Arc::new(handler),
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<H: LineHandler> StreamAdapter for LineAdapter<H> {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn kind(&self) -> StreamKind {
        self.source.kind()
    }

    fn start(&self, ctx: IngestContext) -> Result<()> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(IngestionError::AlreadyListening {
                source_id: self.source_id.clone(),
            });
        }

        let source_id: Arc<str> = Arc::from(self.source_id.as_str());
        let handler = Arc::clone(&self.handler);
        let listening = Arc::clone(&self.listening);

        debug!(source_id = %source_id, kind = %self.kind(), "starting adapter");

        let callback: LineCallback = Arc::new(move |event| match event {
            SourceEvent::Line(line) => {
                if ctx.stop.is_set() || !listening.load(Ordering::Relaxed) {
                    return;
                }
                ctx.metrics.record_received();

                match handler.handle(&line, &ctx) {
                    Ok(()) => ctx.metrics.record_ingested(),
                    Err(reason) => {
                        ctx.metrics.record_dropped();
                        metrics::counter!(
                            "flowmeter_lines_dropped_total",
                            "source" => source_id.to_string(),
                            "reason" => reason.as_str()
                        )
                        .increment(1);
                        trace!(source_id = %source_id, %reason, line = line.trim_end(), "line dropped");
                    }
                }
            }
            SourceEvent::Ended { reason } => {
                ctx.metrics.record_source_ended();
                listening.store(false, Ordering::SeqCst);
                warn!(source_id = %source_id, %reason, "report stream ended");
            }
        });

        self.source.listen(callback).map_err(|cause| {
            self.listening.store(false, Ordering::SeqCst);
            IngestionError::SourceFailed {
                source_id: self.source_id.clone(),
                cause,
            }
        })
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(source_id = %self.source_id, "stopping adapter");
        }
        self.source.stop();
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}
