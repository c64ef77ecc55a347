//! Scripted line source
//!
//! Replays a fixed list of lines on its own thread, standing in for a
//! measurement process in tests and demos.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{ContractError, LineCallback, LineSource, SourceEvent, StreamKind};
use tracing::debug;

pub struct ScriptedLineSource {
    source_id: String,
    kind: StreamKind,
    lines: Arc<[String]>,
    pace: Duration,
    listening: Arc<AtomicBool>,
}

impl ScriptedLineSource {
    pub fn new<I, S>(source_id: impl Into<String>, kind: StreamKind, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source_id: source_id.into(),
            kind,
            lines: lines.into_iter().map(Into::into).collect(),
            pace: Duration::ZERO,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pause between two lines.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }
}

impl LineSource for ScriptedLineSource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn kind(&self) -> StreamKind {
        self.kind
    }

    fn listen(&self, callback: LineCallback) -> Result<(), ContractError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let lines = Arc::clone(&self.lines);
        let listening = Arc::clone(&self.listening);
        let pace = self.pace;
        let source_id = self.source_id.clone();

        thread::Builder::new()
            .name(format!("script-{}", self.source_id))
            .spawn(move || {
                debug!(source_id = %source_id, lines = lines.len(), "script started");
                let mut replayed = 0;
                for line in lines.iter() {
                    if !listening.load(Ordering::Relaxed) {
                        break;
                    }
                    callback(SourceEvent::Line(line.clone()));
                    replayed += 1;
                    if !pace.is_zero() {
                        thread::sleep(pace);
                    }
                }
                listening.store(false, Ordering::SeqCst);
                callback(SourceEvent::Ended {
                    reason: format!("script finished after {replayed} lines"),
                });
            })?;
        Ok(())
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}
