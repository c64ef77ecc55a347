//! LineSource trait - external report stream abstraction
//!
//! Decouples adapters from where report lines come from: a spawned
//! measurement process, a scripted replay in tests, or anything else that
//! yields one report per line.

use std::sync::Arc;

use crate::StreamKind;

/// Event produced by a line source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// One raw output line, without the trailing newline
    Line(String),

    /// The stream ended (process exited, replay finished, read error).
    /// No further events follow.
    Ended { reason: String },
}

/// Line callback type
///
/// Invoked from the source's own worker thread, once per event.
pub type LineCallback = Arc<dyn Fn(SourceEvent) + Send + Sync>;

/// Report line source trait
///
/// Each source owns one long-lived worker that blocks on its external
/// stream and forwards every line to the registered callback.
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn LineSource> = make_source();
/// source.listen(Arc::new(|event| {
///     if let SourceEvent::Line(line) = event {
///         println!("{line}");
///     }
/// }))?;
/// // ...
/// source.stop();
/// ```
pub trait LineSource: Send + Sync {
    /// Source ID (used for logging/metrics)
    fn source_id(&self) -> &str;

    /// What the lines describe
    fn kind(&self) -> StreamKind;

    /// Start the worker and register the callback.
    ///
    /// Calling it while already listening is a no-op.
    ///
    /// # Errors
    /// Returns an error when the external stream cannot be opened.
    fn listen(&self, callback: LineCallback) -> Result<(), crate::ContractError>;

    /// Ask the worker to stop. Cooperative: the worker observes it after
    /// its current blocking read returns.
    fn stop(&self);

    /// Check if the worker is running
    fn is_listening(&self) -> bool;
}
