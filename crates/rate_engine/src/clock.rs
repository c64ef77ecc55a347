//! Experiment clocks.
//!
//! Everything in the engine is stamped in seconds since the run started.
//! Producers and the consumer share one clock so their notions of "now"
//! agree; tests drive a [`ManualClock`] instead of sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of experiment-relative time.
pub trait ExperimentClock: Send + Sync {
    /// Seconds since the run started.
    fn now(&self) -> f64;

    /// Unix time (seconds) of the run start.
    fn unix_origin(&self) -> f64;

    /// Convert an absolute Unix timestamp into experiment time.
    fn from_unix(&self, unix_time: f64) -> f64 {
        unix_time - self.unix_origin()
    }
}

/// Monotonic wall clock anchored at construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    started: Instant,
    unix_origin: f64,
}

impl SystemClock {
    pub fn start() -> Self {
        let unix_origin = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        Self {
            started: Instant::now(),
            unix_origin,
        }
    }
}

impl ExperimentClock for SystemClock {
    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn unix_origin(&self) -> f64 {
        self.unix_origin
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_bits: AtomicU64,
    unix_origin: f64,
}

impl ManualClock {
    pub fn new(unix_origin: f64) -> Self {
        Self {
            now_bits: AtomicU64::new(0.0f64.to_bits()),
            unix_origin,
        }
    }

    pub fn set(&self, now: f64) {
        self.now_bits.store(now.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.now() + seconds);
    }
}

impl ExperimentClock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.now_bits.load(Ordering::SeqCst))
    }

    fn unix_origin(&self) -> f64 {
        self.unix_origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_700_000_000.0);
        assert_eq!(clock.now(), 0.0);
        clock.advance(1.5);
        clock.advance(1.0);
        assert_eq!(clock.now(), 2.5);
        clock.set(10.0);
        assert_eq!(clock.now(), 10.0);
        assert_eq!(clock.from_unix(1_700_000_012.0), 12.0);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock::start();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(clock.unix_origin() > 0.0);
    }
}
