//! Ordered (time, value) store.
//!
//! Samples are kept sorted by time in a plain `Vec`; lookups use
//! `partition_point`, so every positional query is a binary search.

use std::fmt;

use contracts::Sample;

/// Time series of rate samples, non-decreasing by time.
///
/// Duplicate times are not rejected structurally; callers burn the
/// neighbourhood of a fresh sample before inserting it.
#[derive(Clone, Default)]
pub struct TimeSeries {
    samples: Vec<Sample>,
    /// Time of the synthetic zero appended by the last death marking
    dead_marker: Option<f64>,
}

impl fmt::Debug for TimeSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeSeries")
            .field("len", &self.samples.len())
            .field("last", &self.last())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Most recent sample.
    #[inline]
    pub fn last(&self) -> Option<Sample> {
        self.samples.last().copied()
    }

    /// Index of the first sample with `time >= t` (`len()` if none).
    #[inline]
    fn first_index_geq(&self, t: f64) -> usize {
        self.samples.partition_point(|s| s.time < t)
    }

    /// Insert keeping time order; equal times go before existing ones.
    pub fn insert(&mut self, time: f64, value: f64) {
        let idx = self.first_index_geq(time);
        self.samples.insert(idx, Sample::new(time, value));
    }

    /// Overwrite the sample at exactly `time`, or insert a new one.
    pub fn upsert(&mut self, time: f64, value: f64) {
        let idx = self.first_index_geq(time);
        match self.samples.get_mut(idx) {
            Some(sample) if sample.time == time => sample.value = value,
            _ => self.samples.insert(idx, Sample::new(time, value)),
        }
    }

    /// Remove every sample with time in `[time - half_width, time + half_width)`.
    ///
    /// Returns the number of samples removed.
    pub fn burn_delete(&mut self, time: f64, half_width: f64) -> usize {
        let begin = self.first_index_geq(time - half_width);
        let end = self.first_index_geq(time + half_width);
        if end > begin {
            self.samples.drain(begin..end);
        }
        end.saturating_sub(begin)
    }

    /// Value of the sample at exactly `time`.
    pub fn value_at(&self, time: f64) -> Option<f64> {
        self.samples
            .get(self.first_index_geq(time))
            .filter(|s| s.time == time)
            .map(|s| s.value)
    }

    /// Linear interpolation at `time`.
    ///
    /// An exact hit returns the stored value. Otherwise the two samples
    /// bracketing `time` define the line; `None` when `time` lies before
    /// the first or after the last sample.
    pub fn interpolate(&self, time: f64) -> Option<f64> {
        let idx = self.first_index_geq(time);
        let right = self.samples.get(idx)?;
        if right.time == time {
            return Some(right.value);
        }
        if idx == 0 {
            return None;
        }

        let left = self.samples[idx - 1];
        let span = right.time - left.time;
        if span <= 0.0 {
            return Some(right.value);
        }
        Some(left.value + (right.value - left.value) * (time - left.time) / span)
    }

    /// Times of the samples in the closed interval `[lo, hi]`.
    pub fn times_within(&self, lo: f64, hi: f64) -> impl Iterator<Item = f64> + '_ {
        let begin = self.first_index_geq(lo);
        self.samples[begin..]
            .iter()
            .take_while(move |s| s.time <= hi)
            .map(|s| s.time)
    }

    /// Whether the tail is a synthetic death marker.
    pub fn is_terminated(&self) -> bool {
        match (self.dead_marker, self.samples.last()) {
            (Some(marker), Some(last)) => last.time == marker && last.value == 0.0,
            _ => false,
        }
    }

    /// Append a zero one `interval` after the last sample.
    ///
    /// No-op on an empty or already terminated series. Returns the time of
    /// the appended marker.
    pub fn mark_dead(&mut self, interval: f64) -> Option<f64> {
        if self.is_terminated() {
            return None;
        }
        let last = self.last()?;
        let time = last.time + interval;
        self.samples.push(Sample::new(time, 0.0));
        self.dead_marker = Some(time);
        Some(time)
    }
}
