//! Timestamps whose total is still missing the sibling protocol.

/// Sorted, de-duplicated set of pending timestamps.
///
/// Order and uniqueness only hold after [`PendingSet::normalize`]; inserts
/// are plain appends.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    stamps: Vec<f64>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.stamps
    }

    pub fn insert(&mut self, time: f64) {
        self.stamps.push(time);
    }

    pub fn extend(&mut self, times: impl IntoIterator<Item = f64>) {
        self.stamps.extend(times);
    }

    pub fn contains(&self, time: f64) -> bool {
        self.stamps.contains(&time)
    }

    /// Sort, dedupe and drop entries older than `newest - max_window`.
    ///
    /// Returns the number of entries dropped for age.
    pub fn normalize(&mut self, max_window: f64) -> usize {
        self.stamps.sort_by(f64::total_cmp);
        self.stamps.dedup();

        let Some(&newest) = self.stamps.last() else {
            return 0;
        };
        let cutoff = newest - max_window;
        let keep_from = self.stamps.partition_point(|&t| t < cutoff);
        self.stamps.drain(..keep_from);
        keep_from
    }

    /// Remove every listed timestamp.
    pub fn remove_all(&mut self, resolved: &[f64]) {
        if resolved.is_empty() {
            return;
        }
        self.stamps.retain(|t| !resolved.contains(t));
    }
}
