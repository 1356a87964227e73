//! Streaming statistics accumulation

/// Online count / sum / min / max over a stream of scalar values.
///
/// Tracks enough state for the average and extrema of an unbounded stream
/// without retaining the history. All queries are defined on an empty
/// accumulator.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct IncrementalStats {
    count: u64,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl IncrementalStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new value to the accumulator.
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// The mean of all accumulated values. Zero if no values were added.
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// The minimum accumulated value, if any.
    pub const fn min(&self) -> Option<f64> {
        self.min
    }

    /// The maximum accumulated value, if any.
    pub const fn max(&self) -> Option<f64> {
        self.max
    }

    /// Number of accumulated values.
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Clear the accumulator, returning the pre-reset average.
    pub fn reset(&mut self) -> f64 {
        let average = self.average();
        *self = Self::default();
        average
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queries_are_defined() {
        let stats = IncrementalStats::new();
        assert_eq!(stats.average(), 0.0);
        assert_eq!(stats.min(), None);
        assert_eq!(stats.max(), None);
        assert_eq!(stats.count(), 0);
    }

    #[test]
    fn accumulates_average_min_max() {
        let mut stats = IncrementalStats::new();
        for value in [1.0, -2.0, 4.0, 5.0] {
            stats.add(value);
        }
        assert!((stats.average() - 2.0).abs() < 1e-12);
        assert_eq!(stats.min(), Some(-2.0));
        assert_eq!(stats.max(), Some(5.0));
        assert_eq!(stats.count(), 4);
    }

    #[test]
    fn reset_returns_average_and_clears() {
        let mut stats = IncrementalStats::new();
        stats.add(2.0);
        stats.add(4.0);
        assert_eq!(stats.reset(), 3.0);
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.min(), None);

        stats.add(7.0);
        assert_eq!(stats.average(), 7.0);
    }

    #[test]
    fn reset_of_empty_is_zero() {
        let mut stats = IncrementalStats::new();
        assert_eq!(stats.reset(), 0.0);
    }
}
