//! Bounded rolling window of timing samples

use std::collections::VecDeque;

/// Number of samples retained when no capacity is configured
pub const DEFAULT_CAPACITY: usize = 1000;

/// Rolling buffer of durations, in seconds.
///
/// Once more than `capacity` samples have been recorded the oldest ones are
/// dropped, so the window always holds the most recent `capacity` samples in
/// recording order.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl SampleWindow {
    /// Empty window holding up to `DEFAULT_CAPACITY` samples
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Empty window holding up to `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest ones past capacity
    pub fn record(&mut self, seconds: f64) {
        self.samples.push_back(seconds);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Arithmetic mean of the retained samples, `0.0` when empty
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Number of retained samples strictly greater than `threshold`
    pub fn count_over(&self, threshold: f64) -> usize {
        self.samples.iter().filter(|s| **s > threshold).count()
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are held
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod window_tests;
