//! Bounded per-venue execution history

use offload_core::Sample;
use std::collections::VecDeque;

/// Bounded record of samples for one venue with strict FIFO eviction.
///
/// Length never exceeds the capacity, and once the capacity is reached every
/// further insertion evicts exactly the oldest sample.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleHistory {
    /// Create an empty history. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one first when full.
    ///
    /// Returns the evicted sample, if any.
    pub fn record(&mut self, sample: Sample) -> Option<Sample> {
        let evicted = if self.is_full() {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Copy of the retained samples, oldest first
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest retained sample, the next one to be evicted
    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    /// Most recently recorded sample
    pub fn newest(&self) -> Option<&Sample> {
        self.samples.back()
    }
}
