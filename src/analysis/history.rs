//! HistoryBuffer - fixed-capacity ring of scalar readings
//!
//! Backs the adaptive thresholds: one instance tracks wideband energy and one
//! instance per frequency band tracks band magnitude. The buffer always holds
//! the most recent `min(capacity, pushes)` values; the oldest value is
//! overwritten first once it is full.

/// Circular record of past scalar readings
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    values: Vec<f32>,
    /// Slot the next push writes to
    next: usize,
    len: usize,
}

impl HistoryBuffer {
    /// Create an empty buffer holding at most `capacity` values (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![0.0; capacity.max(1)],
            next: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.values.len()
    }

    /// Append a value, evicting the oldest one when full
    pub fn push(&mut self, value: f32) {
        self.values[self.next] = value;
        self.next = (self.next + 1) % self.values.len();
        if self.len < self.values.len() {
            self.len += 1;
        }
    }

    /// Most recently pushed value
    pub fn latest(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let idx = (self.next + self.values.len() - 1) % self.values.len();
        Some(self.values[idx])
    }

    /// Mean of the held values, 0.0 when empty
    pub fn mean(&self) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        let sum: f32 = self.values[..self.len].iter().sum();
        sum / self.len as f32
    }

    /// Population variance of the held values, 0.0 with fewer than two values
    pub fn variance(&self) -> f32 {
        if self.len <= 1 {
            return 0.0;
        }
        let mean = self.mean();
        let sum: f32 = self.values[..self.len]
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum();
        sum / self.len as f32
    }

    /// Held values from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let start = if self.is_full() { self.next } else { 0 };
        (0..self.len).map(move |offset| self.values[(start + offset) % self.values.len()])
    }

    /// Drop all held values, keeping the capacity
    pub fn clear(&mut self) {
        self.next = 0;
        self.len = 0;
    }
}
