//! Fixed-capacity ring of sub-window accumulators for one event name

use super::statistics::{FailureCounter, Statistics};

/// Statistics and failure count for one report-period-wide sub-window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowSlot {
    pub stats: Statistics,
    pub failures: FailureCounter,
}

impl WindowSlot {
    fn record(&mut self, duration: i64, success: bool) {
        self.stats.add(duration as f64);
        if !success {
            self.failures.increment();
        }
    }
}

/// Sliding set of open sub-windows, oldest first
///
/// Backed by a boxed slice sized to the window multiple, so the depth can never
/// exceed `window_size / report_period`.
#[derive(Debug, Clone)]
pub struct WindowRing {
    slots: Box<[WindowSlot]>,
    head: usize,
    len: usize,
}

impl WindowRing {
    /// Ring holding a single empty slot, ready to record
    pub fn seeded(window_multiple: usize) -> Self {
        let capacity = window_multiple.max(1);
        Self {
            slots: vec![WindowSlot::default(); capacity].into_boxed_slice(),
            head: 0,
            len: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn oldest(&self) -> Option<&WindowSlot> {
        if self.len == 0 {
            return None;
        }
        Some(&self.slots[self.head])
    }

    /// Slots from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &WindowSlot> + '_ {
        let capacity = self.capacity();
        (0..self.len).map(move |offset| &self.slots[(self.head + offset) % capacity])
    }

    /// Write one result into every open sub-window
    pub fn record(&mut self, duration: i64, success: bool) {
        let capacity = self.capacity();
        for offset in 0..self.len {
            self.slots[(self.head + offset) % capacity].record(duration, success);
        }
    }

    /// Snapshot the oldest slot, then evict it if the ring is full and append a fresh slot
    ///
    /// Returns `None` only if the ring is empty, which the aggregator treats as a bug.
    pub fn cycle(&mut self) -> Option<WindowSlot> {
        let oldest = *self.oldest()?;
        let capacity = self.capacity();

        if self.is_full() {
            // The evicted slot is reused as the newest one
            self.slots[self.head] = WindowSlot::default();
            self.head = (self.head + 1) % capacity;
        } else {
            self.slots[(self.head + self.len) % capacity] = WindowSlot::default();
            self.len += 1;
        }

        Some(oldest)
    }
}
