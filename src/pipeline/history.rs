//! Bounded rolling window of recently accepted prices.

use std::collections::VecDeque;

/// Maximum number of prices retained for prediction.
pub const HISTORY_CAPACITY: usize = 20;

/// FIFO price window, capacity [`HISTORY_CAPACITY`]. Session-scoped: each
/// inbound stream owns exactly one, and only its repair engine mutates it.
#[derive(Debug, Clone, Default)]
pub struct HistoryWindow {
    values: VecDeque<f64>,
}

impl HistoryWindow {
    pub fn new() -> Self {
        Self {
            values: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Append a price, evicting the oldest entry once past capacity.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        if self.values.len() > HISTORY_CAPACITY {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Ordered read-only view, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}
