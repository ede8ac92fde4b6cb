use super::queue::{QueueEntry, UpdateQueue};
use std::time::Duration;

/// Decides, between batches, whether a drain should hand control back to
/// the host.
pub trait YieldPoint {
    fn should_yield(&mut self, processed: usize, elapsed: Duration) -> bool;
}

/// Never yields. Used by `flush` and `recompute`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunToCompletion;

impl YieldPoint for RunToCompletion {
    fn should_yield(&mut self, _processed: usize, _elapsed: Duration) -> bool {
        false
    }
}

/// Yields after every batch; the host calls `resume` from its own loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostDriven;

impl YieldPoint for HostDriven {
    fn should_yield(&mut self, _processed: usize, _elapsed: Duration) -> bool {
        true
    }
}

/// Yields once a drain has run for longer than `budget`.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    pub budget: Duration,
}

impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }
}

impl YieldPoint for TimeBudget {
    fn should_yield(&mut self, _processed: usize, elapsed: Duration) -> bool {
        elapsed >= self.budget
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Nothing left to evaluate.
    Idle,
    /// Work remains; call `resume`.
    Yielded { remaining: usize },
}

/// Slices the update queue into batches.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    batch_size: usize,
}

impl Scheduler {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Pop up to `batch_size` entries in priority order.
    pub fn next_batch(&self, queue: &mut UpdateQueue) -> Vec<QueueEntry> {
        let mut batch = Vec::with_capacity(self.batch_size.min(queue.len()));
        while batch.len() < self.batch_size {
            match queue.pop() {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }
        batch
    }
}
