//! Reactive recomputation: node registry, dependency graph, convergence
//! detection, batched scheduling and the engine that drives them.

pub mod clock;
pub mod convergence;
pub mod debounce;
pub mod eval;
pub mod events;
pub mod graph;
pub mod host;
pub mod node;
pub mod queue;
pub mod registry;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use convergence::{ConvergenceDetector, Verdict};
pub use debounce::{DebounceKey, Debouncer, Tier};
pub use eval::ReactiveEngine;
pub use events::{ChangeOrigin, EngineEvent, EngineState, EngineStats, WatchId};
pub use graph::DependencyGraph;
pub use host::{BoundTree, OutputSpec, Scope};
pub use node::{NodeId, OutputNode};
pub use queue::{EnqueueOutcome, Priority, QueueEntry, UpdateQueue};
pub use registry::NodeRegistry;
pub use scheduler::{DrainOutcome, HostDriven, RunToCompletion, Scheduler, TimeBudget, YieldPoint};

use crate::locale::Locale;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Every tunable the engine consults.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Queue entries evaluated per slice before the yield point is consulted.
    pub batch_size: usize,
    pub max_queue_len: usize,
    /// Propagated re-evaluations allowed per node and origin within one cycle.
    pub max_iterations: u32,
    pub history_len: usize,
    pub abs_tolerance: f64,
    pub rel_tolerance: f64,
    /// Tolerance multiplier for updates arriving from a bidirectional peer.
    pub relaxed_tolerance_factor: f64,
    /// Decimal places numeric results are rounded to.
    pub precision: u32,
    pub immediate_window: Duration,
    pub settle_window: Duration,
    /// How long after a user edit a `skip_while_editing` node is left alone.
    pub edit_cooldown: Duration,
    pub compile_cache_capacity: usize,
    pub locale: Locale,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 16,
            max_queue_len: 1024,
            max_iterations: 3,
            history_len: 10,
            abs_tolerance: 1e-4,
            rel_tolerance: 1e-9,
            relaxed_tolerance_factor: 10.0,
            precision: 5,
            immediate_window: Duration::from_millis(30),
            settle_window: Duration::from_millis(100),
            edit_cooldown: Duration::from_millis(300),
            compile_cache_capacity: 512,
            locale: Locale::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_queue_len(mut self, len: usize) -> Self {
        self.max_queue_len = len.max(1);
        self
    }

    pub fn with_max_iterations(mut self, n: u32) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_tolerances(mut self, abs: f64, rel: f64) -> Self {
        self.abs_tolerance = abs;
        self.rel_tolerance = rel;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_debounce(mut self, immediate: Duration, settle: Duration) -> Self {
        self.immediate_window = immediate;
        self.settle_window = settle;
        self
    }

    pub fn with_edit_cooldown(mut self, cooldown: Duration) -> Self {
        self.edit_cooldown = cooldown;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}
