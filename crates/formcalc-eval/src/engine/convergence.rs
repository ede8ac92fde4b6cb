use super::node::NodeId;
use formcalc_common::Value;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A genuinely new value.
    Changed,
    /// Equal, within tolerance, to the previous value.
    Converged,
    /// Flipping between two values; writing would only keep the loop alive.
    Oscillating,
}

/// Shortest history that can still show a 2-cycle.
pub const MIN_HISTORY: usize = 4;
pub const MAX_HISTORY: usize = 10;

/// Per-node bounded value history with tolerance-based stability checks.
#[derive(Debug)]
pub struct ConvergenceDetector {
    histories: FxHashMap<NodeId, VecDeque<Value>>,
    history_len: usize,
    abs_tolerance: f64,
    rel_tolerance: f64,
    relaxed_factor: f64,
}

impl ConvergenceDetector {
    pub fn new(history_len: usize, abs_tolerance: f64, rel_tolerance: f64, relaxed_factor: f64) -> Self {
        Self {
            histories: FxHashMap::default(),
            history_len: history_len.clamp(MIN_HISTORY, MAX_HISTORY),
            abs_tolerance,
            rel_tolerance,
            relaxed_factor: relaxed_factor.max(1.0),
        }
    }

    pub fn converged(&self, a: &Value, b: &Value, relaxed: bool) -> bool {
        match (a, b) {
            (Value::Empty, Value::Empty) => true,
            // An unfilled field is not the same thing as a computed zero.
            (Value::Empty, _) | (_, Value::Empty) => false,
            _ if a == b => true,
            _ => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => {
                    let factor = if relaxed { self.relaxed_factor } else { 1.0 };
                    let diff = (x - y).abs();
                    diff <= self.abs_tolerance * factor
                        || diff <= self.rel_tolerance * factor * x.abs().max(y.abs())
                }
                _ => false,
            },
        }
    }

    fn classify(&self, history: Option<&VecDeque<Value>>, candidate: &Value, relaxed: bool) -> Verdict {
        let Some(h) = history.filter(|h| !h.is_empty()) else {
            return Verdict::Changed;
        };
        let n = h.len();
        if self.converged(&h[n - 1], candidate, relaxed) {
            return Verdict::Converged;
        }
        // The candidate is h[n]; look back for a two-cycle.
        let two_cycle = if relaxed {
            n >= 2 && self.converged(&h[n - 2], candidate, true)
        } else {
            n >= 3
                && self.converged(&h[n - 2], candidate, false)
                && self.converged(&h[n - 3], &h[n - 1], false)
        };
        if two_cycle {
            Verdict::Oscillating
        } else {
            Verdict::Changed
        }
    }

    /// Classify `candidate` against the node's history, then record it.
    pub fn observe(&mut self, node: NodeId, candidate: &Value, relaxed: bool) -> Verdict {
        let verdict = self.classify(self.histories.get(&node), candidate, relaxed);
        let history = self.histories.entry(node).or_default();
        history.push_back(candidate.clone());
        while history.len() > self.history_len {
            history.pop_front();
        }
        verdict
    }

    /// Whether `candidate` would be reported as converged or oscillating.
    pub fn is_stable(&self, node: NodeId, candidate: &Value, relaxed: bool) -> bool {
        self.classify(self.histories.get(&node), candidate, relaxed) != Verdict::Changed
    }

    pub fn history(&self, node: NodeId) -> Option<&VecDeque<Value>> {
        self.histories.get(&node)
    }

    /// Drop a node's history, e.g. after the user typed into its field.
    pub fn reset(&mut self, node: NodeId) {
        if let Some(h) = self.histories.get_mut(&node) {
            h.clear();
        }
    }

    pub fn forget(&mut self, node: NodeId) {
        self.histories.remove(&node);
    }

    pub fn clear(&mut self) {
        self.histories.clear();
    }
}
